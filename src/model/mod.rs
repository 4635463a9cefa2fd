//! The descriptor ("POM") data model.
//!
//! A descriptor is a JSON document with camelCase keys. Every type here is
//! a plain serde mapping of that document; behavior lives in the pipeline
//! modules. Locations are attached out-of-band by the processor and never
//! serialized back out.
//!
//! ## Module Structure
//!
//! - `location`: input locations and line-index helpers
//! - `merge`: inheritance, profile-injection, and transform merges

pub mod location;
pub mod merge;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::location::InputLocation;

pub const UNKNOWN_GROUP_ID: &str = "[unknown-group-id]";
pub const UNKNOWN_ARTIFACT_ID: &str = "[unknown-artifact-id]";
pub const UNKNOWN_VERSION: &str = "[unknown-version]";

/// Format a printable model id, substituting placeholders for missing
/// coordinates.
pub fn format_model_id(
    group_id: Option<&str>,
    artifact_id: Option<&str>,
    version: Option<&str>,
) -> String {
    format!(
        "{}:{}:{}",
        group_id.filter(|s| !s.is_empty()).unwrap_or(UNKNOWN_GROUP_ID),
        artifact_id
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_ARTIFACT_ID),
        version.filter(|s| !s.is_empty()).unwrap_or(UNKNOWN_VERSION),
    )
}

/// A project descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Model {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Parent>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_management: Option<DependencyManagement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting: Option<Reporting>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<Repository>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub profiles: Vec<Profile>,
    /// Local path of the document this model was read from, if any.
    #[serde(skip)]
    pub pom_file: Option<PathBuf>,
}

impl Model {
    /// Printable id from the model's own fields, with placeholders.
    pub fn id(&self) -> String {
        format_model_id(
            self.group_id.as_deref(),
            self.artifact_id.as_deref(),
            self.version.as_deref(),
        )
    }

    /// Group id, inherited from the parent declaration when absent on self.
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.group_id.as_deref()))
    }

    /// Version, inherited from the parent declaration when absent on self.
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or_else(|| self.parent.as_ref().and_then(|p| p.version.as_deref()))
    }

    pub fn packaging(&self) -> &str {
        self.packaging.as_deref().unwrap_or("jar")
    }

    pub fn project_directory(&self) -> Option<&Path> {
        self.pom_file.as_deref().and_then(Path::parent)
    }
}

/// Parent coordinates plus the workspace-relative location hint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Parent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    #[serde(skip)]
    pub location: Option<InputLocation>,
}

pub const DEFAULT_PARENT_RELATIVE_PATH: &str = "../pom.json";

impl Parent {
    pub fn id(&self) -> String {
        format_model_id(
            self.group_id.as_deref(),
            self.artifact_id.as_deref(),
            self.version.as_deref(),
        )
    }

    /// The declared relative path, or the conventional `../pom.json`.
    /// An explicitly empty path disables local resolution.
    pub fn relative_path(&self) -> &str {
        self.relative_path
            .as_deref()
            .unwrap_or(DEFAULT_PARENT_RELATIVE_PATH)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dependency {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub dep_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<Exclusion>,
    #[serde(skip)]
    pub location: Option<InputLocation>,
}

impl Dependency {
    pub fn dep_type(&self) -> &str {
        self.dep_type.as_deref().unwrap_or("jar")
    }

    /// Conflict/management key: groupId:artifactId:type[:classifier].
    pub fn management_key(&self) -> String {
        let mut key = format!(
            "{}:{}:{}",
            self.group_id.as_deref().unwrap_or(UNKNOWN_GROUP_ID),
            self.artifact_id.as_deref().unwrap_or(UNKNOWN_ARTIFACT_ID),
            self.dep_type(),
        );
        if let Some(classifier) = &self.classifier {
            key.push(':');
            key.push_str(classifier);
        }
        key
    }

    pub fn id(&self) -> String {
        format_model_id(
            self.group_id.as_deref(),
            self.artifact_id.as_deref(),
            self.version.as_deref(),
        )
    }

    /// True for a `type=pom, scope=import` management entry.
    pub fn is_import(&self) -> bool {
        self.dep_type() == "pom" && self.scope.as_deref() == Some("import")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Exclusion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DependencyManagement {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_source_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_output_directory: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<Plugin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin_management: Option<PluginManagement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PluginManagement {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<Plugin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Plugin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub executions: Vec<Execution>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(skip)]
    pub location: Option<InputLocation>,
}

impl Plugin {
    /// Identity key: groupId:artifactId.
    pub fn key(&self) -> String {
        format!(
            "{}:{}",
            self.group_id.as_deref().unwrap_or(UNKNOWN_GROUP_ID),
            self.artifact_id.as_deref().unwrap_or(UNKNOWN_ARTIFACT_ID),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Execution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub goals: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,
}

impl Execution {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Reporting {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_directory: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<ReportPlugin>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportPlugin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub report_sets: Vec<ReportSet>,
}

impl ReportPlugin {
    pub fn key(&self) -> String {
        format!(
            "{}:{}",
            self.group_id.as_deref().unwrap_or(UNKNOWN_GROUP_ID),
            self.artifact_id.as_deref().unwrap_or(UNKNOWN_ARTIFACT_ID),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Repository {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
}

impl Repository {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or("default")
    }
}

/// Where a profile came from; determines injection ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProfileSource {
    #[default]
    Pom,
    External,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activation: Option<Activation>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Dependency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_management: Option<DependencyManagement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporting: Option<Reporting>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<Repository>,
    #[serde(skip)]
    pub source: ProfileSource,
    #[serde(skip)]
    pub location: Option<InputLocation>,
}

/// Conditions under which a profile becomes active. All present conditions
/// must match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Activation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_by_default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jdk: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<OsActivation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyActivation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileActivation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OsActivation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PropertyActivation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileActivation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exists: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_model_id_placeholders() {
        assert_eq!(format_model_id(Some("g"), Some("a"), Some("1")), "g:a:1");
        assert_eq!(
            format_model_id(None, Some("a"), None),
            "[unknown-group-id]:a:[unknown-version]"
        );
        assert_eq!(
            format_model_id(Some(""), Some("a"), Some("1")),
            "[unknown-group-id]:a:1"
        );
    }

    #[test]
    fn test_effective_gav_falls_back_to_parent() {
        let model: Model = serde_json::from_str(
            r#"{
                "artifactId": "child",
                "parent": { "groupId": "g", "artifactId": "par", "version": "1" }
            }"#,
        )
        .unwrap();
        assert_eq!(model.effective_group_id(), Some("g"));
        assert_eq!(model.effective_version(), Some("1"));
        assert_eq!(model.artifact_id.as_deref(), Some("child"));
    }

    #[test]
    fn test_parse_full_document() {
        let model: Model = serde_json::from_str(
            r#"{
                "modelVersion": "4.0.0",
                "groupId": "com.example",
                "artifactId": "app",
                "version": "1.2.3",
                "packaging": "jar",
                "properties": { "encoding": "UTF-8" },
                "dependencies": [
                    { "groupId": "junit", "artifactId": "junit", "version": "4.13", "scope": "test" }
                ],
                "dependencyManagement": {
                    "dependencies": [
                        { "groupId": "com.example", "artifactId": "bom", "version": "1", "type": "pom", "scope": "import" }
                    ]
                },
                "build": {
                    "plugins": [
                        { "groupId": "plugins", "artifactId": "compiler", "version": "3.1" }
                    ]
                },
                "profiles": [
                    { "id": "ci", "activation": { "property": { "name": "env.CI" } } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(model.id(), "com.example:app:1.2.3");
        assert_eq!(model.dependencies[0].management_key(), "junit:junit:jar");
        assert!(model.dependency_management.as_ref().unwrap().dependencies[0].is_import());
        assert_eq!(
            model.build.as_ref().unwrap().plugins[0].key(),
            "plugins:compiler"
        );
        assert_eq!(model.profiles[0].id, "ci");
        assert_eq!(model.profiles[0].source, ProfileSource::Pom);
    }

    #[test]
    fn test_dependency_defaults() {
        let dep: Dependency = serde_json::from_str(r#"{ "groupId": "g", "artifactId": "a" }"#).unwrap();
        assert_eq!(dep.dep_type(), "jar");
        assert!(!dep.is_import());
        assert_eq!(dep.management_key(), "g:a:jar");
    }

    #[test]
    fn test_classifier_in_management_key() {
        let dep: Dependency = serde_json::from_str(
            r#"{ "groupId": "g", "artifactId": "a", "classifier": "tests" }"#,
        )
        .unwrap();
        assert_eq!(dep.management_key(), "g:a:jar:tests");
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let model = Model {
            group_id: Some("g".into()),
            artifact_id: Some("a".into()),
            version: Some("1".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, r#"{"groupId":"g","artifactId":"a","version":"1"}"#);
    }

    #[test]
    fn test_parent_relative_path_default() {
        let parent = Parent::default();
        assert_eq!(parent.relative_path(), "../pom.json");

        let parent = Parent {
            relative_path: Some("".into()),
            ..Default::default()
        };
        assert_eq!(parent.relative_path(), "");
    }
}
