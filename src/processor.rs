//! Reading descriptor documents.
//!
//! [`ModelProcessor`] is the seam between the pipeline and the document
//! format. The shipped [`JsonModelProcessor`] parses `pom.json` documents:
//! lenient mode accepts any well-formed JSON and ignores unknown keys,
//! strict mode additionally rejects unknown keys anywhere a schema object
//! is expected. Location tracking recovers element positions from the raw
//! text with a line-index scan.

use std::io;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::model::location::{
    InputLocation, build_line_index, find_key_offset, find_key_value_offset, offset_to_line,
};
use crate::model::{Dependency, Model, Plugin};
use crate::source::ModelSource;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{message}")]
    Parse { message: String },
}

impl ReadError {
    pub fn parse(message: impl Into<String>) -> Self {
        ReadError::Parse {
            message: message.into(),
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, ReadError::Parse { .. })
    }
}

/// Supplies substitutions for deferred ("ci-friendly") version expressions
/// during the raw-model transform.
pub trait TransformerContext: Send + Sync {
    fn user_property(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    pub strict: bool,
    pub location_tracking: bool,
    pub transformer: Option<Arc<dyn TransformerContext>>,
}

impl std::fmt::Debug for dyn TransformerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TransformerContext")
    }
}

/// Parses a [`ModelSource`] into a [`Model`].
pub trait ModelProcessor: Send + Sync {
    fn read(&self, source: &ModelSource, options: &ReadOptions) -> Result<Model, ReadError>;
}

/// The default JSON descriptor parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonModelProcessor;

impl ModelProcessor for JsonModelProcessor {
    fn read(&self, source: &ModelSource, options: &ReadOptions) -> Result<Model, ReadError> {
        let content = source.read()?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| ReadError::parse(format!("invalid JSON: {}", e)))?;

        if options.strict {
            check_unknown_keys(&value, Shape::Model, "$")?;
        }

        let mut model: Model = serde_json::from_value(value)
            .map_err(|e| ReadError::parse(format!("invalid descriptor: {}", e)))?;

        if let Some(transformer) = &options.transformer {
            substitute_deferred_versions(&mut model, transformer.as_ref());
        }
        if options.location_tracking {
            attach_locations(&mut model, &content, source.location());
        }
        Ok(model)
    }
}

/// Replace version fields that are a single `${expr}` with the
/// transformer's value for `expr`, leaving them untouched when the
/// transformer has nothing to offer.
fn substitute_deferred_versions(model: &mut Model, transformer: &dyn TransformerContext) {
    fn substitute(slot: &mut Option<String>, transformer: &dyn TransformerContext) {
        if let Some(value) = slot
            && let Some(expr) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}'))
            && let Some(replacement) = transformer.user_property(expr)
        {
            *slot = Some(replacement);
        }
    }
    substitute(&mut model.version, transformer);
    if let Some(parent) = &mut model.parent {
        substitute(&mut parent.version, transformer);
    }
}

// ============================================================
// Location tracking
// ============================================================

fn attach_locations(model: &mut Model, content: &str, source: &str) {
    let line_index = build_line_index(content);
    let locate = |offset: usize| InputLocation::new(source, offset_to_line(&line_index, offset));

    if let Some(parent) = &mut model.parent
        && let Some(offset) = find_key_offset(content, "parent", 0)
    {
        parent.location = Some(locate(offset));
    }

    let section = find_key_offset(content, "dependencies", 0).unwrap_or(0);
    attach_dependency_locations(&mut model.dependencies, content, section, &line_index, source);

    if let Some(management) = &mut model.dependency_management {
        let section = find_key_offset(content, "dependencyManagement", 0).unwrap_or(0);
        attach_dependency_locations(
            &mut management.dependencies,
            content,
            section,
            &line_index,
            source,
        );
    }

    if let Some(build) = &mut model.build {
        let section = find_key_offset(content, "plugins", 0).unwrap_or(0);
        attach_plugin_locations(&mut build.plugins, content, section, &line_index, source);
    }

    let mut search = find_key_offset(content, "profiles", 0).unwrap_or(0);
    for profile in &mut model.profiles {
        if let Some(offset) = find_key_value_offset(content, "id", &profile.id, search) {
            profile.location = Some(InputLocation::new(
                source,
                offset_to_line(&line_index, offset),
            ));
            search = offset + 1;
        }
    }
}

fn attach_dependency_locations(
    dependencies: &mut [Dependency],
    content: &str,
    section: usize,
    line_index: &[usize],
    source: &str,
) {
    let mut search = section;
    for dependency in dependencies {
        let Some(artifact_id) = dependency.artifact_id.as_deref() else {
            continue;
        };
        if let Some(offset) = find_key_value_offset(content, "artifactId", artifact_id, search) {
            dependency.location = Some(InputLocation::new(source, offset_to_line(line_index, offset)));
            search = offset + 1;
        }
    }
}

fn attach_plugin_locations(
    plugins: &mut [Plugin],
    content: &str,
    section: usize,
    line_index: &[usize],
    source: &str,
) {
    let mut search = section;
    for plugin in plugins {
        let Some(artifact_id) = plugin.artifact_id.as_deref() else {
            continue;
        };
        if let Some(offset) = find_key_value_offset(content, "artifactId", artifact_id, search) {
            plugin.location = Some(InputLocation::new(source, offset_to_line(line_index, offset)));
            search = offset + 1;
        }
    }
}

// ============================================================
// Strict schema check
// ============================================================

/// The object shapes a descriptor document is made of.
#[derive(Debug, Clone, Copy)]
enum Shape {
    Model,
    Parent,
    Dependency,
    Exclusion,
    DependencyManagement,
    Build,
    PluginManagement,
    Plugin,
    Execution,
    Reporting,
    ReportPlugin,
    ReportSet,
    Repository,
    Profile,
    Activation,
    OsActivation,
    PropertyActivation,
    FileActivation,
}

/// What a field's value is allowed to be.
enum FieldKind {
    Scalar,
    StringList,
    /// A string→string map with arbitrary keys.
    Properties,
    /// Free-form configuration; not schema-checked.
    Free,
    Object(Shape),
    List(Shape),
}

fn field_kind(shape: Shape, key: &str) -> Option<FieldKind> {
    use FieldKind::*;
    use Shape::*;
    let kind = match (shape, key) {
        (Model, "modelVersion" | "groupId" | "artifactId" | "version") => Scalar,
        (Model, "packaging" | "name" | "url") => Scalar,
        (Model, "parent") => Object(Parent),
        (Model, "properties") => Properties,
        (Model, "modules") => StringList,
        (Model, "dependencies") => List(Dependency),
        (Model, "dependencyManagement") => Object(DependencyManagement),
        (Model, "build") => Object(Build),
        (Model, "reporting") => Object(Reporting),
        (Model, "repositories") => List(Repository),
        (Model, "profiles") => List(Profile),

        (Parent, "groupId" | "artifactId" | "version" | "relativePath") => Scalar,

        (Dependency, "groupId" | "artifactId" | "version" | "type") => Scalar,
        (Dependency, "classifier" | "scope" | "optional") => Scalar,
        (Dependency, "exclusions") => List(Exclusion),

        (Exclusion, "groupId" | "artifactId") => Scalar,

        (DependencyManagement, "dependencies") => List(Dependency),

        (Build, "defaultGoal" | "finalName" | "directory") => Scalar,
        (Build, "sourceDirectory" | "testSourceDirectory") => Scalar,
        (Build, "outputDirectory" | "testOutputDirectory") => Scalar,
        (Build, "plugins") => List(Plugin),
        (Build, "pluginManagement") => Object(PluginManagement),

        (PluginManagement, "plugins") => List(Plugin),

        (Plugin, "groupId" | "artifactId" | "version" | "extensions") => Scalar,
        (Plugin, "configuration") => Free,
        (Plugin, "executions") => List(Execution),
        (Plugin, "dependencies") => List(Dependency),

        (Execution, "id" | "phase") => Scalar,
        (Execution, "goals") => StringList,
        (Execution, "configuration") => Free,

        (Reporting, "outputDirectory") => Scalar,
        (Reporting, "plugins") => List(ReportPlugin),

        (ReportPlugin, "groupId" | "artifactId" | "version") => Scalar,
        (ReportPlugin, "configuration") => Free,
        (ReportPlugin, "reportSets") => List(ReportSet),

        (ReportSet, "id") => Scalar,
        (ReportSet, "reports") => StringList,
        (ReportSet, "configuration") => Free,

        (Repository, "id" | "name" | "url" | "layout") => Scalar,

        (Profile, "id") => Scalar,
        (Profile, "activation") => Object(Activation),
        (Profile, "properties") => Properties,
        (Profile, "dependencies") => List(Dependency),
        (Profile, "dependencyManagement") => Object(DependencyManagement),
        (Profile, "build") => Object(Build),
        (Profile, "reporting") => Object(Reporting),
        (Profile, "repositories") => List(Repository),

        (Activation, "activeByDefault" | "jdk") => Scalar,
        (Activation, "os") => Object(OsActivation),
        (Activation, "property") => Object(PropertyActivation),
        (Activation, "file") => Object(FileActivation),

        (OsActivation, "name" | "family" | "arch" | "version") => Scalar,
        (PropertyActivation, "name" | "value") => Scalar,
        (FileActivation, "exists" | "missing") => Scalar,

        _ => return None,
    };
    Some(kind)
}

fn check_unknown_keys(value: &Value, shape: Shape, path: &str) -> Result<(), ReadError> {
    let Value::Object(map) = value else {
        return Ok(());
    };
    for (key, child) in map {
        match field_kind(shape, key) {
            None => {
                return Err(ReadError::parse(format!(
                    "unrecognized field '{}' at {}",
                    key, path
                )));
            }
            Some(FieldKind::Object(child_shape)) => {
                check_unknown_keys(child, child_shape, &format!("{}.{}", path, key))?;
            }
            Some(FieldKind::List(child_shape)) => {
                if let Value::Array(items) = child {
                    for (i, item) in items.iter().enumerate() {
                        check_unknown_keys(item, child_shape, &format!("{}.{}[{}]", path, key, i))?;
                    }
                }
            }
            Some(FieldKind::Scalar | FieldKind::StringList | FieldKind::Properties | FieldKind::Free) => {}
        }
    }
    Ok(())
}
