//! Locating descriptors by coordinates.
//!
//! [`ModelResolver`] finds a descriptor for a parent or dependency
//! reference in a repository; [`WorkspaceModelResolver`] finds peer
//! descriptors on disk before any repository is consulted. The shipped
//! repository resolver works against a local filesystem repository laid out
//! `<root>/<groupId as path>/<artifactId>/<version>/<artifactId>-<version>.pom.json`.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

use crate::model::{Dependency, Model, Parent, Repository, format_model_id};
use crate::processor::{JsonModelProcessor, ModelProcessor, ReadOptions};
use crate::source::{DESCRIPTOR_FILE_NAME, ModelSource};
use crate::version::{Version, VersionRange, is_range};

#[derive(Debug, Error)]
pub enum UnresolvableModelError {
    #[error("could not resolve {id} from any configured repository")]
    NotFound { id: String },
    #[error("no version of {id} satisfies range {range}")]
    NoMatchingVersion { id: String, range: String },
    #[error("missing coordinates in reference {id}")]
    IncompleteCoordinates { id: String },
}

/// Resolves descriptors from a repository.
pub trait ModelResolver: Send + Sync {
    fn resolve_parent(&self, parent: &Parent) -> Result<ModelSource, UnresolvableModelError>;

    fn resolve_dependency(
        &self,
        dependency: &Dependency,
    ) -> Result<ModelSource, UnresolvableModelError>;

    /// Make a repository visible to subsequent resolutions. With `replace`,
    /// a repository with the same id overrides an earlier registration;
    /// without it, the first registration wins.
    fn add_repository(&mut self, repository: &Repository, replace: bool);

    /// An independent copy for a nested build (imports resolve against a
    /// fresh resolver so repository injection cannot leak across builds).
    fn new_copy(&self) -> Box<dyn ModelResolver>;
}

/// Filesystem repository resolver.
#[derive(Debug, Clone)]
pub struct LocalRepositoryResolver {
    root: PathBuf,
    repositories: Vec<Repository>,
}

impl LocalRepositoryResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            repositories: Vec::new(),
        }
    }

    fn artifact_dir(&self, group_id: &str, artifact_id: &str) -> PathBuf {
        let mut dir = self.root.clone();
        for part in group_id.split('.') {
            dir.push(part);
        }
        dir.push(artifact_id);
        dir
    }

    fn descriptor_path(&self, group_id: &str, artifact_id: &str, version: &str) -> PathBuf {
        self.artifact_dir(group_id, artifact_id)
            .join(version)
            .join(format!("{}-{}.pom.json", artifact_id, version))
    }

    /// All versions present for an artifact, best first.
    fn available_versions(&self, group_id: &str, artifact_id: &str) -> Vec<Version> {
        let Ok(entries) = fs::read_dir(self.artifact_dir(group_id, artifact_id)) else {
            return Vec::new();
        };
        let mut versions: Vec<Version> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().into_string().ok())
            .map(|name| Version::parse(&name))
            .collect();
        versions.sort();
        versions.reverse();
        versions
    }

    fn resolve(
        &self,
        group_id: Option<&str>,
        artifact_id: Option<&str>,
        version: Option<&str>,
    ) -> Result<ModelSource, UnresolvableModelError> {
        let id = format_model_id(group_id, artifact_id, version);
        let (Some(group_id), Some(artifact_id), Some(version)) = (group_id, artifact_id, version)
        else {
            return Err(UnresolvableModelError::IncompleteCoordinates { id });
        };

        let version = if is_range(version) {
            let range = VersionRange::parse(version).ok_or_else(|| {
                UnresolvableModelError::NoMatchingVersion {
                    id: id.clone(),
                    range: version.to_string(),
                }
            })?;
            self.available_versions(group_id, artifact_id)
                .into_iter()
                .find(|v| range.contains(v.as_str()))
                .map(|v| v.as_str().to_string())
                .ok_or_else(|| UnresolvableModelError::NoMatchingVersion {
                    id: id.clone(),
                    range: version.to_string(),
                })?
        } else {
            version.to_string()
        };

        let path = self.descriptor_path(group_id, artifact_id, &version);
        if !path.is_file() {
            debug!(id = %id, path = %path.display(), "descriptor not in repository");
            return Err(UnresolvableModelError::NotFound { id });
        }
        let coordinates = format_model_id(Some(group_id), Some(artifact_id), Some(&version));
        Ok(ModelSource::artifact(path, coordinates))
    }
}

impl ModelResolver for LocalRepositoryResolver {
    fn resolve_parent(&self, parent: &Parent) -> Result<ModelSource, UnresolvableModelError> {
        self.resolve(
            parent.group_id.as_deref(),
            parent.artifact_id.as_deref(),
            parent.version.as_deref(),
        )
    }

    fn resolve_dependency(
        &self,
        dependency: &Dependency,
    ) -> Result<ModelSource, UnresolvableModelError> {
        self.resolve(
            dependency.group_id.as_deref(),
            dependency.artifact_id.as_deref(),
            dependency.version.as_deref(),
        )
    }

    fn add_repository(&mut self, repository: &Repository, replace: bool) {
        match self
            .repositories
            .iter_mut()
            .find(|r| r.id() == repository.id())
        {
            Some(existing) if replace => *existing = repository.clone(),
            Some(_) => {}
            None => self.repositories.push(repository.clone()),
        }
    }

    fn new_copy(&self) -> Box<dyn ModelResolver> {
        Box::new(self.clone())
    }
}

/// Resolves peer descriptors from the surrounding workspace.
pub trait WorkspaceModelResolver: Send + Sync {
    fn resolve_raw_model(&self, group_id: &str, artifact_id: &str, version: &str) -> Option<Model>;

    /// A fully built effective model, when the workspace has one at hand.
    fn resolve_effective_model(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Option<Model>;
}

/// A raw-model index over every descriptor found under a workspace root.
#[derive(Debug, Default)]
pub struct WorkspaceIndex {
    models: HashMap<(String, String, String), Model>,
}

impl WorkspaceIndex {
    /// Scan a directory tree for descriptor files. Unreadable documents are
    /// skipped; an index is best-effort by design.
    pub fn scan(root: impl Into<PathBuf>) -> Self {
        let mut index = Self::default();
        let processor = JsonModelProcessor;
        let options = ReadOptions::default();
        for entry in walkdir::WalkDir::new(root.into())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.file_name() == DESCRIPTOR_FILE_NAME)
        {
            let source = ModelSource::from_file(entry.path());
            let Ok(mut model) = processor.read(&source, &options) else {
                debug!(path = %entry.path().display(), "skipping unreadable descriptor");
                continue;
            };
            model.pom_file = Some(entry.path().to_path_buf());
            index.add(model);
        }
        index
    }

    pub fn add(&mut self, model: Model) {
        let (Some(group_id), Some(artifact_id), Some(version)) = (
            model.effective_group_id().map(str::to_string),
            model.artifact_id.clone(),
            model.effective_version().map(str::to_string),
        ) else {
            return;
        };
        self.models
            .entry((group_id, artifact_id, version))
            .or_insert(model);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl WorkspaceModelResolver for WorkspaceIndex {
    fn resolve_raw_model(&self, group_id: &str, artifact_id: &str, version: &str) -> Option<Model> {
        self.models
            .get(&(
                group_id.to_string(),
                artifact_id.to_string(),
                version.to_string(),
            ))
            .cloned()
    }

    fn resolve_effective_model(&self, _: &str, _: &str, _: &str) -> Option<Model> {
        // The index holds raw documents only; effective resolution falls
        // through to the full pipeline.
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_repo_pom(root: &std::path::Path, g: &str, a: &str, v: &str) {
        let mut dir = root.to_path_buf();
        for part in g.split('.') {
            dir.push(part);
        }
        dir.push(a);
        dir.push(v);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("{}-{}.pom.json", a, v)),
            format!(
                r#"{{ "groupId": "{}", "artifactId": "{}", "version": "{}", "packaging": "pom" }}"#,
                g, a, v
            ),
        )
        .unwrap();
    }

    #[test]
    fn test_resolve_literal_version() {
        let dir = tempdir().unwrap();
        write_repo_pom(dir.path(), "com.example", "par", "1.0");

        let resolver = LocalRepositoryResolver::new(dir.path());
        let parent = Parent {
            group_id: Some("com.example".into()),
            artifact_id: Some("par".into()),
            version: Some("1.0".into()),
            ..Default::default()
        };
        let source = resolver.resolve_parent(&parent).unwrap();
        assert!(source.is_artifact());
        assert_eq!(source.location(), "com.example:par:1.0");
    }

    #[test]
    fn test_resolve_missing_is_not_found() {
        let dir = tempdir().unwrap();
        let resolver = LocalRepositoryResolver::new(dir.path());
        let parent = Parent {
            group_id: Some("g".into()),
            artifact_id: Some("a".into()),
            version: Some("1".into()),
            ..Default::default()
        };
        assert!(matches!(
            resolver.resolve_parent(&parent),
            Err(UnresolvableModelError::NotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_range_picks_best_version() {
        let dir = tempdir().unwrap();
        write_repo_pom(dir.path(), "g", "a", "1.0");
        write_repo_pom(dir.path(), "g", "a", "1.5");
        write_repo_pom(dir.path(), "g", "a", "2.0");

        let resolver = LocalRepositoryResolver::new(dir.path());
        let parent = Parent {
            group_id: Some("g".into()),
            artifact_id: Some("a".into()),
            version: Some("[1.0,2.0)".into()),
            ..Default::default()
        };
        let source = resolver.resolve_parent(&parent).unwrap();
        assert_eq!(source.location(), "g:a:1.5");
    }

    #[test]
    fn test_resolve_range_no_match() {
        let dir = tempdir().unwrap();
        write_repo_pom(dir.path(), "g", "a", "3.0");

        let resolver = LocalRepositoryResolver::new(dir.path());
        let parent = Parent {
            group_id: Some("g".into()),
            artifact_id: Some("a".into()),
            version: Some("[1.0,2.0)".into()),
            ..Default::default()
        };
        assert!(matches!(
            resolver.resolve_parent(&parent),
            Err(UnresolvableModelError::NoMatchingVersion { .. })
        ));
    }

    #[test]
    fn test_add_repository_replace_semantics() {
        let mut resolver = LocalRepositoryResolver::new("/tmp/repo");
        let first = Repository {
            id: Some("central".into()),
            url: Some("https://one".into()),
            ..Default::default()
        };
        let second = Repository {
            id: Some("central".into()),
            url: Some("https://two".into()),
            ..Default::default()
        };
        resolver.add_repository(&first, false);
        resolver.add_repository(&second, false);
        assert_eq!(resolver.repositories[0].url.as_deref(), Some("https://one"));

        resolver.add_repository(&second, true);
        assert_eq!(resolver.repositories[0].url.as_deref(), Some("https://two"));
    }

    #[test]
    fn test_workspace_index_scan() {
        let dir = tempdir().unwrap();
        let module = dir.path().join("module");
        fs::create_dir(&module).unwrap();
        fs::write(
            module.join(DESCRIPTOR_FILE_NAME),
            r#"{ "groupId": "g", "artifactId": "m", "version": "1" }"#,
        )
        .unwrap();
        fs::write(module.join("notes.txt"), "not a descriptor").unwrap();

        let index = WorkspaceIndex::scan(dir.path());
        assert_eq!(index.len(), 1);
        let model = index.resolve_raw_model("g", "m", "1").unwrap();
        assert!(model.pom_file.is_some());
        assert!(index.resolve_raw_model("g", "m", "2").is_none());
    }

    #[test]
    fn test_workspace_index_uses_parent_coordinates() {
        let mut index = WorkspaceIndex::default();
        index.add(Model {
            artifact_id: Some("child".into()),
            parent: Some(Parent {
                group_id: Some("g".into()),
                artifact_id: Some("par".into()),
                version: Some("1".into()),
                ..Default::default()
            }),
            ..Default::default()
        });
        assert!(index.resolve_raw_model("g", "child", "1").is_some());
    }
}
