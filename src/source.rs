//! Sources a descriptor can be read from.
//!
//! A [`ModelSource`] is an addressable byte producer with a printable
//! location. File sources support sibling lookup for local parent
//! resolution; artifact sources mark documents that came out of a
//! repository and therefore have no surrounding workspace.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::DEFAULT_PARENT_RELATIVE_PATH;

pub const DESCRIPTOR_FILE_NAME: &str = "pom.json";

#[derive(Debug, Clone)]
pub struct ModelSource {
    kind: SourceKind,
    location: String,
}

#[derive(Debug, Clone)]
enum SourceKind {
    /// A descriptor inside a workspace.
    File(PathBuf),
    /// A descriptor fetched from a repository.
    Artifact(PathBuf),
    /// An in-memory document, used by tests and embedded assets.
    Memory(Arc<str>),
}

impl ModelSource {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            location: path.display().to_string(),
            kind: SourceKind::File(path),
        }
    }

    /// A repository-resolved descriptor. `coordinates` is the printable
    /// `groupId:artifactId:version` the document was resolved for.
    pub fn artifact(path: impl Into<PathBuf>, coordinates: impl Into<String>) -> Self {
        Self {
            location: coordinates.into(),
            kind: SourceKind::Artifact(path.into()),
        }
    }

    pub fn from_string(location: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        Self {
            location: location.into(),
            kind: SourceKind::Memory(content.into()),
        }
    }

    /// Printable location; also the cache identity of this source.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn read(&self) -> io::Result<String> {
        match &self.kind {
            SourceKind::File(path) | SourceKind::Artifact(path) => fs::read_to_string(path),
            SourceKind::Memory(content) => Ok(content.to_string()),
        }
    }

    /// The workspace path of this source. Artifact sources deliberately
    /// return `None`: a repository document has no project directory.
    pub fn file_path(&self) -> Option<&Path> {
        match &self.kind {
            SourceKind::File(path) => Some(path),
            _ => None,
        }
    }

    pub fn is_artifact(&self) -> bool {
        matches!(self.kind, SourceKind::Artifact(_))
    }

    /// Resolve a sibling descriptor relative to this source.
    ///
    /// A relative path naming a directory is completed with the
    /// conventional descriptor file name. Returns `None` for non-file
    /// sources, empty paths, and paths that do not exist on disk.
    pub fn related_source(&self, relative_path: &str) -> Option<ModelSource> {
        if relative_path.is_empty() {
            return None;
        }
        let base = self.file_path()?.parent()?;
        let mut candidate = base.join(relative_path);
        if candidate.is_dir() {
            candidate = candidate.join(DESCRIPTOR_FILE_NAME);
        }
        if !candidate.is_file() {
            return None;
        }
        Some(ModelSource::from_file(candidate))
    }

    /// The conventional sibling source of a child's declared parent.
    pub fn default_parent_source(&self) -> Option<ModelSource> {
        self.related_source(DEFAULT_PARENT_RELATIVE_PATH)
    }
}
