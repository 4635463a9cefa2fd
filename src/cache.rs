//! Intermediate model cache.
//!
//! The cache is the only piece of state shared between concurrent build
//! requests, so access is serialized and every read hands out a clone:
//! interpolation mutates models in place, and a shared instance must never
//! leak one consumer's mutations into another. Writes store a defensive
//! clone and are first-write-wins; the cache never reconciles conflicting
//! entries.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::{DependencyManagement, Model, format_model_id};
use crate::source::ModelSource;

/// A cached raw model together with the source it was read from and its
/// resolved coordinates. Also the node type of the ancestor lineage.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub source: Option<ModelSource>,
    pub model: Model,
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
}

impl ModelData {
    /// Wrap a model whose coordinates are not meaningful (the super model).
    pub fn anonymous(source: Option<ModelSource>, model: Model) -> Self {
        Self {
            source,
            model,
            group_id: None,
            artifact_id: None,
            version: None,
        }
    }

    pub fn new(
        source: Option<ModelSource>,
        model: Model,
        group_id: Option<String>,
        artifact_id: Option<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            source,
            model,
            group_id,
            artifact_id,
            version,
        }
    }

    pub fn id(&self) -> String {
        format_model_id(
            self.group_id.as_deref(),
            self.artifact_id.as_deref(),
            self.version.as_deref(),
        )
    }
}

/// The closed set of cache tags. Each tag stores exactly one value shape;
/// the typed accessors below make a tag/value mismatch unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Tag {
    FileModel,
    Raw,
    Import,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Gav {
        group_id: String,
        artifact_id: String,
        version: String,
        tag: Tag,
    },
    Source {
        location: String,
        tag: Tag,
    },
}

#[derive(Debug, Clone)]
enum CacheValue {
    FileModel(Model),
    Raw(ModelData),
    Import(DependencyManagement),
}

/// Shared, tag-typed store for parsed, raw, and imported descriptors.
///
/// Cheap to clone; clones share the same underlying store.
#[derive(Debug, Clone, Default)]
pub struct ModelCache {
    inner: Arc<Mutex<HashMap<CacheKey, CacheValue>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn gav_key(group_id: &str, artifact_id: &str, version: &str, tag: Tag) -> CacheKey {
        CacheKey::Gav {
            group_id: group_id.to_string(),
            artifact_id: artifact_id.to_string(),
            version: version.to_string(),
            tag,
        }
    }

    fn put(&self, key: CacheKey, value: CacheValue) {
        self.inner.lock().entry(key).or_insert(value);
    }

    pub fn put_file_model(&self, source: &ModelSource, model: &Model) {
        self.put(
            CacheKey::Source {
                location: source.location().to_string(),
                tag: Tag::FileModel,
            },
            CacheValue::FileModel(model.clone()),
        );
    }

    pub fn get_file_model(&self, source: &ModelSource) -> Option<Model> {
        let key = CacheKey::Source {
            location: source.location().to_string(),
            tag: Tag::FileModel,
        };
        match self.inner.lock().get(&key) {
            Some(CacheValue::FileModel(model)) => Some(model.clone()),
            _ => None,
        }
    }

    pub fn put_raw(&self, group_id: &str, artifact_id: &str, version: &str, data: &ModelData) {
        self.put(
            Self::gav_key(group_id, artifact_id, version, Tag::Raw),
            CacheValue::Raw(data.clone()),
        );
    }

    pub fn get_raw(&self, group_id: &str, artifact_id: &str, version: &str) -> Option<ModelData> {
        let key = Self::gav_key(group_id, artifact_id, version, Tag::Raw);
        match self.inner.lock().get(&key) {
            Some(CacheValue::Raw(data)) => Some(data.clone()),
            _ => None,
        }
    }

    /// Raw entry keyed by source identity, for models whose coordinates are
    /// incomplete at normalization time.
    pub fn put_raw_for_source(&self, source: &ModelSource, data: &ModelData) {
        self.put(
            CacheKey::Source {
                location: source.location().to_string(),
                tag: Tag::Raw,
            },
            CacheValue::Raw(data.clone()),
        );
    }

    pub fn get_raw_for_source(&self, source: &ModelSource) -> Option<ModelData> {
        let key = CacheKey::Source {
            location: source.location().to_string(),
            tag: Tag::Raw,
        };
        match self.inner.lock().get(&key) {
            Some(CacheValue::Raw(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn put_import(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
        management: &DependencyManagement,
    ) {
        self.put(
            Self::gav_key(group_id, artifact_id, version, Tag::Import),
            CacheValue::Import(management.clone()),
        );
    }

    pub fn get_import(
        &self,
        group_id: &str,
        artifact_id: &str,
        version: &str,
    ) -> Option<DependencyManagement> {
        let key = Self::gav_key(group_id, artifact_id, version, Tag::Import);
        match self.inner.lock().get(&key) {
            Some(CacheValue::Import(management)) => Some(management.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dependency;

    fn model(artifact_id: &str) -> Model {
        Model {
            group_id: Some("g".into()),
            artifact_id: Some(artifact_id.into()),
            version: Some("1".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_clone_on_read_isolation() {
        let cache = ModelCache::new();
        let source = ModelSource::from_string("mem", "{}");
        cache.put_file_model(&source, &model("a"));

        let mut first = cache.get_file_model(&source).unwrap();
        first.version = Some("mutated".into());

        let second = cache.get_file_model(&source).unwrap();
        assert_eq!(second.version.as_deref(), Some("1"));
    }

    #[test]
    fn test_first_write_wins() {
        let cache = ModelCache::new();
        let source = ModelSource::from_string("mem", "{}");
        cache.put_file_model(&source, &model("a"));
        cache.put_file_model(&source, &model("b"));

        let stored = cache.get_file_model(&source).unwrap();
        assert_eq!(stored.artifact_id.as_deref(), Some("a"));
    }

    #[test]
    fn test_tags_do_not_collide() {
        let cache = ModelCache::new();
        let data = ModelData::new(None, model("a"), Some("g".into()), Some("a".into()), Some("1".into()));
        cache.put_raw("g", "a", "1", &data);

        // Same coordinates, different tag.
        assert!(cache.get_import("g", "a", "1").is_none());
        assert!(cache.get_raw("g", "a", "1").is_some());
    }

    #[test]
    fn test_import_roundtrip() {
        let cache = ModelCache::new();
        let management = DependencyManagement {
            dependencies: vec![Dependency {
                group_id: Some("g".into()),
                artifact_id: Some("lib".into()),
                version: Some("2".into()),
                ..Default::default()
            }],
        };
        cache.put_import("g", "bom", "1", &management);

        let fetched = cache.get_import("g", "bom", "1").unwrap();
        assert_eq!(fetched.dependencies.len(), 1);
        assert!(cache.get_import("g", "bom", "2").is_none());
    }

    #[test]
    fn test_shared_between_clones() {
        let cache = ModelCache::new();
        let clone = cache.clone();
        let source = ModelSource::from_string("mem", "{}");
        cache.put_file_model(&source, &model("a"));
        assert!(clone.get_file_model(&source).is_some());
    }
}
