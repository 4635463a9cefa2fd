//! Cache idempotence: a shared cache makes repeated builds I/O-free and
//! byte-identical.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use pommel::model::Model;
use pommel::processor::{JsonModelProcessor, ModelProcessor, ReadError, ReadOptions};
use pommel::source::ModelSource;
use pommel::{ModelBuilder, ModelBuildingRequest, ModelCache};

/// Delegating processor that counts document reads.
struct CountingProcessor {
    inner: JsonModelProcessor,
    reads: Arc<AtomicUsize>,
}

impl ModelProcessor for CountingProcessor {
    fn read(&self, source: &ModelSource, options: &ReadOptions) -> Result<Model, ReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(source, options)
    }
}

#[test]
fn second_build_with_shared_cache_reads_nothing() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("pom.json"),
        r#"{
            "modelVersion": "4.0.0",
            "groupId": "g", "artifactId": "par", "version": "1",
            "packaging": "pom",
            "properties": { "suffix": "app" }
        }"#,
    )
    .unwrap();
    let child_dir = dir.path().join("child");
    fs::create_dir(&child_dir).unwrap();
    let child_pom = child_dir.join("pom.json");
    fs::write(
        &child_pom,
        r#"{
            "artifactId": "c",
            "name": "service-${suffix}",
            "parent": { "groupId": "g", "artifactId": "par", "version": "1" }
        }"#,
    )
    .unwrap();

    let reads = Arc::new(AtomicUsize::new(0));
    let builder = ModelBuilder::new().with_processor(Arc::new(CountingProcessor {
        inner: JsonModelProcessor,
        reads: reads.clone(),
    }));
    let cache = ModelCache::new();

    let mut first_request = ModelBuildingRequest::new()
        .with_pom_file(&child_pom)
        .with_model_cache(cache.clone());
    let first = builder.build(&mut first_request).unwrap();
    let reads_after_first = reads.load(Ordering::SeqCst);
    assert!(reads_after_first > 0);

    let mut second_request = ModelBuildingRequest::new()
        .with_pom_file(&child_pom)
        .with_model_cache(cache.clone());
    let second = builder.build(&mut second_request).unwrap();

    assert_eq!(
        reads.load(Ordering::SeqCst),
        reads_after_first,
        "the second build must be served entirely from the cache"
    );
    assert_eq!(
        serde_json::to_string(&first.effective_model).unwrap(),
        serde_json::to_string(&second.effective_model).unwrap(),
    );
}

#[test]
fn cached_models_are_isolated_from_request_mutation() {
    let dir = tempdir().unwrap();
    let pom = dir.path().join("pom.json");
    fs::write(
        &pom,
        r#"{
            "groupId": "g", "artifactId": "a", "version": "1",
            "name": "fixed-${flavor}",
            "properties": { "flavor": "vanilla" }
        }"#,
    )
    .unwrap();

    let cache = ModelCache::new();
    let builder = ModelBuilder::new();

    let mut first_request = ModelBuildingRequest::new()
        .with_pom_file(&pom)
        .with_model_cache(cache.clone())
        .with_user_property("flavor", "chocolate");
    let first = builder.build(&mut first_request).unwrap();
    assert_eq!(first.effective_model.name.as_deref(), Some("fixed-chocolate"));

    // The first build's interpolation must not have leaked into the cache.
    let mut second_request = ModelBuildingRequest::new()
        .with_pom_file(&pom)
        .with_model_cache(cache.clone());
    let second = builder.build(&mut second_request).unwrap();
    assert_eq!(second.effective_model.name.as_deref(), Some("fixed-vanilla"));
}
