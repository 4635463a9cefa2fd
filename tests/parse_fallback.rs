//! Strict→lenient parse fallback and the malformed-document diagnostics.

use std::fs;

use tempfile::tempdir;

use pommel::problem::Severity;
use pommel::source::ModelSource;
use pommel::{ModelBuilder, ModelBuildingRequest};

const MALFORMED: &str = r#"{
    "groupId": "g", "artifactId": "a", "version": "1",
    "flavour": "unexpected"
}"#;

#[test]
fn malformed_file_pom_builds_with_one_error() {
    let dir = tempdir().unwrap();
    let pom = dir.path().join("pom.json");
    fs::write(&pom, MALFORMED).unwrap();

    let mut request = ModelBuildingRequest::new().with_pom_file(&pom);
    let result = ModelBuilder::new().build(&mut request).unwrap();

    assert_eq!(result.effective_model.id(), "g:a:1");

    let errors: Vec<_> = result
        .problems
        .iter()
        .filter(|p| p.severity == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1, "expected exactly one error: {:?}", errors);
    assert!(errors[0].message.starts_with("Malformed POM "));
}

#[test]
fn malformed_non_file_pom_is_a_warning() {
    let source = ModelSource::from_string("inline-descriptor", MALFORMED);

    let mut request = ModelBuildingRequest::new().with_model_source(source);
    let result = ModelBuilder::new().build(&mut request).unwrap();

    let malformed: Vec<_> = result
        .problems
        .iter()
        .filter(|p| p.message.starts_with("Malformed POM "))
        .collect();
    assert_eq!(malformed.len(), 1);
    assert_eq!(malformed[0].severity, Severity::Warning);
}

#[test]
fn unparseable_document_is_fatal() {
    let dir = tempdir().unwrap();
    let pom = dir.path().join("pom.json");
    fs::write(&pom, "{ this is not json").unwrap();

    let mut request = ModelBuildingRequest::new().with_pom_file(&pom);
    let error = ModelBuilder::new().build(&mut request).unwrap_err();

    assert!(error.problems.iter().any(|p| p.severity == Severity::Fatal));
}

#[test]
fn lenient_level_accepts_unknown_fields_silently() {
    let dir = tempdir().unwrap();
    let pom = dir.path().join("pom.json");
    fs::write(&pom, MALFORMED).unwrap();

    let mut request = ModelBuildingRequest::new()
        .with_pom_file(&pom)
        .with_validation_level(pommel::ValidationLevel::Minimal);
    let result = ModelBuilder::new().build(&mut request).unwrap();

    assert!(
        !result.problems.iter().any(|p| p.message.starts_with("Malformed POM ")),
        "lenient parsing should not complain about unknown fields"
    );
}

#[test]
fn invalid_encoding_gets_a_readable_message() {
    let dir = tempdir().unwrap();
    let pom = dir.path().join("pom.json");
    fs::write(&pom, [0xff, 0xfe, 0x00, 0xc3, 0x28]).unwrap();

    let mut request = ModelBuildingRequest::new().with_pom_file(&pom);
    let error = ModelBuilder::new().build(&mut request).unwrap_err();

    assert!(
        error
            .problems
            .iter()
            .any(|p| p.message.contains("Some input bytes do not match the file encoding.")),
        "expected the encoding substitution message, got {:?}",
        error.problems
    );
}
