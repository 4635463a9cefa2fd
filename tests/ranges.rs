//! Version-range parent declarations: local acceptance, skew fallback, and
//! the constant-version policy.

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use pommel::problem::Severity;
use pommel::resolver::LocalRepositoryResolver;
use pommel::{ModelBuilder, ModelBuildingRequest};

fn parent_body(version: &str) -> String {
    format!(
        r#"{{
            "modelVersion": "4.0.0",
            "groupId": "g", "artifactId": "par", "version": "{}",
            "packaging": "pom"
        }}"#,
        version
    )
}

/// Workspace layout: `<root>/parent/pom.json` + `<root>/child/pom.json`
/// where the child declares `relativePath: "../parent"`.
fn write_workspace(root: &Path, local_parent_version: &str, declared: &str) -> std::path::PathBuf {
    let parent_dir = root.join("parent");
    fs::create_dir_all(&parent_dir).unwrap();
    fs::write(parent_dir.join("pom.json"), parent_body(local_parent_version)).unwrap();

    let child_dir = root.join("child");
    fs::create_dir_all(&child_dir).unwrap();
    let child_pom = child_dir.join("pom.json");
    fs::write(
        &child_pom,
        format!(
            r#"{{
                "artifactId": "c",
                "groupId": "g",
                "version": "9",
                "parent": {{
                    "groupId": "g", "artifactId": "par", "version": "{}",
                    "relativePath": "../parent"
                }}
            }}"#,
            declared
        ),
    )
    .unwrap();
    child_pom
}

fn write_repo_parent(repo: &Path, version: &str) {
    let dir = repo.join("g").join("par").join(version);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join(format!("par-{}.pom.json", version)),
        parent_body(version),
    )
    .unwrap();
}

#[test]
fn local_parent_inside_range_is_accepted() {
    let dir = tempdir().unwrap();
    let child_pom = write_workspace(dir.path(), "1.5", "[1.0,2.0)");

    let mut request = ModelBuildingRequest::new().with_pom_file(&child_pom);
    let result = ModelBuilder::new().build(&mut request).unwrap();

    assert_eq!(result.model_ids[1], "g:par:1.5");
}

#[test]
fn local_parent_at_exclusive_bound_falls_back_to_repository() {
    let dir = tempdir().unwrap();
    let child_pom = write_workspace(dir.path(), "2.0", "[1.0,2.0)");
    let repo = dir.path().join("repo");
    write_repo_parent(&repo, "1.5");

    let mut request = ModelBuildingRequest::new()
        .with_pom_file(&child_pom)
        .with_model_resolver(Box::new(LocalRepositoryResolver::new(&repo)));
    let result = ModelBuilder::new().build(&mut request).unwrap();

    assert_eq!(result.model_ids[1], "g:par:1.5");
}

#[test]
fn local_parent_outside_range_falls_back_to_repository() {
    let dir = tempdir().unwrap();
    let child_pom = write_workspace(dir.path(), "3.0", "[1.0,2.0)");
    let repo = dir.path().join("repo");
    write_repo_parent(&repo, "1.2");

    let mut request = ModelBuildingRequest::new()
        .with_pom_file(&child_pom)
        .with_model_resolver(Box::new(LocalRepositoryResolver::new(&repo)));
    let result = ModelBuilder::new().build(&mut request).unwrap();

    assert_eq!(result.model_ids[1], "g:par:1.2");
}

#[test]
fn literal_version_skew_falls_back_to_repository() {
    let dir = tempdir().unwrap();
    let child_pom = write_workspace(dir.path(), "2.0", "1.0");
    let repo = dir.path().join("repo");
    write_repo_parent(&repo, "1.0");

    let mut request = ModelBuildingRequest::new()
        .with_pom_file(&child_pom)
        .with_model_resolver(Box::new(LocalRepositoryResolver::new(&repo)));
    let result = ModelBuilder::new().build(&mut request).unwrap();

    assert_eq!(result.model_ids[1], "g:par:1.0");
}

#[test]
fn range_parent_requires_constant_child_version() {
    let dir = tempdir().unwrap();
    let parent_dir = dir.path().join("parent");
    fs::create_dir_all(&parent_dir).unwrap();
    fs::write(parent_dir.join("pom.json"), parent_body("1.5")).unwrap();

    let child_dir = dir.path().join("child");
    fs::create_dir_all(&child_dir).unwrap();
    let child_pom = child_dir.join("pom.json");
    fs::write(
        &child_pom,
        r#"{
            "artifactId": "c",
            "groupId": "g",
            "version": "${revision}",
            "parent": {
                "groupId": "g", "artifactId": "par", "version": "[1.0,2.0)",
                "relativePath": "../parent"
            }
        }"#,
    )
    .unwrap();

    let mut request = ModelBuildingRequest::new().with_pom_file(&child_pom);
    let error = ModelBuilder::new().build(&mut request).unwrap_err();

    assert!(
        error
            .problems
            .iter()
            .any(|p| p.severity == Severity::Fatal && p.message == "Version must be a constant"),
        "expected the constant-version policy failure, got {:?}",
        error.problems
    );
}

#[test]
fn unresolvable_parent_is_fatal() {
    let dir = tempdir().unwrap();
    let child_dir = dir.path().join("child");
    fs::create_dir_all(&child_dir).unwrap();
    let child_pom = child_dir.join("pom.json");
    fs::write(
        &child_pom,
        r#"{
            "artifactId": "c",
            "parent": { "groupId": "g", "artifactId": "ghost", "version": "1" }
        }"#,
    )
    .unwrap();

    let repo = dir.path().join("empty-repo");
    fs::create_dir_all(&repo).unwrap();

    let mut request = ModelBuildingRequest::new()
        .with_pom_file(&child_pom)
        .with_model_resolver(Box::new(LocalRepositoryResolver::new(&repo)));
    let error = ModelBuilder::new().build(&mut request).unwrap_err();

    assert!(
        error
            .problems
            .iter()
            .any(|p| p.severity == Severity::Fatal
                && p.message.starts_with("Non-resolvable parent POM g:ghost:1")),
    );
}
