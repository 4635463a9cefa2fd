//! Graph safety: parent chains and import graphs must be acyclic.

use std::fs;
use std::path::Path;

use tempfile::tempdir;

use pommel::problem::Severity;
use pommel::resolver::LocalRepositoryResolver;
use pommel::{ModelBuilder, ModelBuildingRequest};

fn write_repo_pom(root: &Path, g: &str, a: &str, v: &str, body: &str) {
    let mut dir = root.to_path_buf();
    for part in g.split('.') {
        dir.push(part);
    }
    dir.push(a);
    dir.push(v);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{}-{}.pom.json", a, v)), body).unwrap();
}

#[test]
fn parent_cycle_is_fatal_and_names_the_chain() {
    let dir = tempdir().unwrap();
    let repo = dir.path().join("repo");

    // a:1 -> b:1 -> a:1, all repository-resolved.
    write_repo_pom(
        &repo,
        "g",
        "b",
        "1",
        r#"{
            "groupId": "g", "artifactId": "b", "version": "1", "packaging": "pom",
            "parent": { "groupId": "g", "artifactId": "a", "version": "1" }
        }"#,
    );
    write_repo_pom(
        &repo,
        "g",
        "a",
        "1",
        r#"{
            "groupId": "g", "artifactId": "a", "version": "1", "packaging": "pom",
            "parent": { "groupId": "g", "artifactId": "b", "version": "1" }
        }"#,
    );

    let project = dir.path().join("project");
    fs::create_dir(&project).unwrap();
    let pom = project.join("pom.json");
    fs::write(
        &pom,
        r#"{
            "groupId": "g", "artifactId": "a", "version": "1", "packaging": "pom",
            "parent": { "groupId": "g", "artifactId": "b", "version": "1" }
        }"#,
    )
    .unwrap();

    let mut request = ModelBuildingRequest::new()
        .with_pom_file(&pom)
        .with_model_resolver(Box::new(LocalRepositoryResolver::new(&repo)));
    let error = ModelBuilder::new().build(&mut request).unwrap_err();

    let fatal = error
        .problems
        .iter()
        .find(|p| p.severity == Severity::Fatal)
        .expect("expected a fatal cycle problem");
    assert!(fatal.message.starts_with("The parents form a cycle: "));
    assert!(fatal.message.contains("g:a:1 -> g:b:1 -> g:a:1"));
}

#[test]
fn import_cycle_is_an_error_naming_both_models() {
    let dir = tempdir().unwrap();
    let repo = dir.path().join("repo");

    write_repo_pom(
        &repo,
        "g",
        "y",
        "1",
        r#"{
            "groupId": "g", "artifactId": "y", "version": "1", "packaging": "pom",
            "dependencyManagement": {
                "dependencies": [
                    { "groupId": "g", "artifactId": "x", "version": "1", "type": "pom", "scope": "import" }
                ]
            }
        }"#,
    );
    write_repo_pom(
        &repo,
        "g",
        "x",
        "1",
        r#"{
            "groupId": "g", "artifactId": "x", "version": "1", "packaging": "pom",
            "dependencyManagement": {
                "dependencies": [
                    { "groupId": "g", "artifactId": "y", "version": "1", "type": "pom", "scope": "import" }
                ]
            }
        }"#,
    );

    let project = dir.path().join("project");
    fs::create_dir(&project).unwrap();
    let pom = project.join("pom.json");
    fs::write(
        &pom,
        r#"{
            "groupId": "g", "artifactId": "x", "version": "1", "packaging": "pom",
            "dependencyManagement": {
                "dependencies": [
                    { "groupId": "g", "artifactId": "y", "version": "1", "type": "pom", "scope": "import" }
                ]
            }
        }"#,
    )
    .unwrap();

    let mut request = ModelBuildingRequest::new()
        .with_pom_file(&pom)
        .with_model_resolver(Box::new(LocalRepositoryResolver::new(&repo)));
    let error = ModelBuilder::new().build(&mut request).unwrap_err();

    let cycle = error
        .problems
        .iter()
        .find(|p| p.message.contains("form a cycle"))
        .expect("expected an import cycle problem");
    assert_eq!(cycle.severity, Severity::Error);
    assert!(cycle.message.contains("g:x:1"));
    assert!(cycle.message.contains("g:y:1"));
}

#[test]
fn self_import_is_rejected() {
    let dir = tempdir().unwrap();
    let pom = dir.path().join("pom.json");
    fs::write(
        &pom,
        r#"{
            "groupId": "g", "artifactId": "x", "version": "1", "packaging": "pom",
            "dependencyManagement": {
                "dependencies": [
                    { "groupId": "g", "artifactId": "x", "version": "1", "type": "pom", "scope": "import" }
                ]
            }
        }"#,
    )
    .unwrap();

    let mut request = ModelBuildingRequest::new().with_pom_file(&pom);
    let error = ModelBuilder::new().build(&mut request).unwrap_err();

    assert!(
        error
            .problems
            .iter()
            .any(|p| p.severity == Severity::Error && p.message.contains("form a cycle")),
        "expected a self-import cycle problem, got {:?}",
        error.problems
    );
}
