//! Model validation.
//!
//! Three entry points matching the pipeline stages: file-level (structural
//! shape, run right after parsing), raw-level (before inheritance), and
//! effective-level (the final gate). Each check carries the validation
//! level at which it applies; checks gated above the request's level are
//! not emitted.

use crate::model::location::InputLocation;
use crate::model::{Dependency, Model};
use crate::problem::{Problem, ProblemCollector, Severity, ValidationLevel};

pub trait ModelValidator: Send + Sync {
    fn validate_file_model(
        &self,
        model: &Model,
        level: ValidationLevel,
        problems: &mut ProblemCollector,
    );

    fn validate_raw_model(
        &self,
        model: &Model,
        level: ValidationLevel,
        problems: &mut ProblemCollector,
    );

    fn validate_effective_model(
        &self,
        model: &Model,
        level: ValidationLevel,
        problems: &mut ProblemCollector,
    );
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultModelValidator;

fn violation(
    problems: &mut ProblemCollector,
    level: ValidationLevel,
    severity: Severity,
    gate: ValidationLevel,
    message: String,
    location: Option<InputLocation>,
) {
    if level >= gate {
        problems.add(Problem::new(severity, gate, message).with_location(location));
    }
}

fn valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn check_id_charset(
    problems: &mut ProblemCollector,
    level: ValidationLevel,
    field: &str,
    value: Option<&str>,
) {
    if let Some(value) = value
        && !value.contains("${")
        && !valid_id(value)
    {
        violation(
            problems,
            level,
            Severity::Error,
            ValidationLevel::Maven20,
            format!("'{}' with value '{}' contains invalid characters", field, value),
            None,
        );
    }
}

fn check_dependency_coordinates(
    problems: &mut ProblemCollector,
    level: ValidationLevel,
    prefix: &str,
    dependency: &Dependency,
) {
    if dependency.group_id.as_deref().unwrap_or("").is_empty() {
        violation(
            problems,
            level,
            Severity::Error,
            ValidationLevel::Maven20,
            format!("'{}.groupId' for {} is missing", prefix, dependency.id()),
            dependency.location.clone(),
        );
    }
    if dependency.artifact_id.as_deref().unwrap_or("").is_empty() {
        violation(
            problems,
            level,
            Severity::Error,
            ValidationLevel::Maven20,
            format!("'{}.artifactId' for {} is missing", prefix, dependency.id()),
            dependency.location.clone(),
        );
    }
}

impl ModelValidator for DefaultModelValidator {
    fn validate_file_model(
        &self,
        model: &Model,
        level: ValidationLevel,
        problems: &mut ProblemCollector,
    ) {
        if let Some(parent) = &model.parent {
            for (field, value) in [
                ("parent.groupId", &parent.group_id),
                ("parent.artifactId", &parent.artifact_id),
                ("parent.version", &parent.version),
            ] {
                if value.as_deref().unwrap_or("").is_empty() {
                    violation(
                        problems,
                        level,
                        Severity::Fatal,
                        ValidationLevel::BASE,
                        format!("'{}' is missing", field),
                        parent.location.clone(),
                    );
                }
            }
        }

        let mut seen = Vec::new();
        for profile in &model.profiles {
            if seen.contains(&&profile.id) {
                violation(
                    problems,
                    level,
                    Severity::Warning,
                    ValidationLevel::BASE,
                    format!("duplicate profile id '{}'", profile.id),
                    profile.location.clone(),
                );
            }
            seen.push(&profile.id);
        }
    }

    fn validate_raw_model(
        &self,
        model: &Model,
        level: ValidationLevel,
        problems: &mut ProblemCollector,
    ) {
        if model.model_version.is_none() {
            violation(
                problems,
                level,
                Severity::Warning,
                ValidationLevel::Maven20,
                "'modelVersion' is missing".into(),
                None,
            );
        }
        if model.artifact_id.as_deref().unwrap_or("").is_empty() {
            violation(
                problems,
                level,
                Severity::Error,
                ValidationLevel::Maven20,
                "'artifactId' is missing".into(),
                None,
            );
        }
        if model.effective_group_id().unwrap_or("").is_empty() {
            violation(
                problems,
                level,
                Severity::Error,
                ValidationLevel::Maven20,
                "'groupId' is missing".into(),
                None,
            );
        }
        if model.effective_version().unwrap_or("").is_empty() {
            violation(
                problems,
                level,
                Severity::Error,
                ValidationLevel::Maven20,
                "'version' is missing".into(),
                None,
            );
        }

        check_id_charset(problems, level, "groupId", model.group_id.as_deref());
        check_id_charset(problems, level, "artifactId", model.artifact_id.as_deref());

        for dependency in &model.dependencies {
            check_dependency_coordinates(problems, level, "dependencies.dependency", dependency);
        }
        if let Some(management) = &model.dependency_management {
            for dependency in &management.dependencies {
                check_dependency_coordinates(
                    problems,
                    level,
                    "dependencyManagement.dependencies.dependency",
                    dependency,
                );
            }
        }

        let mut seen = Vec::new();
        for dependency in &model.dependencies {
            let key = dependency.management_key();
            if seen.contains(&key) {
                violation(
                    problems,
                    level,
                    Severity::Error,
                    ValidationLevel::Maven30,
                    format!("dependency {} is declared more than once", key),
                    dependency.location.clone(),
                );
            }
            seen.push(key);
        }
    }

    fn validate_effective_model(
        &self,
        model: &Model,
        level: ValidationLevel,
        problems: &mut ProblemCollector,
    ) {
        for (field, value) in [
            ("modelVersion", &model.model_version),
            ("groupId", &model.group_id),
            ("artifactId", &model.artifact_id),
            ("version", &model.version),
        ] {
            if value.as_deref().unwrap_or("").is_empty() {
                violation(
                    problems,
                    level,
                    Severity::Error,
                    ValidationLevel::BASE,
                    format!("'{}' is missing", field),
                    None,
                );
            }
        }

        for dependency in &model.dependencies {
            if dependency.version.as_deref().unwrap_or("").is_empty() {
                violation(
                    problems,
                    level,
                    Severity::Error,
                    ValidationLevel::Maven20,
                    format!(
                        "'dependencies.dependency.version' for {} is missing",
                        dependency.management_key()
                    ),
                    dependency.location.clone(),
                );
            }
        }

        for repository in &model.repositories {
            if repository.id.as_deref().unwrap_or("").is_empty()
                || repository.url.as_deref().unwrap_or("").is_empty()
            {
                violation(
                    problems,
                    level,
                    Severity::Error,
                    ValidationLevel::Maven20,
                    format!("repository '{}' must declare an id and a url", repository.id()),
                    None,
                );
            }
        }

        if let Some(build) = &model.build {
            for plugin in &build.plugins {
                if plugin.artifact_id.as_deref().unwrap_or("").is_empty() {
                    violation(
                        problems,
                        level,
                        Severity::Error,
                        ValidationLevel::Maven20,
                        "'build.plugins.plugin.artifactId' is missing".into(),
                        plugin.location.clone(),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Parent, Repository};

    fn messages(problems: &ProblemCollector) -> Vec<String> {
        problems.problems().iter().map(|p| p.message.clone()).collect()
    }

    fn minimal_effective() -> Model {
        Model {
            model_version: Some("4.0.0".into()),
            group_id: Some("g".into()),
            artifact_id: Some("a".into()),
            version: Some("1".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_file_validation_requires_parent_coordinates() {
        let model = Model {
            parent: Some(Parent {
                group_id: Some("g".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut problems = ProblemCollector::new();
        DefaultModelValidator.validate_file_model(&model, ValidationLevel::Strict, &mut problems);

        assert!(problems.has_fatal_errors());
        assert_eq!(problems.problems().len(), 2);
    }

    #[test]
    fn test_raw_validation_accepts_inherited_gav() {
        let model = Model {
            artifact_id: Some("child".into()),
            parent: Some(Parent {
                group_id: Some("g".into()),
                artifact_id: Some("par".into()),
                version: Some("1".into()),
                ..Default::default()
            }),
            model_version: Some("4.0.0".into()),
            ..Default::default()
        };
        let mut problems = ProblemCollector::new();
        DefaultModelValidator.validate_raw_model(&model, ValidationLevel::Strict, &mut problems);
        assert!(!problems.has_errors());
    }

    #[test]
    fn test_raw_validation_gate_filters_checks() {
        let model = Model {
            artifact_id: Some("a".into()),
            group_id: Some("g".into()),
            version: Some("1".into()),
            model_version: Some("4.0.0".into()),
            dependencies: vec![
                Dependency {
                    group_id: Some("g".into()),
                    artifact_id: Some("dup".into()),
                    ..Default::default()
                },
                Dependency {
                    group_id: Some("g".into()),
                    artifact_id: Some("dup".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let mut problems = ProblemCollector::new();
        DefaultModelValidator.validate_raw_model(&model, ValidationLevel::Maven20, &mut problems);
        assert!(!problems.has_errors(), "duplicate check is gated at 3.0");

        let mut problems = ProblemCollector::new();
        DefaultModelValidator.validate_raw_model(&model, ValidationLevel::Maven30, &mut problems);
        assert!(problems.has_errors());
        assert!(messages(&problems)[0].contains("more than once"));
    }

    #[test]
    fn test_raw_validation_invalid_characters() {
        let model = Model {
            artifact_id: Some("bad name".into()),
            group_id: Some("g".into()),
            version: Some("1".into()),
            model_version: Some("4.0.0".into()),
            ..Default::default()
        };
        let mut problems = ProblemCollector::new();
        DefaultModelValidator.validate_raw_model(&model, ValidationLevel::Strict, &mut problems);
        assert!(messages(&problems).iter().any(|m| m.contains("invalid characters")));
    }

    #[test]
    fn test_raw_validation_allows_expression_ids() {
        let model = Model {
            artifact_id: Some("a".into()),
            group_id: Some("${my.group}".into()),
            version: Some("1".into()),
            model_version: Some("4.0.0".into()),
            ..Default::default()
        };
        let mut problems = ProblemCollector::new();
        DefaultModelValidator.validate_raw_model(&model, ValidationLevel::Strict, &mut problems);
        assert!(!problems.has_errors());
    }

    #[test]
    fn test_effective_validation_requires_dependency_versions() {
        let model = Model {
            dependencies: vec![Dependency {
                group_id: Some("g".into()),
                artifact_id: Some("lib".into()),
                ..Default::default()
            }],
            ..minimal_effective()
        };
        let mut problems = ProblemCollector::new();
        DefaultModelValidator.validate_effective_model(&model, ValidationLevel::Strict, &mut problems);

        assert!(problems.has_errors());
        assert!(
            messages(&problems)[0]
                .contains("'dependencies.dependency.version' for g:lib:jar is missing")
        );
    }

    #[test]
    fn test_effective_validation_repository_url() {
        let model = Model {
            repositories: vec![Repository {
                id: Some("partial".into()),
                ..Default::default()
            }],
            ..minimal_effective()
        };
        let mut problems = ProblemCollector::new();
        DefaultModelValidator.validate_effective_model(&model, ValidationLevel::Strict, &mut problems);
        assert!(problems.has_errors());
    }

    #[test]
    fn test_effective_validation_clean_model() {
        let mut problems = ProblemCollector::new();
        DefaultModelValidator.validate_effective_model(
            &minimal_effective(),
            ValidationLevel::Strict,
            &mut problems,
        );
        assert!(problems.problems().is_empty());
    }
}
