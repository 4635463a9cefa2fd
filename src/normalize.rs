//! Normalization: duplicate merging and default injection.

use crate::model::merge::merge_config;
use crate::model::{Dependency, Model, Plugin};
use crate::problem::ProblemCollector;

pub trait ModelNormalizer: Send + Sync {
    /// Collapse duplicate dependency and plugin declarations. The later
    /// declaration wins, completed by the earlier one where it is silent.
    fn merge_duplicates(&self, model: &mut Model, problems: &mut ProblemCollector);

    /// Materialize implied defaults into the effective model.
    fn inject_defaults(&self, model: &mut Model, problems: &mut ProblemCollector);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultModelNormalizer;

fn dedupe_dependencies(dependencies: &mut Vec<Dependency>) {
    let mut merged: Vec<Dependency> = Vec::with_capacity(dependencies.len());
    for mut dependency in dependencies.drain(..) {
        let key = dependency.management_key();
        match merged.iter_mut().find(|d| d.management_key() == key) {
            Some(existing) => {
                crate::model::merge::merge_dependency_recessive(&mut dependency, existing);
                *existing = dependency;
            }
            None => merged.push(dependency),
        }
    }
    *dependencies = merged;
}

fn dedupe_plugins(plugins: &mut Vec<Plugin>) {
    let mut merged: Vec<Plugin> = Vec::with_capacity(plugins.len());
    for mut plugin in plugins.drain(..) {
        match merged.iter_mut().find(|p| p.key() == plugin.key()) {
            Some(existing) => {
                crate::model::merge::merge_plugin_recessive(&mut plugin, existing);
                *existing = plugin;
            }
            None => merged.push(plugin),
        }
    }
    *plugins = merged;
}

impl ModelNormalizer for DefaultModelNormalizer {
    fn merge_duplicates(&self, model: &mut Model, _problems: &mut ProblemCollector) {
        dedupe_dependencies(&mut model.dependencies);
        if let Some(management) = &mut model.dependency_management {
            dedupe_dependencies(&mut management.dependencies);
        }
        if let Some(build) = &mut model.build {
            dedupe_plugins(&mut build.plugins);
            if let Some(management) = &mut build.plugin_management {
                dedupe_plugins(&mut management.plugins);
            }
        }
    }

    fn inject_defaults(&self, model: &mut Model, _problems: &mut ProblemCollector) {
        if model.packaging.is_none() {
            model.packaging = Some("jar".into());
        }
        for dependency in &mut model.dependencies {
            if dependency.dep_type.is_none() {
                dependency.dep_type = Some("jar".into());
            }
            if dependency.scope.is_none() {
                dependency.scope = Some("compile".into());
            }
        }
        if let Some(build) = &mut model.build {
            for plugin in &mut build.plugins {
                for execution in &mut plugin.executions {
                    if execution.id.is_none() {
                        execution.id = Some("default".into());
                    }
                }
            }
        }
    }
}

/// Normalizes URLs assembled from inherited fragments.
pub trait UrlNormalizer: Send + Sync {
    fn normalize(&self, url: &str) -> String;

    fn normalize_model(&self, model: &mut Model) {
        if let Some(url) = &model.url {
            let normalized = self.normalize(url);
            model.url = Some(normalized);
        }
        for repository in &mut model.repositories {
            if let Some(url) = &repository.url {
                let normalized = self.normalize(url);
                repository.url = Some(normalized);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultUrlNormalizer;

impl UrlNormalizer for DefaultUrlNormalizer {
    /// Collapse `..` segments: `https://host/a/b/../c` becomes
    /// `https://host/a/c`. The scheme and authority are never consumed.
    fn normalize(&self, url: &str) -> String {
        if !url.contains("/..") {
            return url.to_string();
        }
        let (prefix, path) = match url.find("://") {
            Some(idx) => {
                let after_scheme = idx + 3;
                let path_start = url[after_scheme..]
                    .find('/')
                    .map(|p| after_scheme + p)
                    .unwrap_or(url.len());
                url.split_at(path_start)
            }
            None => ("", url),
        };
        let mut segments: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            if segment == ".." {
                segments.pop();
            } else {
                segments.push(segment);
            }
        }
        format!("{}{}", prefix, segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedupe_dependencies_last_wins() {
        let mut model = Model {
            dependencies: vec![
                Dependency {
                    group_id: Some("g".into()),
                    artifact_id: Some("lib".into()),
                    version: Some("1".into()),
                    ..Default::default()
                },
                Dependency {
                    group_id: Some("g".into()),
                    artifact_id: Some("lib".into()),
                    version: Some("2".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let mut problems = ProblemCollector::new();
        DefaultModelNormalizer.merge_duplicates(&mut model, &mut problems);

        assert_eq!(model.dependencies.len(), 1);
        assert_eq!(model.dependencies[0].version.as_deref(), Some("2"));
    }

    #[test]
    fn test_dedupe_dependencies_completes_from_earlier() {
        let mut model = Model {
            dependencies: vec![
                Dependency {
                    group_id: Some("g".into()),
                    artifact_id: Some("lib".into()),
                    version: Some("1".into()),
                    scope: Some("test".into()),
                    optional: Some(true),
                    exclusions: vec![crate::model::Exclusion {
                        group_id: Some("g".into()),
                        artifact_id: Some("unwanted".into()),
                    }],
                    ..Default::default()
                },
                // The later duplicate only bumps the version.
                Dependency {
                    group_id: Some("g".into()),
                    artifact_id: Some("lib".into()),
                    version: Some("2".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let mut problems = ProblemCollector::new();
        DefaultModelNormalizer.merge_duplicates(&mut model, &mut problems);

        assert_eq!(model.dependencies.len(), 1);
        let dependency = &model.dependencies[0];
        assert_eq!(dependency.version.as_deref(), Some("2"));
        assert_eq!(dependency.scope.as_deref(), Some("test"));
        assert_eq!(dependency.optional, Some(true));
        assert_eq!(dependency.exclusions.len(), 1);
    }

    #[test]
    fn test_dedupe_plugins_completes_from_earlier() {
        let mut model = Model {
            build: Some(crate::model::BuildSection {
                plugins: vec![
                    Plugin {
                        group_id: Some("p".into()),
                        artifact_id: Some("compiler".into()),
                        version: Some("3.0".into()),
                        ..Default::default()
                    },
                    Plugin {
                        group_id: Some("p".into()),
                        artifact_id: Some("compiler".into()),
                        configuration: Some(serde_json::json!({ "release": "17" })),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut problems = ProblemCollector::new();
        DefaultModelNormalizer.merge_duplicates(&mut model, &mut problems);

        let plugins = &model.build.as_ref().unwrap().plugins;
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].version.as_deref(), Some("3.0"));
        assert!(plugins[0].configuration.is_some());
    }

    #[test]
    fn test_inject_defaults() {
        let mut model = Model {
            dependencies: vec![Dependency {
                group_id: Some("g".into()),
                artifact_id: Some("lib".into()),
                version: Some("1".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut problems = ProblemCollector::new();
        DefaultModelNormalizer.inject_defaults(&mut model, &mut problems);

        assert_eq!(model.packaging.as_deref(), Some("jar"));
        assert_eq!(model.dependencies[0].scope.as_deref(), Some("compile"));
        assert_eq!(model.dependencies[0].dep_type.as_deref(), Some("jar"));
    }

    #[test]
    fn test_url_normalization() {
        let normalizer = DefaultUrlNormalizer;
        assert_eq!(
            normalizer.normalize("https://host/parent/../child"),
            "https://host/child"
        );
        assert_eq!(
            normalizer.normalize("https://host/a/b/../../c"),
            "https://host/c"
        );
        assert_eq!(normalizer.normalize("https://host/plain"), "https://host/plain");
    }
}
