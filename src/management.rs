//! Management injection, import merging, and configuration expansion.
//!
//! ## Module Structure
//!
//! - [`DependencyManagementInjector`]: fills dependency fields from the
//!   model's managed set
//! - [`DependencyManagementImporter`]: merges imported managed sets with
//!   first-declared-wins semantics
//! - [`PluginManagementInjector`]: completes build plugins from
//!   pluginManagement
//! - [`PluginConfigurationExpander`], [`ReportConfigurationExpander`]:
//!   push container configuration down into executions / report sets
//! - [`ReportingConverter`]: mirrors the reporting section into the site
//!   plugin's configuration

use serde_json::{Value, json};

use crate::model::merge::{merge_config, merge_plugin_recessive};
use crate::model::{DependencyManagement, Model, Plugin};
use crate::problem::ProblemCollector;

pub trait DependencyManagementInjector: Send + Sync {
    fn inject_dependency_management(&self, model: &mut Model, problems: &mut ProblemCollector);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDependencyManagementInjector;

impl DependencyManagementInjector for DefaultDependencyManagementInjector {
    fn inject_dependency_management(&self, model: &mut Model, _problems: &mut ProblemCollector) {
        let Some(management) = model.dependency_management.clone() else {
            return;
        };
        for dependency in &mut model.dependencies {
            let key = dependency.management_key();
            let Some(managed) = management
                .dependencies
                .iter()
                .find(|d| d.management_key() == key)
            else {
                continue;
            };
            if dependency.version.is_none() {
                dependency.version.clone_from(&managed.version);
            }
            if dependency.scope.is_none() {
                dependency.scope.clone_from(&managed.scope);
            }
            if dependency.optional.is_none() {
                dependency.optional = managed.optional;
            }
            if dependency.exclusions.is_empty() {
                dependency.exclusions.clone_from(&managed.exclusions);
            }
        }
    }
}

pub trait DependencyManagementImporter: Send + Sync {
    /// Merge imported managed sets into the model. The model's own entries
    /// always win; across imports, the first declaration of a key wins.
    fn import_management(
        &self,
        model: &mut Model,
        imports: &[DependencyManagement],
        problems: &mut ProblemCollector,
    );
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDependencyManagementImporter;

impl DependencyManagementImporter for DefaultDependencyManagementImporter {
    fn import_management(
        &self,
        model: &mut Model,
        imports: &[DependencyManagement],
        _problems: &mut ProblemCollector,
    ) {
        if imports.is_empty() {
            return;
        }
        let management = model.dependency_management.get_or_insert_with(Default::default);
        for import in imports {
            for dependency in &import.dependencies {
                let key = dependency.management_key();
                if !management
                    .dependencies
                    .iter()
                    .any(|d| d.management_key() == key)
                {
                    management.dependencies.push(dependency.clone());
                }
            }
        }
    }
}

pub trait PluginManagementInjector: Send + Sync {
    fn inject_plugin_management(&self, model: &mut Model, problems: &mut ProblemCollector);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPluginManagementInjector;

impl PluginManagementInjector for DefaultPluginManagementInjector {
    fn inject_plugin_management(&self, model: &mut Model, _problems: &mut ProblemCollector) {
        let Some(build) = &mut model.build else {
            return;
        };
        let Some(management) = build.plugin_management.clone() else {
            return;
        };
        for plugin in &mut build.plugins {
            if let Some(managed) = management.plugins.iter().find(|p| p.key() == plugin.key()) {
                merge_plugin_recessive(plugin, managed);
            }
        }
    }
}

pub trait PluginConfigurationExpander: Send + Sync {
    /// Push each plugin's configuration down into its executions; an
    /// execution's own configuration wins key-by-key.
    fn expand_plugin_configuration(&self, model: &mut Model, problems: &mut ProblemCollector);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPluginConfigurationExpander;

impl PluginConfigurationExpander for DefaultPluginConfigurationExpander {
    fn expand_plugin_configuration(&self, model: &mut Model, _problems: &mut ProblemCollector) {
        let Some(build) = &mut model.build else {
            return;
        };
        for plugin in &mut build.plugins {
            let Some(base) = plugin.configuration.clone() else {
                continue;
            };
            for execution in &mut plugin.executions {
                execution.configuration =
                    merge_config(execution.configuration.take(), Some(base.clone()));
            }
        }
    }
}

pub trait ReportConfigurationExpander: Send + Sync {
    fn expand_report_configuration(&self, model: &mut Model, problems: &mut ProblemCollector);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultReportConfigurationExpander;

impl ReportConfigurationExpander for DefaultReportConfigurationExpander {
    fn expand_report_configuration(&self, model: &mut Model, _problems: &mut ProblemCollector) {
        let Some(reporting) = &mut model.reporting else {
            return;
        };
        for plugin in &mut reporting.plugins {
            let Some(base) = plugin.configuration.clone() else {
                continue;
            };
            for set in &mut plugin.report_sets {
                set.configuration = merge_config(set.configuration.take(), Some(base.clone()));
            }
        }
    }
}

pub trait ReportingConverter: Send + Sync {
    /// Mirror the reporting section into the site plugin's configuration so
    /// downstream consumers see one canonical place.
    fn convert_reporting(&self, model: &mut Model, problems: &mut ProblemCollector);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultReportingConverter;

const SITE_PLUGIN_GROUP: &str = "org.pommel.plugins";
const SITE_PLUGIN_ARTIFACT: &str = "pommel-site-plugin";

impl ReportingConverter for DefaultReportingConverter {
    fn convert_reporting(&self, model: &mut Model, _problems: &mut ProblemCollector) {
        let Some(reporting) = &model.reporting else {
            return;
        };
        let report_plugins: Vec<Value> = reporting
            .plugins
            .iter()
            .map(|p| {
                let mut entry = json!({
                    "groupId": p.group_id,
                    "artifactId": p.artifact_id,
                });
                if let Some(version) = &p.version {
                    entry["version"] = json!(version);
                }
                if let Some(configuration) = &p.configuration {
                    entry["configuration"] = configuration.clone();
                }
                entry
            })
            .collect();

        let build = model.build.get_or_insert_with(Default::default);
        let site = match build.plugins.iter_mut().find(|p| {
            p.group_id.as_deref() == Some(SITE_PLUGIN_GROUP)
                && p.artifact_id.as_deref() == Some(SITE_PLUGIN_ARTIFACT)
        }) {
            Some(site) => site,
            None => {
                build.plugins.push(Plugin {
                    group_id: Some(SITE_PLUGIN_GROUP.into()),
                    artifact_id: Some(SITE_PLUGIN_ARTIFACT.into()),
                    ..Default::default()
                });
                build.plugins.last_mut().unwrap()
            }
        };

        let configuration = site.configuration.get_or_insert_with(|| json!({}));
        if let Value::Object(map) = configuration
            && !map.contains_key("reportPlugins")
        {
            map.insert("reportPlugins".into(), Value::Array(report_plugins));
        }
    }
}
