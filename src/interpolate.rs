//! `${...}` expression interpolation.
//!
//! Expressions resolve against, in priority order: user properties, the
//! model's own properties, system properties, and the builtin `project.*`
//! values. Resolution is recursive; an expression cycle is reported as an
//! error and the text is left literal, as is any expression nothing can
//! resolve.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::Path;

use regex::Regex;
use serde_json::Value;

use crate::model::{Dependency, Model, Plugin, Profile, ReportPlugin, Repository};
use crate::problem::{Problem, ProblemCollector, Severity, ValidationLevel};

/// Property maps a request contributes to interpolation.
#[derive(Debug, Clone, Default)]
pub struct InterpolationConfig {
    pub user_properties: BTreeMap<String, String>,
    pub system_properties: BTreeMap<String, String>,
}

pub trait ModelInterpolator: Send + Sync {
    /// Interpolate every string field of the model in place.
    fn interpolate_model(
        &self,
        model: &mut Model,
        project_dir: Option<&Path>,
        config: &InterpolationConfig,
        problems: &mut ProblemCollector,
    );

    /// Interpolate one expression string against a model's value sources.
    fn interpolate_expression(
        &self,
        input: &str,
        model: &Model,
        project_dir: Option<&Path>,
        config: &InterpolationConfig,
    ) -> String;
}

#[derive(Debug)]
pub struct DefaultModelInterpolator {
    pattern: Regex,
}

impl Default for DefaultModelInterpolator {
    fn default() -> Self {
        Self {
            pattern: Regex::new(r"\$\{([^{}]+)\}").expect("expression pattern compiles"),
        }
    }
}

struct ValueSources {
    user_properties: BTreeMap<String, String>,
    model_properties: BTreeMap<String, String>,
    system_properties: BTreeMap<String, String>,
    project_values: BTreeMap<String, String>,
}

impl ValueSources {
    fn capture(model: &Model, project_dir: Option<&Path>, config: &InterpolationConfig) -> Self {
        let mut project_values = BTreeMap::new();
        let mut put = |key: &str, value: Option<&str>| {
            if let Some(value) = value {
                project_values.insert(key.to_string(), value.to_string());
            }
        };
        put("project.groupId", model.effective_group_id());
        put("project.artifactId", model.artifact_id.as_deref());
        put("project.version", model.effective_version());
        put("project.packaging", Some(model.packaging()));
        if let Some(dir) = project_dir {
            let dir = dir.display().to_string();
            put("project.basedir", Some(dir.as_str()));
            put("basedir", Some(dir.as_str()));
        }
        Self {
            user_properties: config.user_properties.clone(),
            model_properties: model.properties.clone(),
            system_properties: config.system_properties.clone(),
            project_values,
        }
    }

    fn lookup(&self, expression: &str) -> Option<&str> {
        self.user_properties
            .get(expression)
            .or_else(|| self.model_properties.get(expression))
            .or_else(|| self.system_properties.get(expression))
            .or_else(|| self.project_values.get(expression))
            .map(String::as_str)
    }
}

impl DefaultModelInterpolator {
    fn interpolate(
        &self,
        input: &str,
        sources: &ValueSources,
        stack: &mut Vec<String>,
        cycles: &mut HashSet<String>,
    ) -> String {
        if !input.contains("${") {
            return input.to_string();
        }
        let mut output = String::with_capacity(input.len());
        let mut last = 0;
        for captures in self.pattern.captures_iter(input) {
            let whole = captures.get(0).unwrap();
            let expression = captures.get(1).unwrap().as_str().trim();
            output.push_str(&input[last..whole.start()]);
            last = whole.end();

            if stack.iter().any(|e| e == expression) {
                cycles.insert(expression.to_string());
                output.push_str(whole.as_str());
                continue;
            }
            match sources.lookup(expression) {
                Some(value) => {
                    let value = value.to_string();
                    stack.push(expression.to_string());
                    output.push_str(&self.interpolate(&value, sources, stack, cycles));
                    stack.pop();
                }
                // Unresolvable expressions stay literal.
                None => output.push_str(whole.as_str()),
            }
        }
        output.push_str(&input[last..]);
        output
    }

    fn apply(&self, slot: &mut String, sources: &ValueSources, cycles: &mut HashSet<String>) {
        if slot.contains("${") {
            *slot = self.interpolate(slot, sources, &mut Vec::new(), cycles);
        }
    }
}

impl ModelInterpolator for DefaultModelInterpolator {
    fn interpolate_model(
        &self,
        model: &mut Model,
        project_dir: Option<&Path>,
        config: &InterpolationConfig,
        problems: &mut ProblemCollector,
    ) {
        let sources = ValueSources::capture(model, project_dir, config);
        let mut cycles = HashSet::new();
        visit_model_strings(model, &mut |slot| self.apply(slot, &sources, &mut cycles));

        let mut cycles: Vec<String> = cycles.into_iter().collect();
        cycles.sort();
        for expression in cycles {
            problems.add(Problem::new(
                Severity::Error,
                ValidationLevel::BASE,
                format!("recursive expression reference: ${{{}}}", expression),
            ));
        }
    }

    fn interpolate_expression(
        &self,
        input: &str,
        model: &Model,
        project_dir: Option<&Path>,
        config: &InterpolationConfig,
    ) -> String {
        let sources = ValueSources::capture(model, project_dir, config);
        self.interpolate(input, &sources, &mut Vec::new(), &mut HashSet::new())
    }
}

// ============================================================
// String field visitor
// ============================================================

fn visit_option(slot: &mut Option<String>, f: &mut impl FnMut(&mut String)) {
    if let Some(value) = slot {
        f(value);
    }
}

fn visit_value(value: &mut Value, f: &mut impl FnMut(&mut String)) {
    match value {
        Value::String(s) => f(s),
        Value::Array(items) => items.iter_mut().for_each(|v| visit_value(v, f)),
        Value::Object(map) => map.values_mut().for_each(|v| visit_value(v, f)),
        _ => {}
    }
}

fn visit_dependency(dependency: &mut Dependency, f: &mut impl FnMut(&mut String)) {
    visit_option(&mut dependency.group_id, f);
    visit_option(&mut dependency.artifact_id, f);
    visit_option(&mut dependency.version, f);
    visit_option(&mut dependency.dep_type, f);
    visit_option(&mut dependency.classifier, f);
    visit_option(&mut dependency.scope, f);
    for exclusion in &mut dependency.exclusions {
        visit_option(&mut exclusion.group_id, f);
        visit_option(&mut exclusion.artifact_id, f);
    }
}

fn visit_plugin(plugin: &mut Plugin, f: &mut impl FnMut(&mut String)) {
    visit_option(&mut plugin.group_id, f);
    visit_option(&mut plugin.artifact_id, f);
    visit_option(&mut plugin.version, f);
    if let Some(configuration) = &mut plugin.configuration {
        visit_value(configuration, f);
    }
    for execution in &mut plugin.executions {
        visit_option(&mut execution.phase, f);
        execution.goals.iter_mut().for_each(&mut *f);
        if let Some(configuration) = &mut execution.configuration {
            visit_value(configuration, f);
        }
    }
    plugin.dependencies.iter_mut().for_each(|d| visit_dependency(d, f));
}

fn visit_report_plugin(plugin: &mut ReportPlugin, f: &mut impl FnMut(&mut String)) {
    visit_option(&mut plugin.group_id, f);
    visit_option(&mut plugin.artifact_id, f);
    visit_option(&mut plugin.version, f);
    if let Some(configuration) = &mut plugin.configuration {
        visit_value(configuration, f);
    }
    for set in &mut plugin.report_sets {
        set.reports.iter_mut().for_each(&mut *f);
        if let Some(configuration) = &mut set.configuration {
            visit_value(configuration, f);
        }
    }
}

fn visit_repository(repository: &mut Repository, f: &mut impl FnMut(&mut String)) {
    visit_option(&mut repository.id, f);
    visit_option(&mut repository.name, f);
    visit_option(&mut repository.url, f);
    visit_option(&mut repository.layout, f);
}

fn visit_profile(profile: &mut Profile, f: &mut impl FnMut(&mut String)) {
    // Activation expressions are also visited; the builder snapshots and
    // restores them around full-model interpolation.
    if let Some(activation) = &mut profile.activation {
        visit_option(&mut activation.jdk, f);
        if let Some(file) = &mut activation.file {
            visit_option(&mut file.exists, f);
            visit_option(&mut file.missing, f);
        }
        if let Some(property) = &mut activation.property {
            f(&mut property.name);
            visit_option(&mut property.value, f);
        }
    }
    profile.properties.values_mut().for_each(&mut *f);
    profile.dependencies.iter_mut().for_each(|d| visit_dependency(d, f));
    if let Some(management) = &mut profile.dependency_management {
        management.dependencies.iter_mut().for_each(|d| visit_dependency(d, f));
    }
    if let Some(build) = &mut profile.build {
        build.plugins.iter_mut().for_each(|p| visit_plugin(p, f));
    }
    profile.repositories.iter_mut().for_each(|r| visit_repository(r, f));
}

fn visit_model_strings(model: &mut Model, f: &mut impl FnMut(&mut String)) {
    visit_option(&mut model.model_version, f);
    visit_option(&mut model.group_id, f);
    visit_option(&mut model.artifact_id, f);
    visit_option(&mut model.version, f);
    visit_option(&mut model.packaging, f);
    visit_option(&mut model.name, f);
    visit_option(&mut model.url, f);
    if let Some(parent) = &mut model.parent {
        visit_option(&mut parent.group_id, f);
        visit_option(&mut parent.artifact_id, f);
        visit_option(&mut parent.version, f);
    }
    model.properties.values_mut().for_each(&mut *f);
    model.modules.iter_mut().for_each(&mut *f);
    model.dependencies.iter_mut().for_each(|d| visit_dependency(d, f));
    if let Some(management) = &mut model.dependency_management {
        management.dependencies.iter_mut().for_each(|d| visit_dependency(d, f));
    }
    if let Some(build) = &mut model.build {
        visit_option(&mut build.default_goal, f);
        visit_option(&mut build.final_name, f);
        visit_option(&mut build.directory, f);
        visit_option(&mut build.source_directory, f);
        visit_option(&mut build.test_source_directory, f);
        visit_option(&mut build.output_directory, f);
        visit_option(&mut build.test_output_directory, f);
        build.plugins.iter_mut().for_each(|p| visit_plugin(p, f));
        if let Some(management) = &mut build.plugin_management {
            management.plugins.iter_mut().for_each(|p| visit_plugin(p, f));
        }
    }
    if let Some(reporting) = &mut model.reporting {
        visit_option(&mut reporting.output_directory, f);
        reporting.plugins.iter_mut().for_each(|p| visit_report_plugin(p, f));
    }
    model.repositories.iter_mut().for_each(|r| visit_repository(r, f));
    model.profiles.iter_mut().for_each(|p| visit_profile(p, f));
}
