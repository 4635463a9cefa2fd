//! Model merging.
//!
//! Three distinct merges run during a build, each with its own dominance
//! rules:
//!
//! - **Inheritance** (`merge_inherited`): parent into child, child wins.
//!   ArtifactId, packaging, modules, and profiles are never inherited.
//! - **Profile injection** (`inject_profile`): profile into model, profile
//!   wins. Profile repositories are prepended so they take lookup priority.
//! - **Transform merge** (`merge_transformed`): re-parsed transformed
//!   document into the raw clone. Collections carrying location metadata
//!   merge pairwise by index so trackers survive; purely structural
//!   collections are skipped or replaced wholesale.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{
    BuildSection, Dependency, DependencyManagement, Model, Plugin, Profile, Reporting, Repository,
};

fn keep_or(slot: &mut Option<String>, fallback: &Option<String>) {
    if slot.is_none() {
        slot.clone_from(fallback);
    }
}

fn overwrite(slot: &mut Option<String>, dominant: &Option<String>) {
    if dominant.is_some() {
        slot.clone_from(dominant);
    }
}

/// Merge two free-form configuration blocks. Object keys from `dominant`
/// win; nested objects merge recursively; anything else is replaced.
pub fn merge_config(dominant: Option<Value>, recessive: Option<Value>) -> Option<Value> {
    match (dominant, recessive) {
        (Some(Value::Object(dom)), Some(Value::Object(rec))) => {
            let mut merged = rec;
            for (key, dom_value) in dom {
                let value = match merged.swap_remove(&key) {
                    Some(rec_value) => {
                        merge_config(Some(dom_value), Some(rec_value)).unwrap_or(Value::Null)
                    }
                    None => dom_value,
                };
                merged.insert(key, value);
            }
            Some(Value::Object(merged))
        }
        (Some(dominant), _) => Some(dominant),
        (None, recessive) => recessive,
    }
}

fn merge_properties_recessive(target: &mut BTreeMap<String, String>, source: &BTreeMap<String, String>) {
    for (key, value) in source {
        target.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

// ============================================================
// Inheritance: parent into child, child wins
// ============================================================

pub fn merge_inherited(child: &mut Model, parent: &Model) {
    keep_or(&mut child.model_version, &parent.model_version);
    keep_or(&mut child.group_id, &parent.group_id);
    keep_or(&mut child.version, &parent.version);
    keep_or(&mut child.url, &parent.url);
    // artifactId, packaging, name, and modules identify this project alone.

    merge_properties_recessive(&mut child.properties, &parent.properties);

    merge_dependencies_recessive(&mut child.dependencies, &parent.dependencies);

    if let Some(parent_management) = &parent.dependency_management {
        let management = child.dependency_management.get_or_insert_with(Default::default);
        merge_management_recessive(management, parent_management);
    }

    if let Some(parent_build) = &parent.build {
        let build = child.build.get_or_insert_with(Default::default);
        merge_build_recessive(build, parent_build);
    }

    if let Some(parent_reporting) = &parent.reporting {
        let reporting = child.reporting.get_or_insert_with(Default::default);
        merge_reporting_recessive(reporting, parent_reporting);
    }

    merge_repositories_recessive(&mut child.repositories, &parent.repositories);
}

fn merge_dependencies_recessive(target: &mut Vec<Dependency>, source: &[Dependency]) {
    for dependency in source {
        let key = dependency.management_key();
        if !target.iter().any(|d| d.management_key() == key) {
            target.push(dependency.clone());
        }
    }
}

fn merge_management_recessive(target: &mut DependencyManagement, source: &DependencyManagement) {
    merge_dependencies_recessive(&mut target.dependencies, &source.dependencies);
}

fn merge_build_recessive(target: &mut BuildSection, source: &BuildSection) {
    keep_or(&mut target.default_goal, &source.default_goal);
    keep_or(&mut target.final_name, &source.final_name);
    keep_or(&mut target.directory, &source.directory);
    keep_or(&mut target.source_directory, &source.source_directory);
    keep_or(&mut target.test_source_directory, &source.test_source_directory);
    keep_or(&mut target.output_directory, &source.output_directory);
    keep_or(&mut target.test_output_directory, &source.test_output_directory);

    merge_plugins_recessive(&mut target.plugins, &source.plugins);

    if let Some(source_management) = &source.plugin_management {
        let management = target.plugin_management.get_or_insert_with(Default::default);
        merge_plugins_recessive(&mut management.plugins, &source_management.plugins);
    }
}

fn merge_plugins_recessive(target: &mut Vec<Plugin>, source: &[Plugin]) {
    // Parent plugins come first; a child redeclaration completes its fields
    // from the parent's.
    let mut merged: Vec<Plugin> = Vec::with_capacity(source.len() + target.len());
    for parent_plugin in source {
        match target.iter().position(|p| p.key() == parent_plugin.key()) {
            Some(index) => {
                let mut child_plugin = target.remove(index);
                merge_plugin_recessive(&mut child_plugin, parent_plugin);
                merged.push(child_plugin);
            }
            None => merged.push(parent_plugin.clone()),
        }
    }
    merged.append(target);
    *target = merged;
}

/// Complete a dependency's optional fields from a recessive declaration of
/// the same key. The key fields themselves (group, artifact, type,
/// classifier) are equal by definition and left alone.
pub(crate) fn merge_dependency_recessive(dependency: &mut Dependency, earlier: &Dependency) {
    keep_or(&mut dependency.version, &earlier.version);
    keep_or(&mut dependency.scope, &earlier.scope);
    if dependency.optional.is_none() {
        dependency.optional = earlier.optional;
    }
    if dependency.exclusions.is_empty() {
        dependency.exclusions.clone_from(&earlier.exclusions);
    }
    if dependency.location.is_none() {
        dependency.location.clone_from(&earlier.location);
    }
}

pub(crate) fn merge_plugin_recessive(plugin: &mut Plugin, parent: &Plugin) {
    keep_or(&mut plugin.version, &parent.version);
    if plugin.extensions.is_none() {
        plugin.extensions = parent.extensions;
    }
    plugin.configuration =
        merge_config(plugin.configuration.take(), parent.configuration.clone());

    let mut executions = parent.executions.clone();
    for execution in plugin.executions.drain(..) {
        match executions.iter_mut().find(|e| e.id() == execution.id()) {
            Some(existing) => *existing = execution,
            None => executions.push(execution),
        }
    }
    plugin.executions = executions;

    merge_dependencies_recessive(&mut plugin.dependencies, &parent.dependencies);
}

fn merge_reporting_recessive(target: &mut Reporting, source: &Reporting) {
    keep_or(&mut target.output_directory, &source.output_directory);
    for plugin in &source.plugins {
        match target.plugins.iter_mut().find(|p| p.key() == plugin.key()) {
            Some(existing) => {
                keep_or(&mut existing.version, &plugin.version);
                existing.configuration =
                    merge_config(existing.configuration.take(), plugin.configuration.clone());
            }
            None => target.plugins.push(plugin.clone()),
        }
    }
}

fn merge_repositories_recessive(target: &mut Vec<Repository>, source: &[Repository]) {
    for repository in source {
        if !target.iter().any(|r| r.id() == repository.id()) {
            target.push(repository.clone());
        }
    }
}

// ============================================================
// Profile injection: profile into model, profile wins
// ============================================================

pub fn inject_profile(model: &mut Model, profile: &Profile) {
    for (key, value) in &profile.properties {
        model.properties.insert(key.clone(), value.clone());
    }

    merge_dependencies_dominant(&mut model.dependencies, &profile.dependencies);

    if let Some(profile_management) = &profile.dependency_management {
        let management = model.dependency_management.get_or_insert_with(Default::default);
        merge_dependencies_dominant(&mut management.dependencies, &profile_management.dependencies);
    }

    if let Some(profile_build) = &profile.build {
        let build = model.build.get_or_insert_with(Default::default);
        merge_build_dominant(build, profile_build);
    }

    if let Some(profile_reporting) = &profile.reporting {
        let reporting = model.reporting.get_or_insert_with(Default::default);
        merge_reporting_dominant(reporting, profile_reporting);
    }

    // Profile repositories take lookup priority over the model's.
    let mut repositories = profile.repositories.clone();
    for repository in model.repositories.drain(..) {
        if !repositories.iter().any(|r| r.id() == repository.id()) {
            repositories.push(repository);
        }
    }
    model.repositories = repositories;
}

fn merge_dependencies_dominant(target: &mut Vec<Dependency>, source: &[Dependency]) {
    for dependency in source {
        let key = dependency.management_key();
        match target.iter_mut().find(|d| d.management_key() == key) {
            Some(existing) => *existing = dependency.clone(),
            None => target.push(dependency.clone()),
        }
    }
}

fn merge_build_dominant(target: &mut BuildSection, source: &BuildSection) {
    overwrite(&mut target.default_goal, &source.default_goal);
    overwrite(&mut target.final_name, &source.final_name);
    overwrite(&mut target.directory, &source.directory);

    for plugin in &source.plugins {
        match target.plugins.iter_mut().find(|p| p.key() == plugin.key()) {
            Some(existing) => merge_plugin_dominant(existing, plugin),
            None => target.plugins.push(plugin.clone()),
        }
    }

    if let Some(source_management) = &source.plugin_management {
        let management = target.plugin_management.get_or_insert_with(Default::default);
        for plugin in &source_management.plugins {
            match management.plugins.iter_mut().find(|p| p.key() == plugin.key()) {
                Some(existing) => merge_plugin_dominant(existing, plugin),
                None => management.plugins.push(plugin.clone()),
            }
        }
    }
}

fn merge_plugin_dominant(plugin: &mut Plugin, overlay: &Plugin) {
    overwrite(&mut plugin.version, &overlay.version);
    if overlay.extensions.is_some() {
        plugin.extensions = overlay.extensions;
    }
    plugin.configuration =
        merge_config(overlay.configuration.clone(), plugin.configuration.take());
    for execution in &overlay.executions {
        match plugin.executions.iter_mut().find(|e| e.id() == execution.id()) {
            Some(existing) => *existing = execution.clone(),
            None => plugin.executions.push(execution.clone()),
        }
    }
    merge_dependencies_dominant(&mut plugin.dependencies, &overlay.dependencies);
}

fn merge_reporting_dominant(target: &mut Reporting, source: &Reporting) {
    overwrite(&mut target.output_directory, &source.output_directory);
    for plugin in &source.plugins {
        match target.plugins.iter_mut().find(|p| p.key() == plugin.key()) {
            Some(existing) => {
                overwrite(&mut existing.version, &plugin.version);
                existing.configuration =
                    merge_config(plugin.configuration.clone(), existing.configuration.take());
                for set in &plugin.report_sets {
                    existing.report_sets.push(set.clone());
                }
            }
            None => target.plugins.push(plugin.clone()),
        }
    }
}

// ============================================================
// Transform merge: pairwise where locations matter
// ============================================================

/// Merge the transformed re-parse of a document into its raw clone.
///
/// Pairwise merging requires equal element counts; that holds because the
/// raw model is a clone of the same document the transform re-parsed.
pub fn merge_transformed(raw: &mut Model, transformed: &Model) {
    overwrite(&mut raw.version, &transformed.version);
    if let (Some(raw_parent), Some(transformed_parent)) = (&mut raw.parent, &transformed.parent) {
        overwrite(&mut raw_parent.version, &transformed_parent.version);
    }

    merge_dependencies_pairwise(&mut raw.dependencies, &transformed.dependencies);

    if let (Some(raw_management), Some(transformed_management)) = (
        &mut raw.dependency_management,
        &transformed.dependency_management,
    ) {
        merge_dependencies_pairwise(
            &mut raw_management.dependencies,
            &transformed_management.dependencies,
        );
    }

    if let (Some(raw_build), Some(transformed_build)) = (&mut raw.build, &transformed.build) {
        for (raw_plugin, transformed_plugin) in
            raw_build.plugins.iter_mut().zip(&transformed_build.plugins)
        {
            // Plugin containers themselves are structural; only their
            // dependency lists carry locations worth preserving.
            merge_dependencies_pairwise(&mut raw_plugin.dependencies, &transformed_plugin.dependencies);
        }
    }

    for (raw_profile, transformed_profile) in raw.profiles.iter_mut().zip(&transformed.profiles) {
        merge_dependencies_pairwise(&mut raw_profile.dependencies, &transformed_profile.dependencies);
        // Profile repositories carry no trackers: replaced wholesale.
        raw_profile
            .repositories
            .clone_from(&transformed_profile.repositories);
    }
    // Exclusions, model repositories, and executions are skipped entirely.
}

fn merge_dependencies_pairwise(target: &mut [Dependency], source: &[Dependency]) {
    for (raw, transformed) in target.iter_mut().zip(source) {
        let location = raw.location.take();
        let mut merged = transformed.clone();
        merged.location = transformed.location.clone().or(location);
        *raw = merged;
    }
}
