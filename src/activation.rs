//! Profile activation.
//!
//! A profile is activated by an explicit request id, or by the conditions
//! in its `activation` block: jdk version, operating system, property
//! presence/value, or file existence. All conditions present on one
//! profile must match. `activeByDefault` profiles apply only when nothing
//! else in the same collection activated.
//!
//! Activation expressions are evaluated against the *uninterpolated*
//! document: the builder snapshots activations before interpolation and
//! restores them afterwards, so file predicates keep their `${basedir}`
//! form.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use enum_dispatch::enum_dispatch;

use crate::model::{Activation, FileActivation, Model, OsActivation, Profile, PropertyActivation};
use crate::problem::ProblemCollector;
use crate::version::{VersionRange, is_range};

/// Everything an activation predicate may consult.
#[derive(Debug, Clone, Default)]
pub struct ActivationContext {
    pub active_ids: Vec<String>,
    pub inactive_ids: Vec<String>,
    pub system_properties: BTreeMap<String, String>,
    pub user_properties: BTreeMap<String, String>,
    pub project_properties: BTreeMap<String, String>,
    pub project_directory: Option<PathBuf>,
}

impl ActivationContext {
    /// Property lookup: user properties override system properties.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.user_properties
            .get(name)
            .or_else(|| self.system_properties.get(name))
            .map(String::as_str)
    }
}

#[enum_dispatch]
trait ActivationCondition {
    fn matches(&self, ctx: &ActivationContext) -> bool;
}

#[enum_dispatch(ActivationCondition)]
enum Condition {
    Jdk(JdkCondition),
    Os(OsCondition),
    Property(PropertyCondition),
    File(FileCondition),
}

struct JdkCondition {
    spec: String,
}

impl ActivationCondition for JdkCondition {
    fn matches(&self, ctx: &ActivationContext) -> bool {
        let Some(jdk) = ctx.property("java.version") else {
            return false;
        };
        let (negated, spec) = match self.spec.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, self.spec.as_str()),
        };
        let matched = if is_range(spec) {
            VersionRange::parse(spec).is_some_and(|range| range.contains(jdk))
        } else {
            jdk.starts_with(spec)
        };
        matched != negated
    }
}

struct OsCondition {
    os: OsActivation,
}

impl OsCondition {
    fn field_matches(expected: &str, actual: &str) -> bool {
        let (negated, expected) = match expected.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, expected),
        };
        let matched = actual.to_lowercase().contains(&expected.to_lowercase());
        matched != negated
    }

    fn family_matches(family: &str, os_name: &str) -> bool {
        let (negated, family) = match family.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, family),
        };
        let name = os_name.to_lowercase();
        let matched = match family.to_lowercase().as_str() {
            "windows" => name.contains("windows"),
            "mac" => name.contains("mac"),
            "unix" => !name.contains("windows"),
            other => name.contains(other),
        };
        matched != negated
    }
}

impl ActivationCondition for OsCondition {
    fn matches(&self, ctx: &ActivationContext) -> bool {
        let name = ctx.property("os.name").unwrap_or_default().to_string();
        let arch = ctx.property("os.arch").unwrap_or_default().to_string();
        let version = ctx.property("os.version").unwrap_or_default().to_string();

        if let Some(family) = &self.os.family
            && !Self::family_matches(family, &name)
        {
            return false;
        }
        if let Some(expected) = &self.os.name
            && !Self::field_matches(expected, &name)
        {
            return false;
        }
        if let Some(expected) = &self.os.arch
            && !Self::field_matches(expected, &arch)
        {
            return false;
        }
        if let Some(expected) = &self.os.version
            && !Self::field_matches(expected, &version)
        {
            return false;
        }
        true
    }
}

struct PropertyCondition {
    property: PropertyActivation,
}

impl ActivationCondition for PropertyCondition {
    fn matches(&self, ctx: &ActivationContext) -> bool {
        let (negated, name) = match self.property.name.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, self.property.name.as_str()),
        };
        let current = ctx.property(name);
        let matched = match &self.property.value {
            None => current.is_some(),
            Some(expected) => current == Some(expected.as_str()),
        };
        matched != negated
    }
}

struct FileCondition {
    file: FileActivation,
}

impl FileCondition {
    fn resolve(path: &str, ctx: &ActivationContext) -> PathBuf {
        let stripped = path
            .strip_prefix("${project.basedir}")
            .or_else(|| path.strip_prefix("${basedir}"));
        let relative = match stripped {
            Some(rest) => rest.trim_start_matches(['/', '\\']),
            None => path,
        };
        if stripped.is_none() && Path::new(relative).is_absolute() {
            return PathBuf::from(relative);
        }
        match &ctx.project_directory {
            Some(dir) => dir.join(relative),
            None => PathBuf::from(relative),
        }
    }
}

impl ActivationCondition for FileCondition {
    fn matches(&self, ctx: &ActivationContext) -> bool {
        if let Some(exists) = &self.file.exists {
            return Self::resolve(exists, ctx).exists();
        }
        if let Some(missing) = &self.file.missing {
            return !Self::resolve(missing, ctx).exists();
        }
        false
    }
}

fn conditions_of(activation: &Activation) -> Vec<Condition> {
    let mut conditions = Vec::new();
    if let Some(jdk) = &activation.jdk {
        conditions.push(Condition::Jdk(JdkCondition { spec: jdk.clone() }));
    }
    if let Some(os) = &activation.os {
        conditions.push(Condition::Os(OsCondition { os: os.clone() }));
    }
    if let Some(property) = &activation.property {
        conditions.push(Condition::Property(PropertyCondition {
            property: property.clone(),
        }));
    }
    if let Some(file) = &activation.file {
        conditions.push(Condition::File(FileCondition { file: file.clone() }));
    }
    conditions
}

/// Selects the active subset of a profile collection.
pub trait ProfileSelector: Send + Sync {
    fn get_active_profiles(
        &self,
        profiles: &[Profile],
        ctx: &ActivationContext,
        problems: &mut ProblemCollector,
    ) -> Vec<Profile>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProfileSelector;

impl ProfileSelector for DefaultProfileSelector {
    fn get_active_profiles(
        &self,
        profiles: &[Profile],
        ctx: &ActivationContext,
        _problems: &mut ProblemCollector,
    ) -> Vec<Profile> {
        let mut active = Vec::new();
        let mut activated_ids = Vec::new();

        for profile in profiles {
            if ctx.inactive_ids.iter().any(|id| *id == profile.id) {
                continue;
            }
            let explicitly_active = ctx.active_ids.iter().any(|id| *id == profile.id);
            let condition_active = profile.activation.as_ref().is_some_and(|activation| {
                let conditions = conditions_of(activation);
                !conditions.is_empty() && conditions.iter().all(|c| c.matches(ctx))
            });
            if explicitly_active || condition_active {
                activated_ids.push(profile.id.clone());
                active.push(profile.clone());
            }
        }

        // Default profiles fill in only when nothing else activated.
        if active.is_empty() {
            for profile in profiles {
                if ctx.inactive_ids.iter().any(|id| *id == profile.id) {
                    continue;
                }
                if profile
                    .activation
                    .as_ref()
                    .is_some_and(|a| a.active_by_default == Some(true))
                {
                    active.push(profile.clone());
                }
            }
        }
        active
    }
}

/// Merges an active profile's contribution into a model.
pub trait ProfileInjector: Send + Sync {
    fn inject_profile(
        &self,
        model: &mut Model,
        profile: &Profile,
        problems: &mut ProblemCollector,
    );
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProfileInjector;

impl ProfileInjector for DefaultProfileInjector {
    fn inject_profile(
        &self,
        model: &mut Model,
        profile: &Profile,
        _problems: &mut ProblemCollector,
    ) {
        crate::model::merge::inject_profile(model, profile);
    }
}

/// Merge active external profiles' properties into the context's user
/// properties, keeping the caller-supplied user properties dominant. The
/// bled properties feed later activation decisions without becoming
/// project properties.
pub fn bleed_external_properties(ctx: &mut ActivationContext, external: &[Profile]) {
    if external.is_empty() {
        return;
    }
    let mut merged = BTreeMap::new();
    for profile in external {
        merged.extend(
            profile
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }
    merged.extend(std::mem::take(&mut ctx.user_properties));
    ctx.user_properties = merged;
}

/// Deep copies of each profile's activation, taken before interpolation.
pub fn snapshot_activations(model: &Model) -> Vec<Option<Activation>> {
    model.profiles.iter().map(|p| p.activation.clone()).collect()
}

/// Reinstall activations captured by [`snapshot_activations`].
pub fn restore_activations(model: &mut Model, snapshot: Vec<Option<Activation>>) {
    for (profile, activation) in model.profiles.iter_mut().zip(snapshot) {
        profile.activation = activation;
    }
}
