//! Build requests.
//!
//! A [`ModelBuildingRequest`] carries everything one build needs: the
//! source, the validation level, property maps, profile directives, and
//! handles to the shared cache and the resolvers. Requests are wired with
//! `with_*` setters and passed mutably through the pipeline (the resolver
//! is reconfigured as the ancestor walk progresses).

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::ModelCache;
use crate::model::{Model, Profile};
use crate::problem::{ProblemCollector, ValidationLevel};
use crate::processor::TransformerContext;
use crate::resolver::{ModelResolver, WorkspaceModelResolver};
use crate::source::ModelSource;

/// Notified at pipeline milestones. The event borrows the model and the
/// collector, so neither can be retained beyond the callback.
pub struct ModelBuildingEvent<'a> {
    pub model: &'a Model,
    pub problems: &'a mut ProblemCollector,
}

pub trait ModelBuildingListener: Send + Sync {
    fn build_extensions_assembled(&self, event: ModelBuildingEvent<'_>);
}

pub struct ModelBuildingRequest {
    pub model_source: Option<ModelSource>,
    pub pom_file: Option<PathBuf>,
    pub validation_level: ValidationLevel,
    pub two_phase_building: bool,
    pub process_plugins: bool,
    pub location_tracking: bool,
    /// Enables the transformed-source merge into the raw model.
    pub raw_model_transform: bool,
    pub system_properties: BTreeMap<String, String>,
    pub user_properties: BTreeMap<String, String>,
    pub active_profile_ids: Vec<String>,
    pub inactive_profile_ids: Vec<String>,
    /// External profiles, injected after any active pom profiles.
    pub profiles: Vec<Profile>,
    pub model_cache: Option<ModelCache>,
    pub model_resolver: Option<Box<dyn ModelResolver>>,
    pub workspace_resolver: Option<Arc<dyn WorkspaceModelResolver>>,
    pub listener: Option<Box<dyn ModelBuildingListener>>,
    pub transformer_context: Option<Arc<dyn TransformerContext>>,
}

impl Default for ModelBuildingRequest {
    fn default() -> Self {
        Self {
            model_source: None,
            pom_file: None,
            validation_level: ValidationLevel::default(),
            two_phase_building: false,
            process_plugins: false,
            location_tracking: true,
            raw_model_transform: false,
            system_properties: BTreeMap::new(),
            user_properties: BTreeMap::new(),
            active_profile_ids: Vec::new(),
            inactive_profile_ids: Vec::new(),
            profiles: Vec::new(),
            model_cache: None,
            model_resolver: None,
            workspace_resolver: None,
            listener: None,
            transformer_context: None,
        }
    }
}

impl ModelBuildingRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pom_file(mut self, pom_file: impl Into<PathBuf>) -> Self {
        let pom_file = pom_file.into();
        self.model_source = Some(ModelSource::from_file(&pom_file));
        self.pom_file = Some(pom_file);
        self
    }

    pub fn with_model_source(mut self, source: ModelSource) -> Self {
        if self.pom_file.is_none() {
            self.pom_file = source.file_path().map(PathBuf::from);
        }
        self.model_source = Some(source);
        self
    }

    pub fn with_validation_level(mut self, level: ValidationLevel) -> Self {
        self.validation_level = level;
        self
    }

    pub fn with_two_phase_building(mut self, two_phase: bool) -> Self {
        self.two_phase_building = two_phase;
        self
    }

    pub fn with_process_plugins(mut self, process_plugins: bool) -> Self {
        self.process_plugins = process_plugins;
        self
    }

    pub fn with_location_tracking(mut self, location_tracking: bool) -> Self {
        self.location_tracking = location_tracking;
        self
    }

    pub fn with_system_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.system_properties = properties;
        self
    }

    pub fn with_user_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.user_properties = properties;
        self
    }

    pub fn with_user_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_properties.insert(key.into(), value.into());
        self
    }

    pub fn with_active_profile_ids(mut self, ids: Vec<String>) -> Self {
        self.active_profile_ids = ids;
        self
    }

    pub fn with_inactive_profile_ids(mut self, ids: Vec<String>) -> Self {
        self.inactive_profile_ids = ids;
        self
    }

    pub fn with_profiles(mut self, profiles: Vec<Profile>) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn with_model_cache(mut self, cache: ModelCache) -> Self {
        self.model_cache = Some(cache);
        self
    }

    pub fn with_model_resolver(mut self, resolver: Box<dyn ModelResolver>) -> Self {
        self.model_resolver = Some(resolver);
        self
    }

    pub fn with_workspace_resolver(mut self, resolver: Arc<dyn WorkspaceModelResolver>) -> Self {
        self.workspace_resolver = Some(resolver);
        self
    }

    pub fn with_listener(mut self, listener: Box<dyn ModelBuildingListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn with_transformer_context(mut self, context: Arc<dyn TransformerContext>) -> Self {
        self.transformer_context = Some(context);
        self
    }

    pub fn with_raw_model_transform(mut self, enabled: bool) -> Self {
        self.raw_model_transform = enabled;
        self
    }
}

/// System properties assembled from the running environment: `os.*` values
/// plus every environment variable under an `env.` prefix. A `JAVA_VERSION`
/// variable, when present, doubles as `java.version` for jdk activation.
pub fn system_properties_from_env() -> BTreeMap<String, String> {
    let mut properties = BTreeMap::new();
    properties.insert("os.name".into(), env::consts::OS.to_string());
    properties.insert("os.arch".into(), env::consts::ARCH.to_string());
    for (key, value) in env::vars() {
        if key == "JAVA_VERSION" {
            properties.insert("java.version".into(), value.clone());
        }
        properties.insert(format!("env.{}", key), value);
    }
    properties
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pom_file_sets_source() {
        let request = ModelBuildingRequest::new().with_pom_file("/ws/app/pom.json");
        assert_eq!(request.pom_file.as_deref().unwrap().to_str(), Some("/ws/app/pom.json"));
        assert!(request.model_source.is_some());
    }

    #[test]
    fn test_model_source_backfills_pom_file() {
        let request = ModelBuildingRequest::new()
            .with_model_source(ModelSource::from_file("/ws/app/pom.json"));
        assert!(request.pom_file.is_some());

        let request = ModelBuildingRequest::new()
            .with_model_source(ModelSource::from_string("mem", "{}"));
        assert!(request.pom_file.is_none());
    }

    #[test]
    fn test_env_properties_have_os_values() {
        let properties = system_properties_from_env();
        assert!(properties.contains_key("os.name"));
        assert!(properties.contains_key("os.arch"));
    }
}
