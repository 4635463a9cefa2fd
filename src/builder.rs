//! The model building pipeline.
//!
//! [`ModelBuilder`] turns a descriptor source into an effective model in
//! two phases. Phase 1 reads and normalizes the document, activates
//! profiles, walks the parent chain into a lineage, assembles inheritance,
//! and interpolates expressions. Phase 2 translates paths, injects managed
//! defaults, imports external managed sets, expands plugin configuration,
//! and validates the result. With `two_phase_building` the request stops
//! after phase 1 so callers can mutate the interim model (typically to add
//! build extensions) before completing the build.
//!
//! Fatal problems abort the running phase immediately; error problems
//! abort at the end of the phase that collected them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::activation::{
    ActivationContext, DefaultProfileInjector, DefaultProfileSelector, ProfileInjector,
    ProfileSelector, bleed_external_properties, restore_activations, snapshot_activations,
};
use crate::cache::ModelData;
use crate::inherit::{DefaultInheritanceAssembler, InheritanceAssembler};
use crate::interpolate::{DefaultModelInterpolator, InterpolationConfig, ModelInterpolator};
use crate::lifecycle::{DefaultLifecycleBindingsInjector, LifecycleBindingsInjector};
use crate::management::{
    DefaultDependencyManagementImporter, DefaultDependencyManagementInjector,
    DefaultPluginConfigurationExpander, DefaultPluginManagementInjector,
    DefaultReportConfigurationExpander, DefaultReportingConverter, DependencyManagementImporter,
    DependencyManagementInjector, PluginConfigurationExpander, PluginManagementInjector,
    ReportConfigurationExpander, ReportingConverter,
};
use crate::model::{
    Dependency, DependencyManagement, Model, Parent, ProfileSource, format_model_id,
};
use crate::normalize::{
    DefaultModelNormalizer, DefaultUrlNormalizer, ModelNormalizer, UrlNormalizer,
};
use crate::paths::{DefaultModelPathTranslator, ModelPathTranslator};
use crate::problem::{
    ModelBuildError, Problem, ProblemCollector, Severity, ValidationLevel,
};
use crate::processor::{JsonModelProcessor, ModelProcessor, ReadError, ReadOptions};
use crate::request::{ModelBuildingEvent, ModelBuildingRequest};
use crate::result::{BuildPhase, ModelBuildingResult};
use crate::source::ModelSource;
use crate::superpom::{DefaultSuperPomProvider, SuperPomProvider};
use crate::validate::{DefaultModelValidator, ModelValidator};
use crate::version::{VersionRange, is_range};

/// Marker for "a fatal problem was collected; unwind to the phase boundary".
struct Interrupted;

type Step<T> = Result<T, Interrupted>;

/// The pipeline and its collaborators, wired once and shared by reference.
pub struct ModelBuilder {
    processor: Arc<dyn ModelProcessor>,
    validator: Arc<dyn ModelValidator>,
    normalizer: Arc<dyn ModelNormalizer>,
    url_normalizer: Arc<dyn UrlNormalizer>,
    interpolator: Arc<dyn ModelInterpolator>,
    path_translator: Arc<dyn ModelPathTranslator>,
    super_pom_provider: Arc<dyn SuperPomProvider>,
    profile_selector: Arc<dyn ProfileSelector>,
    profile_injector: Arc<dyn ProfileInjector>,
    inheritance_assembler: Arc<dyn InheritanceAssembler>,
    plugin_management_injector: Arc<dyn PluginManagementInjector>,
    dependency_management_injector: Arc<dyn DependencyManagementInjector>,
    dependency_management_importer: Arc<dyn DependencyManagementImporter>,
    lifecycle_bindings_injector: Option<Arc<dyn LifecycleBindingsInjector>>,
    plugin_configuration_expander: Arc<dyn PluginConfigurationExpander>,
    report_configuration_expander: Arc<dyn ReportConfigurationExpander>,
    reporting_converter: Arc<dyn ReportingConverter>,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self {
            processor: Arc::new(JsonModelProcessor),
            validator: Arc::new(DefaultModelValidator),
            normalizer: Arc::new(DefaultModelNormalizer),
            url_normalizer: Arc::new(DefaultUrlNormalizer),
            interpolator: Arc::new(DefaultModelInterpolator::default()),
            path_translator: Arc::new(DefaultModelPathTranslator),
            super_pom_provider: Arc::new(DefaultSuperPomProvider::default()),
            profile_selector: Arc::new(DefaultProfileSelector),
            profile_injector: Arc::new(DefaultProfileInjector),
            inheritance_assembler: Arc::new(DefaultInheritanceAssembler),
            plugin_management_injector: Arc::new(DefaultPluginManagementInjector),
            dependency_management_injector: Arc::new(DefaultDependencyManagementInjector),
            dependency_management_importer: Arc::new(DefaultDependencyManagementImporter),
            lifecycle_bindings_injector: Some(Arc::new(DefaultLifecycleBindingsInjector)),
            plugin_configuration_expander: Arc::new(DefaultPluginConfigurationExpander),
            report_configuration_expander: Arc::new(DefaultReportConfigurationExpander),
            reporting_converter: Arc::new(DefaultReportingConverter),
        }
    }
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_processor(mut self, processor: Arc<dyn ModelProcessor>) -> Self {
        self.processor = processor;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn ModelValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_profile_selector(mut self, selector: Arc<dyn ProfileSelector>) -> Self {
        self.profile_selector = selector;
        self
    }

    pub fn with_interpolator(mut self, interpolator: Arc<dyn ModelInterpolator>) -> Self {
        self.interpolator = interpolator;
        self
    }

    pub fn with_lifecycle_bindings_injector(
        mut self,
        injector: Arc<dyn LifecycleBindingsInjector>,
    ) -> Self {
        self.lifecycle_bindings_injector = Some(injector);
        self
    }

    pub fn without_lifecycle_bindings_injector(mut self) -> Self {
        self.lifecycle_bindings_injector = None;
        self
    }

    /// Build an effective model. With `two_phase_building` set on the
    /// request, stops after phase 1; complete with [`Self::build_phase_two`].
    pub fn build(
        &self,
        request: &mut ModelBuildingRequest,
    ) -> Result<ModelBuildingResult, ModelBuildError> {
        let mut problems = ProblemCollector::new();
        let mut result = match self.run_phase_one(request, &mut problems) {
            Ok(result) => result,
            Err(Interrupted) => return Err(fail(problems)),
        };
        if problems.has_errors() {
            result.problems = problems.into_problems();
            return Err(fail_with(result.model_ids.first(), result.problems));
        }
        if request.two_phase_building {
            result.problems = problems.into_problems();
            return Ok(result);
        }
        self.run_phase_two(request, result, problems)
    }

    /// Complete a build that stopped after phase 1.
    pub fn build_phase_two(
        &self,
        request: &mut ModelBuildingRequest,
        mut prior: ModelBuildingResult,
    ) -> Result<ModelBuildingResult, ModelBuildError> {
        let mut problems = ProblemCollector::new();
        if let Some(id) = prior.model_ids.first() {
            problems.set_root_model_id(id.clone());
        }
        problems.add_all(std::mem::take(&mut prior.problems));
        self.run_phase_two(request, prior, problems)
    }

    // ============================================================
    // Phase 1
    // ============================================================

    fn run_phase_one(
        &self,
        request: &mut ModelBuildingRequest,
        problems: &mut ProblemCollector,
    ) -> Step<ModelBuildingResult> {
        let Some(source) = request.model_source.clone() else {
            problems.add(Problem::new(
                Severity::Fatal,
                ValidationLevel::BASE,
                "no model source configured on the build request",
            ));
            return Err(Interrupted);
        };

        debug!(source = source.location(), "building model");
        problems.set_source(source.location());

        let file_model =
            self.read_file_model(&source, request.validation_level, request, problems)?;
        let mut result = ModelBuildingResult::new(file_model.clone());

        // Raw model: clone of the file model, optionally completed by the
        // transformed re-parse.
        let raw_model = self.build_raw_model(file_model, &source, request, problems)?;

        problems.set_root_model_id(raw_model.id());
        problems.set_source(raw_model.id());

        let leaf_data = ModelData::new(
            Some(source),
            raw_model,
            None,
            None,
            None,
        );
        let leaf_data = derive_coordinates(leaf_data);

        // Profile activation context; external profiles activate first and
        // bleed their properties into later activation decisions.
        let mut ctx = ActivationContext {
            active_ids: request.active_profile_ids.clone(),
            inactive_ids: request.inactive_profile_ids.clone(),
            system_properties: request.system_properties.clone(),
            user_properties: request.user_properties.clone(),
            project_properties: Default::default(),
            project_directory: leaf_data.model.project_directory().map(PathBuf::from),
        };
        let mut external_profiles = request.profiles.clone();
        for profile in &mut external_profiles {
            profile.source = ProfileSource::External;
        }
        let active_external =
            self.profile_selector
                .get_active_profiles(&external_profiles, &ctx, problems);
        bleed_external_properties(&mut ctx, &active_external);
        result.active_external_profiles = active_external.clone();

        // Walk the parent chain into the lineage.
        let mut lineage: Vec<Model> = Vec::new();
        let mut current = leaf_data;
        let mut is_leaf = true;
        let mut at_super = false;
        loop {
            let model_id = if at_super { String::new() } else { current.id() };
            problems.set_source(model_id.clone());
            result.model_ids.push(model_id.clone());
            result.raw_models.insert(model_id.clone(), current.model.clone());

            ctx.project_properties = current.model.properties.clone();
            ctx.project_directory = current.model.project_directory().map(PathBuf::from);
            let active_pom =
                self.profile_selector
                    .get_active_profiles(&current.model.profiles, &ctx, problems);
            trace!(
                model = %model_id,
                profiles = active_pom.len(),
                "activated pom profiles"
            );

            let mut node = current.model.clone();
            self.normalizer.merge_duplicates(&mut node, problems);
            for profile in &active_pom {
                self.profile_injector.inject_profile(&mut node, profile, problems);
            }
            if is_leaf {
                for profile in &active_external {
                    self.profile_injector.inject_profile(&mut node, profile, problems);
                }
            }
            result.active_pom_profiles.insert(model_id, active_pom);

            if let Some(resolver) = request.model_resolver.as_mut() {
                for repository in &node.repositories {
                    resolver.add_repository(repository, false);
                }
            }

            lineage.push(node);
            if at_super {
                break;
            }

            match self.read_parent(&current, request, problems)? {
                Some(parent_data) => {
                    let parent_id = parent_data.id();
                    if result.model_ids.contains(&parent_id) {
                        let chain: Vec<&str> = result
                            .model_ids
                            .iter()
                            .map(String::as_str)
                            .chain([parent_id.as_str()])
                            .collect();
                        problems.add(Problem::new(
                            Severity::Fatal,
                            ValidationLevel::BASE,
                            format!("The parents form a cycle: {}", chain.join(" -> ")),
                        ));
                        return Err(Interrupted);
                    }
                    if parent_data.model.packaging() != "pom" {
                        problems.add(
                            Problem::new(
                                Severity::Error,
                                ValidationLevel::BASE,
                                format!(
                                    "Invalid packaging for parent POM {}, must be 'pom' but is '{}'",
                                    parent_id,
                                    parent_data.model.packaging()
                                ),
                            )
                            .with_source(parent_id.clone()),
                        );
                    }
                    current = parent_data;
                }
                None => {
                    current = ModelData::anonymous(None, self.super_pom_provider.super_pom());
                    at_super = true;
                }
            }
            is_leaf = false;
        }

        result.raw_model = result.raw_models[&result.model_ids[0]].clone();
        problems.set_source(result.model_ids[0].clone());

        self.audit_plugin_versions(&lineage, request.validation_level, problems);

        // Fold the lineage, super first, down to the leaf.
        for i in (0..lineage.len().saturating_sub(1)).rev() {
            let (children, parents) = lineage.split_at_mut(i + 1);
            self.inheritance_assembler.assemble_model_inheritance(
                &mut children[i],
                &parents[0],
                problems,
            );
        }
        let mut interim = lineage.swap_remove(0);

        // Interpolation, with activation expressions preserved.
        let activation_snapshot = snapshot_activations(&interim);
        let config = InterpolationConfig {
            user_properties: ctx.user_properties.clone(),
            system_properties: request.system_properties.clone(),
        };
        let project_dir = interim.project_directory().map(PathBuf::from);
        self.interpolator
            .interpolate_model(&mut interim, project_dir.as_deref(), &config, problems);
        restore_activations(&mut interim, activation_snapshot);

        // Parent version may reference a property defined in the child, so
        // it gets one more interpolation pass against the merged model.
        if let Some(version) = interim.parent.as_ref().and_then(|p| p.version.clone()) {
            let interpolated = self.interpolator.interpolate_expression(
                &version,
                &interim,
                project_dir.as_deref(),
                &config,
            );
            if interpolated.contains("${") {
                problems.add(Problem::new(
                    Severity::Error,
                    ValidationLevel::BASE,
                    format!("Failed to interpolate parent version {}", version),
                ));
            } else if interpolated != version {
                interim.parent.as_mut().unwrap().version = Some(interpolated);
            }
        }

        // Repository configuration becomes authoritative once interpolated.
        if let Some(resolver) = request.model_resolver.as_mut() {
            for repository in &interim.repositories {
                resolver.add_repository(repository, true);
            }
        }

        result.effective_model = interim;
        result.phase = BuildPhase::AfterPhaseOne;
        Ok(result)
    }

    fn read_file_model(
        &self,
        source: &ModelSource,
        level: ValidationLevel,
        request: &ModelBuildingRequest,
        problems: &mut ProblemCollector,
    ) -> Step<Model> {
        if let Some(cache) = &request.model_cache
            && let Some(model) = cache.get_file_model(source)
        {
            trace!(source = source.location(), "file model cache hit");
            return Ok(model);
        }

        let strict = level >= ValidationLevel::Maven20;
        let options = ReadOptions {
            strict,
            location_tracking: request.location_tracking,
            transformer: None,
        };
        let mut model = match self.processor.read(source, &options) {
            Ok(model) => model,
            Err(ReadError::Parse { message }) if strict => {
                // Retry leniently; a success downgrades the failure to a
                // malformed-document diagnostic.
                let lenient = ReadOptions {
                    strict: false,
                    ..options
                };
                match self.processor.read(source, &lenient) {
                    Ok(model) => {
                        let severity = if source.file_path().is_some() {
                            Severity::Error
                        } else {
                            Severity::Warning
                        };
                        // Recovery worked, so this diagnostic surfaces at
                        // error severity without failing the build.
                        problems.add_recovered(Problem::new(
                            severity,
                            ValidationLevel::Maven20,
                            format!("Malformed POM {}: {}", source.location(), message),
                        ));
                        model
                    }
                    Err(error) => {
                        problems.add(
                            Problem::new(
                                Severity::Fatal,
                                ValidationLevel::BASE,
                                format!("Malformed POM {}: {}", source.location(), read_error_message(&error)),
                            )
                            .with_cause(&error),
                        );
                        return Err(Interrupted);
                    }
                }
            }
            Err(error) => {
                let prefix = if error.is_parse() {
                    "Malformed POM"
                } else {
                    "Non-readable POM"
                };
                problems.add(
                    Problem::new(
                        Severity::Fatal,
                        ValidationLevel::BASE,
                        format!(
                            "{} {}: {}",
                            prefix,
                            source.location(),
                            read_error_message(&error)
                        ),
                    )
                    .with_cause(&error),
                );
                return Err(Interrupted);
            }
        };

        if let Some(path) = source.file_path() {
            model.pom_file = Some(path.to_path_buf());
        }

        self.validator.validate_file_model(&model, level, problems);
        if problems.has_fatal_errors() {
            return Err(Interrupted);
        }

        if let Some(cache) = &request.model_cache {
            cache.put_file_model(source, &model);
        }
        Ok(model)
    }

    fn build_raw_model(
        &self,
        file_model: Model,
        source: &ModelSource,
        request: &ModelBuildingRequest,
        problems: &mut ProblemCollector,
    ) -> Step<Model> {
        let mut raw = file_model;

        // The transformed-source merge only matters when location trackers
        // must survive it, so it is additionally gated on location
        // tracking.
        if request.raw_model_transform
            && request.pom_file.is_some()
            && request.location_tracking
            && let Some(transformer) = &request.transformer_context
        {
            let options = ReadOptions {
                strict: false,
                location_tracking: false,
                transformer: Some(transformer.clone()),
            };
            match self.processor.read(source, &options) {
                Ok(transformed) => {
                    crate::model::merge::merge_transformed(&mut raw, &transformed);
                }
                Err(error) => {
                    problems.add(
                        Problem::new(
                            Severity::Warning,
                            ValidationLevel::BASE,
                            format!("Failed to transform POM {}", source.location()),
                        )
                        .with_cause(&error),
                    );
                }
            }
        }

        self.validator
            .validate_raw_model(&raw, request.validation_level, problems);
        if problems.has_fatal_errors() {
            return Err(Interrupted);
        }

        if let Some(cache) = &request.model_cache {
            let data = derive_coordinates(ModelData::new(
                Some(source.clone()),
                raw.clone(),
                None,
                None,
                None,
            ));
            match (&data.group_id, &data.artifact_id, &data.version) {
                (Some(g), Some(a), Some(v)) => cache.put_raw(g, a, v, &data),
                _ => cache.put_raw_for_source(source, &data),
            }
        }
        Ok(raw)
    }

    // ============================================================
    // Parent resolution
    // ============================================================

    fn read_parent(
        &self,
        child: &ModelData,
        request: &mut ModelBuildingRequest,
        problems: &mut ProblemCollector,
    ) -> Step<Option<ModelData>> {
        let Some(parent) = child.model.parent.clone() else {
            return Ok(None);
        };
        if let Some(data) = self.read_parent_local(child, &parent, request, problems)? {
            return Ok(Some(data));
        }
        self.read_parent_external(child, &parent, request, problems)
            .map(Some)
    }

    fn read_parent_local(
        &self,
        child: &ModelData,
        parent: &Parent,
        request: &ModelBuildingRequest,
        problems: &mut ProblemCollector,
    ) -> Step<Option<ModelData>> {
        let Some(child_source) = &child.source else {
            return Ok(None);
        };
        let Some(candidate_source) = child_source.related_source(parent.relative_path()) else {
            return Ok(None);
        };

        let candidate = match self.read_cached_lenient(&candidate_source, request) {
            Ok(model) => model,
            Err(error) => {
                problems.add(
                    Problem::new(
                        Severity::Warning,
                        ValidationLevel::BASE,
                        format!(
                            "Failed to read local parent POM {}: {}",
                            candidate_source.location(),
                            read_error_message(&error)
                        ),
                    )
                    .with_cause(&error),
                );
                return Ok(None);
            }
        };

        // Identity check: a mismatched sibling forces external resolution.
        let candidate_group = candidate.effective_group_id().map(str::to_string);
        let candidate_artifact = candidate.artifact_id.clone();
        if candidate_group.as_deref() != parent.group_id.as_deref()
            || candidate_artifact.as_deref() != parent.artifact_id.as_deref()
        {
            problems.add(
                Problem::new(
                    Severity::Warning,
                    ValidationLevel::BASE,
                    format!(
                        "'parent.relativePath' of POM {} points at {} instead of {}",
                        child.id(),
                        format_model_id(
                            candidate_group.as_deref(),
                            candidate_artifact.as_deref(),
                            candidate.effective_version(),
                        ),
                        parent.id(),
                    ),
                )
                .with_location(parent.location.clone()),
            );
            return Ok(None);
        }

        let candidate_version = candidate.effective_version().map(str::to_string);
        let declared = parent.version.as_deref().unwrap_or_default();
        if is_range(declared) {
            self.check_constant_child_version(&child.model, parent, problems)?;
            let in_range = VersionRange::parse(declared)
                .zip(candidate_version.as_deref())
                .is_some_and(|(range, version)| range.contains(version));
            if !in_range {
                debug!(parent = %parent.id(), "local parent outside version range");
                return Ok(None);
            }
        } else if candidate_version.as_deref() != Some(declared) {
            // Version skew against a literal declaration: fall back to the
            // repository.
            debug!(parent = %parent.id(), "local parent version skew");
            return Ok(None);
        }

        Ok(Some(derive_coordinates(ModelData::new(
            Some(candidate_source),
            candidate,
            None,
            None,
            None,
        ))))
    }

    fn read_parent_external(
        &self,
        child: &ModelData,
        parent: &Parent,
        request: &mut ModelBuildingRequest,
        problems: &mut ProblemCollector,
    ) -> Step<ModelData> {
        let (group_id, artifact_id, version) = (
            parent.group_id.clone().unwrap_or_default(),
            parent.artifact_id.clone().unwrap_or_default(),
            parent.version.clone().unwrap_or_default(),
        );

        if let Some(cache) = &request.model_cache
            && let Some(data) = cache.get_raw(&group_id, &artifact_id, &version)
            && data.source.as_ref().is_some_and(ModelSource::is_artifact)
        {
            trace!(parent = %parent.id(), "raw parent cache hit");
            return Ok(data);
        }

        let Some(resolver) = request.model_resolver.as_ref() else {
            problems.add(
                Problem::new(
                    Severity::Fatal,
                    ValidationLevel::BASE,
                    format!(
                        "Non-resolvable parent POM {}: no model resolver configured",
                        parent.id()
                    ),
                )
                .with_location(parent.location.clone()),
            );
            return Err(Interrupted);
        };
        let source = match resolver.resolve_parent(parent) {
            Ok(source) => source,
            Err(error) => {
                problems.add(
                    Problem::new(
                        Severity::Fatal,
                        ValidationLevel::BASE,
                        format!("Non-resolvable parent POM {}: {}", parent.id(), error),
                    )
                    .with_location(parent.location.clone())
                    .with_cause(&error),
                );
                return Err(Interrupted);
            }
        };

        // Ancestors from a repository get a lenient validation level.
        let lenient_level = request.validation_level.min(ValidationLevel::Maven20);
        let model = self.read_file_model(&source, lenient_level, request, problems)?;
        let mut raw = model;
        self.validator.validate_raw_model(&raw, lenient_level, problems);
        if problems.has_fatal_errors() {
            return Err(Interrupted);
        }
        raw.pom_file = None;

        let data = derive_coordinates(ModelData::new(Some(source), raw, None, None, None));

        // A range resolves to some concrete version; the child's own
        // version must then be a literal.
        if is_range(&version) {
            self.check_constant_child_version(&child.model, parent, problems)?;
        }

        if let Some(cache) = &request.model_cache
            && let (Some(g), Some(a), Some(v)) = (&data.group_id, &data.artifact_id, &data.version)
        {
            cache.put_raw(g, a, v, &data);
        }
        Ok(data)
    }

    fn check_constant_child_version(
        &self,
        child: &Model,
        parent: &Parent,
        problems: &mut ProblemCollector,
    ) -> Step<()> {
        let version_ok = child
            .version
            .as_deref()
            .is_some_and(|v| !v.contains("${"));
        if !version_ok {
            problems.add(
                Problem::new(Severity::Fatal, ValidationLevel::BASE, "Version must be a constant")
                    .with_location(parent.location.clone()),
            );
            return Err(Interrupted);
        }
        Ok(())
    }

    fn read_cached_lenient(
        &self,
        source: &ModelSource,
        request: &ModelBuildingRequest,
    ) -> Result<Model, ReadError> {
        if let Some(cache) = &request.model_cache
            && let Some(model) = cache.get_file_model(source)
        {
            return Ok(model);
        }
        let options = ReadOptions {
            strict: false,
            location_tracking: request.location_tracking,
            transformer: None,
        };
        let mut model = self.processor.read(source, &options)?;
        if let Some(path) = source.file_path() {
            model.pom_file = Some(path.to_path_buf());
        }
        if let Some(cache) = &request.model_cache {
            cache.put_file_model(source, &model);
        }
        Ok(model)
    }

    // ============================================================
    // Plugin version audit
    // ============================================================

    /// Walk the lineage super-first recording the first-seen version per
    /// plugin key; plugins that end up with no version anywhere, direct or
    /// managed, get a warning at their declaring location.
    fn audit_plugin_versions(
        &self,
        lineage: &[Model],
        level: ValidationLevel,
        problems: &mut ProblemCollector,
    ) {
        if level < ValidationLevel::Maven20 {
            return;
        }
        let mut versions: HashMap<String, Option<String>> = HashMap::new();
        let mut managed_versions: HashMap<String, Option<String>> = HashMap::new();
        let mut declarations: HashMap<String, Option<crate::model::location::InputLocation>> =
            HashMap::new();

        for model in lineage.iter().rev() {
            let Some(build) = &model.build else {
                continue;
            };
            for plugin in &build.plugins {
                let key = plugin.key();
                if versions.get(&key).map(Option::as_ref).flatten().is_none() {
                    versions.insert(key.clone(), plugin.version.clone());
                    declarations.insert(key, plugin.location.clone());
                }
            }
            if let Some(management) = &build.plugin_management {
                for plugin in &management.plugins {
                    let key = plugin.key();
                    if managed_versions.get(&key).map(Option::as_ref).flatten().is_none() {
                        managed_versions.insert(key, plugin.version.clone());
                    }
                }
            }
        }

        let mut keys: Vec<&String> = versions.keys().collect();
        keys.sort();
        for key in keys {
            let direct = versions.get(key).map(Option::as_ref).flatten();
            let managed = managed_versions.get(key).map(Option::as_ref).flatten();
            if direct.is_none() && managed.is_none() {
                problems.add(
                    Problem::new(
                        Severity::Warning,
                        ValidationLevel::Maven20,
                        format!("'build.plugins.plugin.version' for {} is missing.", key),
                    )
                    .with_location(declarations.get(key).cloned().flatten()),
                );
            }
        }
    }

    // ============================================================
    // Phase 2
    // ============================================================

    fn run_phase_two(
        &self,
        request: &mut ModelBuildingRequest,
        mut result: ModelBuildingResult,
        mut problems: ProblemCollector,
    ) -> Result<ModelBuildingResult, ModelBuildError> {
        let mut import_ids = Vec::new();
        match self.complete_effective_model(request, &mut result, &mut problems, &mut import_ids) {
            Ok(()) if !problems.has_errors() => {
                result.phase = BuildPhase::AfterPhaseTwo;
                result.problems = problems.into_problems();
                Ok(result)
            }
            _ => {
                result.problems = problems.into_problems();
                Err(fail_with(result.model_ids.first(), result.problems))
            }
        }
    }

    fn complete_effective_model(
        &self,
        request: &mut ModelBuildingRequest,
        result: &mut ModelBuildingResult,
        problems: &mut ProblemCollector,
        import_ids: &mut Vec<String>,
    ) -> Step<()> {
        let model = &mut result.effective_model;
        problems.set_source(model.id());
        debug!(model = %model.id(), "completing effective model");

        if let Some(base) = model.project_directory().map(PathBuf::from) {
            self.path_translator.align_to_base_directory(model, &base);
        }
        self.url_normalizer.normalize_model(model);

        self.plugin_management_injector
            .inject_plugin_management(model, problems);

        if let Some(listener) = &request.listener {
            listener.build_extensions_assembled(ModelBuildingEvent { model, problems });
        }

        if request.process_plugins {
            match &self.lifecycle_bindings_injector {
                Some(injector) => injector.inject_lifecycle_bindings(model, problems),
                None => {
                    problems.add(Problem::new(
                        Severity::Fatal,
                        ValidationLevel::BASE,
                        "lifecycle bindings injector is missing",
                    ));
                    return Err(Interrupted);
                }
            }
        }

        self.import_dependency_management(request, result, problems, import_ids)?;

        let model = &mut result.effective_model;
        self.dependency_management_injector
            .inject_dependency_management(model, problems);
        self.normalizer.inject_defaults(model, problems);

        if request.process_plugins {
            self.report_configuration_expander
                .expand_report_configuration(model, problems);
            self.reporting_converter.convert_reporting(model, problems);
            self.plugin_configuration_expander
                .expand_plugin_configuration(model, problems);
        }

        self.validator
            .validate_effective_model(model, request.validation_level, problems);
        Ok(())
    }

    // ============================================================
    // Dependency management import
    // ============================================================

    fn import_dependency_management(
        &self,
        request: &mut ModelBuildingRequest,
        result: &mut ModelBuildingResult,
        problems: &mut ProblemCollector,
        import_ids: &mut Vec<String>,
    ) -> Step<()> {
        let Some(entries) = result
            .effective_model
            .dependency_management
            .as_mut()
            .map(|m| m.dependencies.drain(..).collect::<Vec<Dependency>>())
        else {
            return Ok(());
        };

        let importing_id = result.effective_model.id();
        import_ids.push(importing_id);

        let mut kept = Vec::with_capacity(entries.len());
        let mut imports: Vec<DependencyManagement> = Vec::new();

        for dependency in entries {
            if !dependency.is_import() {
                kept.push(dependency);
                continue;
            }
            let (Some(group_id), Some(artifact_id), Some(version)) = (
                dependency.group_id.clone(),
                dependency.artifact_id.clone(),
                dependency.version.clone(),
            ) else {
                problems.add(
                    Problem::new(
                        Severity::Error,
                        ValidationLevel::BASE,
                        format!(
                            "'dependencyManagement.dependencies.dependency.[groupId, artifactId, version]' for {} is missing",
                            dependency.id()
                        ),
                    )
                    .with_location(dependency.location.clone()),
                );
                continue;
            };
            let import_id = format_model_id(Some(&group_id), Some(&artifact_id), Some(&version));

            if import_ids.contains(&import_id) {
                let chain: Vec<&str> = import_ids
                    .iter()
                    .map(String::as_str)
                    .chain([import_id.as_str()])
                    .collect();
                problems.add(
                    Problem::new(
                        Severity::Error,
                        ValidationLevel::BASE,
                        format!(
                            "The dependencies of type=pom and with scope=import form a cycle: {}",
                            chain.join(" -> ")
                        ),
                    )
                    .with_location(dependency.location.clone()),
                );
                continue;
            }

            if let Some(cache) = &request.model_cache
                && let Some(cached) = cache.get_import(&group_id, &artifact_id, &version)
            {
                trace!(import = %import_id, "import cache hit");
                imports.push(cached);
                continue;
            }

            let imported = self.resolve_import(
                &dependency,
                (&group_id, &artifact_id, &version),
                request,
                problems,
                import_ids,
            );
            let Some(imported) = imported else {
                continue;
            };
            if let Some(cache) = &request.model_cache {
                cache.put_import(&group_id, &artifact_id, &version, &imported);
            }
            imports.push(imported);
        }

        if let Some(management) = result.effective_model.dependency_management.as_mut() {
            management.dependencies = kept;
        }
        self.dependency_management_importer
            .import_management(&mut result.effective_model, &imports, problems);

        import_ids.pop();
        Ok(())
    }

    /// Resolve one import entry to a managed set, preferring the workspace
    /// over repository resolution. Returns `None` after reporting problems.
    fn resolve_import(
        &self,
        dependency: &Dependency,
        (group_id, artifact_id, version): (&str, &str, &str),
        request: &mut ModelBuildingRequest,
        problems: &mut ProblemCollector,
        import_ids: &mut Vec<String>,
    ) -> Option<DependencyManagement> {
        if let Some(workspace) = &request.workspace_resolver
            && let Some(model) = workspace.resolve_effective_model(group_id, artifact_id, version)
        {
            return Some(model.dependency_management.unwrap_or_default());
        }

        let import_id = format_model_id(Some(group_id), Some(artifact_id), Some(version));
        let Some(resolver) = request.model_resolver.as_ref() else {
            problems.add(
                Problem::new(
                    Severity::Error,
                    ValidationLevel::BASE,
                    format!(
                        "Non-resolvable import POM {}: no model resolver configured",
                        import_id
                    ),
                )
                .with_location(dependency.location.clone()),
            );
            return None;
        };
        let source = match resolver.resolve_dependency(dependency) {
            Ok(source) => source,
            Err(error) => {
                problems.add(
                    Problem::new(
                        Severity::Error,
                        ValidationLevel::BASE,
                        format!("Non-resolvable import POM {}: {}", import_id, error),
                    )
                    .with_location(dependency.location.clone())
                    .with_cause(&error),
                );
                return None;
            }
        };

        // Imports go through the whole pipeline as a minimal sub-build with
        // an independent resolver.
        let mut sub_request = ModelBuildingRequest::new()
            .with_model_source(source)
            .with_validation_level(ValidationLevel::Minimal)
            .with_location_tracking(request.location_tracking)
            .with_system_properties(request.system_properties.clone())
            .with_user_properties(request.user_properties.clone())
            .with_model_resolver(resolver.new_copy());
        if let Some(cache) = &request.model_cache {
            sub_request = sub_request.with_model_cache(cache.clone());
        }
        if let Some(workspace) = &request.workspace_resolver {
            sub_request = sub_request.with_workspace_resolver(workspace.clone());
        }

        match self.build_nested(&mut sub_request, import_ids) {
            Ok(result) => Some(
                result
                    .effective_model
                    .dependency_management
                    .unwrap_or_default(),
            ),
            Err(error) => {
                problems.add_all(error.problems.clone());
                problems.add(
                    Problem::new(
                        Severity::Error,
                        ValidationLevel::BASE,
                        format!("Failure building import POM {}", import_id),
                    )
                    .with_location(dependency.location.clone())
                    .with_cause(&error),
                );
                None
            }
        }
    }

    /// A full build that threads the caller's import stack through, so
    /// transitive imports detect cycles across nesting levels.
    fn build_nested(
        &self,
        request: &mut ModelBuildingRequest,
        import_ids: &mut Vec<String>,
    ) -> Result<ModelBuildingResult, ModelBuildError> {
        let mut problems = ProblemCollector::new();
        let mut result = match self.run_phase_one(request, &mut problems) {
            Ok(result) => result,
            Err(Interrupted) => return Err(fail(problems)),
        };
        if problems.has_errors() {
            result.problems = problems.into_problems();
            return Err(fail_with(result.model_ids.first(), result.problems));
        }
        match self.complete_effective_model(request, &mut result, &mut problems, import_ids) {
            Ok(()) if !problems.has_errors() => {
                result.phase = BuildPhase::AfterPhaseTwo;
                result.problems = problems.into_problems();
                Ok(result)
            }
            _ => {
                result.problems = problems.into_problems();
                Err(fail_with(result.model_ids.first(), result.problems))
            }
        }
    }
}

/// Fill a [`ModelData`]'s coordinates from its model, inheriting group and
/// version from the parent declaration where the model is silent.
fn derive_coordinates(mut data: ModelData) -> ModelData {
    data.group_id = data.model.effective_group_id().map(str::to_string);
    data.artifact_id = data.model.artifact_id.clone();
    data.version = data.model.effective_version().map(str::to_string);
    data
}

fn read_error_message(error: &ReadError) -> String {
    match error {
        ReadError::Io(io) if io.kind() == std::io::ErrorKind::InvalidData => {
            "Some input bytes do not match the file encoding.".to_string()
        }
        other => other.to_string(),
    }
}

fn fail(problems: ProblemCollector) -> ModelBuildError {
    let model_id = problems
        .root_model_id()
        .map(str::to_string)
        .unwrap_or_else(|| format_model_id(None, None, None));
    ModelBuildError::new(model_id, problems.into_problems())
}

fn fail_with(model_id: Option<&String>, problems: Vec<Problem>) -> ModelBuildError {
    let model_id = model_id
        .cloned()
        .unwrap_or_else(|| format_model_id(None, None, None));
    ModelBuildError::new(model_id, problems)
}
