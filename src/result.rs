//! Build results.

use std::collections::HashMap;

use crate::model::{Model, Profile};
use crate::problem::Problem;

/// Which half of the two-phase state machine a result has completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    AfterPhaseOne,
    AfterPhaseTwo,
}

/// Everything a build produced.
///
/// `model_ids[0]` is the leaf project, `model_ids[last]` the super
/// descriptor (whose id is the empty string). The per-id maps are keyed by
/// those ids.
#[derive(Debug)]
pub struct ModelBuildingResult {
    pub phase: BuildPhase,
    pub file_model: Model,
    pub raw_model: Model,
    pub effective_model: Model,
    pub model_ids: Vec<String>,
    pub raw_models: HashMap<String, Model>,
    pub active_pom_profiles: HashMap<String, Vec<Profile>>,
    pub active_external_profiles: Vec<Profile>,
    pub problems: Vec<Problem>,
}

impl ModelBuildingResult {
    pub(crate) fn new(file_model: Model) -> Self {
        Self {
            phase: BuildPhase::AfterPhaseOne,
            raw_model: Model::default(),
            effective_model: Model::default(),
            file_model,
            model_ids: Vec::new(),
            raw_models: HashMap::new(),
            active_pom_profiles: HashMap::new(),
            active_external_profiles: Vec::new(),
            problems: Vec::new(),
        }
    }

    /// The raw model of a lineage member.
    pub fn raw_model_for(&self, model_id: &str) -> Option<&Model> {
        self.raw_models.get(model_id)
    }

    /// Active pom profiles of a lineage member.
    pub fn active_pom_profiles_for(&self, model_id: &str) -> &[Profile] {
        self.active_pom_profiles
            .get(model_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
