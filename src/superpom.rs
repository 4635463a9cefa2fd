//! The super descriptor.
//!
//! Every parent chain terminates in the implicit super descriptor, which
//! supplies the defaults all projects share: the model version, the central
//! repository, and the conventional build directories. The document is an
//! embedded asset so the engine works without any repository access.

use std::sync::OnceLock;

use crate::model::Model;

const SUPER_POM_JSON: &str = include_str!("super-pom.json");

/// Supplies the root ancestor of every lineage.
pub trait SuperPomProvider: Send + Sync {
    /// A fresh copy of the super descriptor; callers mutate it during
    /// inheritance assembly.
    fn super_pom(&self) -> Model;
}

#[derive(Debug, Default)]
pub struct DefaultSuperPomProvider {
    model: OnceLock<Model>,
}

impl SuperPomProvider for DefaultSuperPomProvider {
    fn super_pom(&self) -> Model {
        self.model
            .get_or_init(|| {
                serde_json::from_str(SUPER_POM_JSON).expect("embedded super descriptor is valid")
            })
            .clone()
    }
}
