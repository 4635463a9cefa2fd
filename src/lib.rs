//! Pommel - effective POM resolution engine
//!
//! Pommel is a CLI tool and library that turns a raw project descriptor
//! (`pom.json`) into a fully resolved effective model: it walks the parent
//! chain, activates profiles, merges inheritance, interpolates `${...}`
//! expressions, imports managed dependency sets, and validates the result.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (user-facing commands)
//! - `commands`: Command implementations (build, check, init)
//! - `config`: Configuration file loading and parsing
//! - `builder`: The two-phase model building pipeline
//! - `model`: The descriptor data model and merge rules
//! - `problem`: Diagnostics and the build error surface
//! - `activation`, `interpolate`, `validate`, `normalize`, `paths`,
//!   `lifecycle`, `management`, `inherit`: pipeline collaborators
//! - `cache`, `source`, `processor`, `resolver`, `superpom`: model access
//! - `report`: Problem rendering
//! - `version`: Version ordering and ranges

pub mod activation;
pub mod builder;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod inherit;
pub mod interpolate;
pub mod lifecycle;
pub mod management;
pub mod model;
pub mod normalize;
pub mod paths;
pub mod problem;
pub mod processor;
pub mod report;
pub mod request;
pub mod resolver;
pub mod result;
pub mod source;
pub mod superpom;
pub mod validate;
pub mod version;

pub use builder::ModelBuilder;
pub use cache::ModelCache;
pub use model::Model;
pub use problem::{ModelBuildError, Problem, Severity, ValidationLevel};
pub use request::ModelBuildingRequest;
pub use result::ModelBuildingResult;
pub use source::ModelSource;
