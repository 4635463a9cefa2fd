//! Inheritance assembly.

use crate::model::Model;
use crate::model::merge::merge_inherited;
use crate::problem::ProblemCollector;

pub trait InheritanceAssembler: Send + Sync {
    /// Merge a (fully assembled) parent into its child, child wins.
    fn assemble_model_inheritance(
        &self,
        child: &mut Model,
        parent: &Model,
        problems: &mut ProblemCollector,
    );
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInheritanceAssembler;

impl InheritanceAssembler for DefaultInheritanceAssembler {
    fn assemble_model_inheritance(
        &self,
        child: &mut Model,
        parent: &Model,
        _problems: &mut ProblemCollector,
    ) {
        merge_inherited(child, parent);
    }
}
