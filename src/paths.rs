//! Base-directory alignment of build paths.

use std::path::Path;

use crate::model::Model;

pub trait ModelPathTranslator: Send + Sync {
    /// Rewrite relative build paths to absolute paths under the project
    /// directory. Absolute paths and expression placeholders are left
    /// untouched.
    fn align_to_base_directory(&self, model: &mut Model, base: &Path);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultModelPathTranslator;

fn align(slot: &mut Option<String>, base: &Path) {
    if let Some(value) = slot {
        if value.contains("${") || Path::new(value.as_str()).is_absolute() {
            return;
        }
        *slot = Some(base.join(value.as_str()).display().to_string());
    }
}

impl ModelPathTranslator for DefaultModelPathTranslator {
    fn align_to_base_directory(&self, model: &mut Model, base: &Path) {
        let Some(build) = &mut model.build else {
            return;
        };
        align(&mut build.directory, base);
        align(&mut build.source_directory, base);
        align(&mut build.test_source_directory, base);
        align(&mut build.output_directory, base);
        align(&mut build.test_output_directory, base);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BuildSection;

    #[test]
    fn test_relative_paths_are_aligned() {
        let mut model = Model {
            build: Some(BuildSection {
                directory: Some("target".into()),
                source_directory: Some("/abs/src".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        DefaultModelPathTranslator.align_to_base_directory(&mut model, Path::new("/ws/app"));

        let build = model.build.unwrap();
        assert_eq!(
            build.directory.as_deref(),
            Some(Path::new("/ws/app/target").to_str().unwrap())
        );
        assert_eq!(build.source_directory.as_deref(), Some("/abs/src"));
    }

    #[test]
    fn test_expressions_left_alone() {
        let mut model = Model {
            build: Some(BuildSection {
                directory: Some("${project.basedir}/target".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        DefaultModelPathTranslator.align_to_base_directory(&mut model, Path::new("/ws"));
        assert_eq!(
            model.build.unwrap().directory.as_deref(),
            Some("${project.basedir}/target")
        );
    }
}
