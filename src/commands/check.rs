//! The `check` command: build every descriptor under a workspace root.
//!
//! Modules build in parallel; each request owns its state and problem
//! collection, with the model cache as the only shared resource, so one
//! ancestor chain is read once no matter how many modules inherit it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use glob::Pattern;
use rayon::prelude::*;
use tracing::debug;

use crate::builder::ModelBuilder;
use crate::cache::ModelCache;
use crate::cli::{CheckCommand, ExitStatus};
use crate::config::load_config;
use crate::problem::Problem;
use crate::report::{count_by_severity, print_report};
use crate::request::{ModelBuildingRequest, system_properties_from_env};
use crate::resolver::{LocalRepositoryResolver, WorkspaceIndex};
use crate::source::DESCRIPTOR_FILE_NAME;

pub fn run(cmd: &CheckCommand) -> Result<ExitStatus> {
    let root = cmd
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    if !root.is_dir() {
        bail!("'{}' is not a directory.", root.display());
    }

    let config = load_config(&root)?.config;
    let repository = cmd
        .common
        .repository
        .clone()
        .unwrap_or_else(|| root.join(&config.repository));
    let ignore_patterns = config.ignore_patterns();

    let descriptors = find_descriptors(&root, &ignore_patterns);
    if descriptors.is_empty() {
        println!("No descriptors found under '{}'.", root.display());
        return Ok(ExitStatus::Success);
    }
    debug!(count = descriptors.len(), "checking workspace descriptors");

    let builder = ModelBuilder::new();
    let cache = ModelCache::new();
    let workspace = Arc::new(WorkspaceIndex::scan(&root));
    let system_properties = system_properties_from_env();

    let outcomes: Vec<(PathBuf, Vec<Problem>, bool)> = descriptors
        .par_iter()
        .map(|pom_file| {
            let mut request = ModelBuildingRequest::new()
                .with_pom_file(pom_file)
                .with_validation_level(config.validation_level)
                .with_process_plugins(config.process_plugins)
                .with_system_properties(system_properties.clone())
                .with_active_profile_ids(config.active_profiles.clone())
                .with_inactive_profile_ids(config.inactive_profiles.clone())
                .with_model_cache(cache.clone())
                .with_workspace_resolver(workspace.clone())
                .with_model_resolver(Box::new(LocalRepositoryResolver::new(&repository)));
            match builder.build(&mut request) {
                Ok(result) => (pom_file.clone(), result.problems, false),
                Err(error) => (pom_file.clone(), error.problems, true),
            }
        })
        .collect();

    let mut problems = Vec::new();
    let mut failed = 0usize;
    for (pom_file, build_problems, build_failed) in outcomes {
        if build_failed {
            failed += 1;
            debug!(pom = %pom_file.display(), "build failed");
        }
        problems.extend(build_problems);
    }

    print_report(&problems);
    println!(
        "checked {} descriptor(s), {} failed",
        descriptors.len(),
        failed
    );

    let (_, errors, fatals) = count_by_severity(&problems);
    if failed > 0 || errors + fatals > 0 {
        Ok(ExitStatus::Failure)
    } else {
        Ok(ExitStatus::Success)
    }
}

fn find_descriptors(root: &Path, ignores: &[Pattern]) -> Vec<PathBuf> {
    let mut descriptors: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == DESCRIPTOR_FILE_NAME)
        .map(|e| e.path().to_path_buf())
        .filter(|path| {
            let relative = path.strip_prefix(root).unwrap_or(path);
            !ignores.iter().any(|p| p.matches_path(relative))
        })
        .collect();
    descriptors.sort();
    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_find_descriptors_respects_ignores() {
        let dir = tempdir().unwrap();
        let module = dir.path().join("module");
        let target = dir.path().join("target").join("generated");
        fs::create_dir_all(&module).unwrap();
        fs::create_dir_all(&target).unwrap();
        fs::write(module.join(DESCRIPTOR_FILE_NAME), "{}").unwrap();
        fs::write(target.join(DESCRIPTOR_FILE_NAME), "{}").unwrap();

        let ignores = vec![Pattern::new("target/**").unwrap()];
        let found = find_descriptors(dir.path(), &ignores);
        assert_eq!(found.len(), 1);
        assert!(found[0].starts_with(&module));
    }
}
