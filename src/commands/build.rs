//! The `build` command: resolve one descriptor and print its model.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::builder::ModelBuilder;
use crate::cache::ModelCache;
use crate::cli::{BuildCommand, ExitStatus};
use crate::config::load_config;
use crate::report::print_report;
use crate::request::{ModelBuildingRequest, system_properties_from_env};
use crate::resolver::LocalRepositoryResolver;
use crate::source::DESCRIPTOR_FILE_NAME;

pub fn run(cmd: &BuildCommand) -> Result<ExitStatus> {
    let pom_file = locate_descriptor(cmd.path.as_deref())?;
    let project_dir = pom_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let config = load_config(&project_dir)?.config;
    let repository = cmd
        .common
        .repository
        .clone()
        .unwrap_or_else(|| project_dir.join(&config.repository));

    let mut active_profiles = config.active_profiles.clone();
    active_profiles.extend(cmd.profiles.iter().cloned());

    let mut request = ModelBuildingRequest::new()
        .with_pom_file(&pom_file)
        .with_validation_level(config.validation_level)
        .with_process_plugins(config.process_plugins || cmd.plugins)
        .with_system_properties(system_properties_from_env())
        .with_user_properties(parse_defines(&cmd.define)?)
        .with_active_profile_ids(active_profiles)
        .with_inactive_profile_ids(config.inactive_profiles.clone())
        .with_model_cache(ModelCache::new())
        .with_model_resolver(Box::new(LocalRepositoryResolver::new(repository)));

    match ModelBuilder::new().build(&mut request) {
        Ok(result) => {
            if !result.problems.is_empty() {
                print_report(&result.problems);
            }
            let model = if cmd.raw {
                &result.raw_model
            } else {
                &result.effective_model
            };
            println!("{}", serde_json::to_string_pretty(model)?);
            Ok(ExitStatus::Success)
        }
        Err(error) => {
            print_report(&error.problems);
            Ok(ExitStatus::Failure)
        }
    }
}

fn locate_descriptor(path: Option<&Path>) -> Result<PathBuf> {
    let mut candidate = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DESCRIPTOR_FILE_NAME));
    if candidate.is_dir() {
        candidate = candidate.join(DESCRIPTOR_FILE_NAME);
    }
    if !candidate.is_file() {
        bail!(
            "No descriptor found at '{}'.\n\
             Hint: point 'pommel build' at a {} file or a directory containing one.",
            candidate.display(),
            DESCRIPTOR_FILE_NAME
        );
    }
    Ok(candidate)
}

fn parse_defines(defines: &[String]) -> Result<BTreeMap<String, String>> {
    let mut properties = BTreeMap::new();
    for define in defines {
        match define.split_once('=') {
            Some((key, value)) => {
                properties.insert(key.trim().to_string(), value.to_string());
            }
            None => bail!("Invalid property definition '{}', expected key=value.", define),
        }
    }
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defines() {
        let properties =
            parse_defines(&["revision=1.2.3".into(), "flag=".into()]).unwrap();
        assert_eq!(properties.get("revision").map(String::as_str), Some("1.2.3"));
        assert_eq!(properties.get("flag").map(String::as_str), Some(""));
    }

    #[test]
    fn test_parse_defines_rejects_bare_key() {
        assert!(parse_defines(&["oops".into()]).is_err());
    }

    #[test]
    fn test_locate_descriptor_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DESCRIPTOR_FILE_NAME), "{}").unwrap();

        let located = locate_descriptor(Some(dir.path())).unwrap();
        assert!(located.ends_with(DESCRIPTOR_FILE_NAME));

        let missing = dir.path().join("missing");
        assert!(locate_descriptor(Some(missing.as_path())).is_err());
    }
}
