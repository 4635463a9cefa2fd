use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::problem::ValidationLevel;

pub const CONFIG_FILE_NAME: &str = ".pommelrc.json";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Glob patterns excluded from workspace scans.
    #[serde(default = "default_ignores")]
    pub ignores: Vec<String>,
    /// Root of the local descriptor repository.
    #[serde(default = "default_repository", alias = "repositoryDir")]
    pub repository: String,
    #[serde(default)]
    pub active_profiles: Vec<String>,
    #[serde(default)]
    pub inactive_profiles: Vec<String>,
    #[serde(default)]
    pub validation_level: ValidationLevel,
    #[serde(default)]
    pub process_plugins: bool,
}

fn default_ignores() -> Vec<String> {
    ["**/target/**", "**/node_modules/**"]
        .map(String::from)
        .to_vec()
}

fn default_repository() -> String {
    "./repository".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ignores: default_ignores(),
            repository: default_repository(),
            active_profiles: Vec::new(),
            inactive_profiles: Vec::new(),
            validation_level: ValidationLevel::default(),
            process_plugins: false,
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob patterns in `ignores` are invalid.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }
        Ok(())
    }

    /// Compiled ignore patterns; call after `validate`.
    pub fn ignore_patterns(&self) -> Vec<Pattern> {
        self.ignores
            .iter()
            .filter_map(|p| Pattern::new(p).ok())
            .collect()
    }
}

/// The default configuration rendered as a `.pommelrc.json` document.
pub fn default_config_json() -> Result<String> {
    let mut json = serde_json::to_string_pretty(&Config::default())
        .context("default configuration should serialize")?;
    json.push('\n');
    Ok(json)
}

/// Search upward from `start_dir` for a configuration file. The search is
/// bounded by the repository root: a `.git` directory without a config
/// file beside it ends the walk.
pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    for dir in start_dir.ancestors() {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir.join(".git").exists() {
            break;
        }
    }
    None
}

/// A loaded configuration and where it came from.
pub struct ConfigLoadResult {
    pub config: Config,
    /// The file the configuration was read from; `None` when the built-in
    /// defaults are in effect.
    pub path: Option<PathBuf>,
}

impl ConfigLoadResult {
    pub fn from_file(&self) -> bool {
        self.path.is_some()
    }
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    let Some(path) = find_config_file(start_dir) else {
        return Ok(ConfigLoadResult {
            config: Config::default(),
            path: None,
        });
    };
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Could not read config file '{}'", path.display()))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Config file '{}' is not valid JSON", path.display()))?;
    config.validate()?;
    Ok(ConfigLoadResult {
        config,
        path: Some(path),
    })
}
