//! The `init` command: write a default configuration file.

use std::fs;
use std::path::Path;

use anyhow::Result;

use crate::cli::ExitStatus;
use crate::config::{CONFIG_FILE_NAME, default_config_json};

pub fn run() -> Result<ExitStatus> {
    let path = Path::new(CONFIG_FILE_NAME);
    if path.exists() {
        println!("{} already exists, leaving it untouched.", CONFIG_FILE_NAME);
        return Ok(ExitStatus::Failure);
    }
    fs::write(path, default_config_json()?)?;
    println!("Created {}.", CONFIG_FILE_NAME);
    Ok(ExitStatus::Success)
}
