//! Command dispatch.

use std::process::ExitCode;

use anyhow::Result;

use crate::cli::{Arguments, Command, ExitStatus};
use crate::commands;

pub fn run_cli(args: Arguments) -> Result<ExitCode> {
    let Some(command) = args.command_or_help() else {
        return Ok(ExitStatus::Success.into());
    };
    let status = match command {
        Command::Build(cmd) => commands::build::run(&cmd)?,
        Command::Check(cmd) => commands::check::run(&cmd)?,
        Command::Init => commands::init::run()?,
    };
    Ok(status.into())
}
