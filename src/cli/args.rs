//! CLI argument definitions using clap.
//!
//! This module defines the command-line interface structure for all pommel
//! commands. It uses clap's derive API for declarative argument parsing.
//!
//! ## Commands
//!
//! - `build`: Resolve one descriptor and print its effective model
//! - `check`: Build every descriptor in a workspace and report problems
//! - `init`: Initialize pommel configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Return the command if one was provided, otherwise print help.
    pub fn command_or_help(self) -> Option<Command> {
        if self.command.is_none() {
            Self::command().print_help().ok();
        }
        self.command
    }

    /// Get the verbose flag from the command's common args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Build(cmd)) => cmd.common.verbose,
            Some(Command::Check(cmd)) => cmd.common.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Common arguments shared by all commands.
#[derive(Debug, Clone, Args)]
pub struct CommonArgs {
    /// Local repository root (overrides config file)
    #[arg(long)]
    pub repository: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct BuildCommand {
    /// Descriptor file or project directory (defaults to ./pom.json)
    pub path: Option<PathBuf>,

    /// Print the raw model instead of the effective model
    #[arg(long)]
    pub raw: bool,

    /// Activate a profile by id (repeatable)
    #[arg(short = 'P', long = "activate-profile")]
    pub profiles: Vec<String>,

    /// Set a user property as key=value (repeatable)
    #[arg(short = 'D', long = "define")]
    pub define: Vec<String>,

    /// Inject lifecycle bindings and expand plugin configuration
    #[arg(long)]
    pub plugins: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Workspace root to scan (defaults to the current directory)
    pub path: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a descriptor and print its effective model
    Build(BuildCommand),
    /// Build every descriptor in the workspace and report problems
    Check(CheckCommand),
    /// Initialize pommel configuration file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_with_properties() {
        let args = Arguments::parse_from([
            "pommel", "build", "module/pom.json", "-P", "ci", "-D", "revision=1.2.3", "--raw",
        ]);
        let Some(Command::Build(cmd)) = args.command else {
            panic!("expected build command");
        };
        assert_eq!(cmd.path.as_deref().unwrap().to_str(), Some("module/pom.json"));
        assert_eq!(cmd.profiles, vec!["ci"]);
        assert_eq!(cmd.define, vec!["revision=1.2.3"]);
        assert!(cmd.raw);
    }

    #[test]
    fn test_verbose_flag() {
        let args = Arguments::parse_from(["pommel", "check", "--verbose"]);
        assert!(args.verbose());

        let args = Arguments::parse_from(["pommel", "init"]);
        assert!(!args.verbose());
    }
}
