//! Command-line interface layer.

mod args;
mod exit_status;
mod run;

pub use args::{Arguments, BuildCommand, CheckCommand, Command, CommonArgs};
pub use exit_status::ExitStatus;
pub use run::run_cli;
