//! Pommel CLI application entry point.
//!
//! This binary handles command dispatch for the pommel descriptor
//! resolution tool.

use std::process::ExitCode;

use clap::Parser;
use pommel::cli::{Arguments, ExitStatus};

fn main() -> ExitCode {
    let args = Arguments::parse();

    if args.verbose() {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pommel=debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    match pommel::cli::run_cli(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitStatus::Error.into()
        }
    }
}
