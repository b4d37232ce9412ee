mod browser;
mod cli;
mod commands;
mod config;
mod dom;
mod model;
mod route;
mod util;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::validate::ValidateError;

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "command failed");
            for cause in err.chain().skip(1) {
                error!(cause = %cause, "caused by");
            }
            exit_code_for(&err)
        }
    }
}

/// A missing sitemap gets its own exit status so callers can tell "scrape
/// first" apart from a failed run.
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    if let Some(ValidateError::ManifestMissing { .. }) = err.downcast_ref::<ValidateError>() {
        error!("run `spa-docs-sync scrape <base_url> <output_dir>` first to produce the sitemap ground truth");
        return ExitCode::from(2);
    }
    ExitCode::from(1)
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scrape(args) => commands::scrape::run(args),
        Commands::Validate(args) => commands::validate::run(args),
        Commands::Status(args) => commands::status::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
