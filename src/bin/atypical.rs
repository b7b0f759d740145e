use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use atypical::cli::{Cli, Commands};
use atypical::commands::build::build_files;
use atypical::commands::check::check_files;
use atypical::commands::dump::dump_files;

fn main() -> ExitCode {
    // Tracing is opt-in through ATYPICAL_LOG, e.g. ATYPICAL_LOG=atypical=debug
    if let Ok(filter) = EnvFilter::try_from_env("ATYPICAL_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            input,
            out_dir,
            class_version,
        } => build_files(&input, &out_dir, class_version),
        Commands::Check { input } => check_files(&input),
        Commands::Dump { input } => dump_files(&input),
    }
}
