//! deplayer - cached dependency layer build step
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use deplayer::cli::{Cli, Commands, LogFormat};
use deplayer::error::DeplayerResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{} {} failed: {}",
                style("Error:").red().bold(),
                e.phase(),
                e
            );
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DeplayerResult<()> {
    let cli = Cli::parse();

    // 0 = info (build log), 1 = debug, 2+ = trace
    let filter = match cli.verbose {
        0 => EnvFilter::new("deplayer=info"),
        1 => EnvFilter::new("deplayer=debug"),
        _ => EnvFilter::new("deplayer=trace"),
    };

    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
    }

    match cli.command {
        Commands::Build(args) => deplayer::cli::commands::build(args).await,
        Commands::Inspect(args) => deplayer::cli::commands::inspect(args).await,
    }
}
