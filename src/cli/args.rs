//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// deplayer - cached dependency layer build step
///
/// Resolves a dependency from the buildpack catalog, installs it into a
/// persisted layer, and skips the install when the layer already holds
/// the same artifact.
#[derive(Parser, Debug)]
#[command(name = "deplayer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve, install and record a dependency layer
    Build(BuildArgs),

    /// Show the persisted state of a layer
    Inspect(InspectArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Dependency id to install (must appear in the build plan)
    #[arg(short, long, default_value = "pnpm")]
    pub dependency: String,

    /// Layer name (defaults to the dependency id)
    #[arg(long)]
    pub layer_name: Option<String>,

    /// Layers directory
    #[arg(long, env = "CNB_LAYERS_DIR")]
    pub layers: PathBuf,

    /// Build plan TOML file
    #[arg(long, env = "CNB_BP_PLAN_PATH")]
    pub plan: PathBuf,

    /// Buildpack directory containing buildpack.toml
    #[arg(long, env = "CNB_BUILDPACK_DIR", default_value = ".")]
    pub buildpack: PathBuf,

    /// Platform directory
    #[arg(long, env = "CNB_PLATFORM_DIR", default_value = "/platform")]
    pub platform: PathBuf,

    /// Stack id of the build image
    #[arg(long, env = "CNB_STACK_ID", default_value = "*")]
    pub stack: String,

    /// Preferred version sources, highest priority first (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub version_source_priority: Vec<String>,
}

/// Arguments for the inspect command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Layer name
    #[arg(default_value = "pnpm")]
    pub layer_name: String,

    /// Layers directory
    #[arg(long, env = "CNB_LAYERS_DIR")]
    pub layers: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Log line format
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
