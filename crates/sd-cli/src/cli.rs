//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Schemadeploy - baseline and incremental schema deployment
#[derive(Parser, Debug)]
#[command(name = "sd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the deployment config file
    /// (default: schemadeploy.yml or schemadeploy.yaml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log statements instead of executing them; tracker records are not changed
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log every statement and enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every manifest script not yet applied to its database
    Deploy(DeployArgs),

    /// Create a database from its baseline scripts
    Baseline(BaselineArgs),

    /// Record a script as applied without running it
    Mark(ScriptArgs),

    /// Remove a script's tracker record so the next deploy reruns it
    Unmark(ScriptArgs),

    /// Register a script in the tracker, storing its path
    Add(ScriptArgs),

    /// Show applied/pending state of every manifest script
    Status(StatusArgs),
}

/// Arguments for the deploy command
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Databases to deploy (comma-separated, default: all in the manifest)
    #[arg(short, long)]
    pub databases: Option<String>,

    /// Run scripts without reading or writing the deployment trackers
    #[arg(long)]
    pub no_track: bool,

    /// Output format for the run summary
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the baseline command
#[derive(Args, Debug)]
pub struct BaselineArgs {
    /// Database to create
    pub database: String,
}

/// Arguments for the mark, unmark and add commands
#[derive(Args, Debug)]
pub struct ScriptArgs {
    /// Script reference as `<database>/<script>`, e.g. `orders/005_hotfix.sql`
    pub script: String,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Databases to show (comma-separated, default: all in the manifest)
    #[arg(short, long)]
    pub databases: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Output formats for reporting commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
