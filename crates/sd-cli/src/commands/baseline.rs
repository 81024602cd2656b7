//! Baseline command implementation

use anyhow::{Context, Result};
use sd_deploy::ScriptStatus;

use crate::cli::{BaselineArgs, GlobalArgs};
use crate::commands::common::{build_deployer, ExitCode};

/// Execute the baseline command
pub(crate) fn execute(args: &BaselineArgs, global: &GlobalArgs) -> Result<()> {
    let mut deployer = build_deployer(global)?;
    let report = deployer
        .create_from_baseline(&args.database)
        .with_context(|| format!("Baseline of {} failed", args.database))?;

    println!(
        "Baseline of {}: {} file(s) executed, {} failed",
        args.database,
        report.count(ScriptStatus::Applied) + report.count(ScriptStatus::DryRun),
        report.count(ScriptStatus::Failed)
    );

    if report.has_failures() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}
