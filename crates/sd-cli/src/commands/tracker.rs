//! Manual tracker maintenance: mark, unmark, add

use anyhow::Result;
use sd_deploy::{CommandOutcome, DeployResult, Deployer};

use crate::cli::{GlobalArgs, ScriptArgs};
use crate::commands::common::{build_deployer, ExitCode};

/// Execute the mark command
pub(crate) fn mark(args: &ScriptArgs, global: &GlobalArgs) -> Result<()> {
    run(args, global, Deployer::mark_script_as_run)
}

/// Execute the unmark command
pub(crate) fn unmark(args: &ScriptArgs, global: &GlobalArgs) -> Result<()> {
    run(args, global, Deployer::unmark_script_as_run)
}

/// Execute the add command
pub(crate) fn add(args: &ScriptArgs, global: &GlobalArgs) -> Result<()> {
    run(args, global, Deployer::add_to_tracker)
}

fn run(
    args: &ScriptArgs,
    global: &GlobalArgs,
    command: fn(&mut Deployer, &str) -> DeployResult<CommandOutcome>,
) -> Result<()> {
    let mut deployer = build_deployer(global)?;
    match command(&mut deployer, &args.script)? {
        CommandOutcome::Applied | CommandOutcome::DryRun => Ok(()),
        // Routing failure was already logged
        CommandOutcome::Skipped => Err(ExitCode(2).into()),
    }
}
