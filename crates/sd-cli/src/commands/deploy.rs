//! Deploy command implementation

use anyhow::{Context, Result};
use sd_deploy::{DeploymentReport, ScriptStatus};

use crate::cli::{DeployArgs, GlobalArgs, OutputFormat};
use crate::commands::common::{build_deployer, parse_databases, print_table, ExitCode};

/// Execute the deploy command
pub(crate) fn execute(args: &DeployArgs, global: &GlobalArgs) -> Result<()> {
    let mut deployer = build_deployer(global)?;
    let databases = parse_databases(&args.databases);

    let report = deployer
        .execute_updates(databases.as_ref(), !args.no_track)
        .context("Deployment aborted")?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_report(&report),
    }

    if report.has_failures() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn print_report(report: &DeploymentReport) {
    if report.scripts.is_empty() {
        println!("No scripts to deploy");
        return;
    }

    let rows: Vec<Vec<String>> = report
        .scripts
        .iter()
        .map(|s| {
            let detail = match (&s.failed_statement, &s.error) {
                (Some(i), Some(e)) => format!("statement {}: {}", i + 1, e),
                (None, Some(e)) => e.clone(),
                _ => String::new(),
            };
            vec![
                s.database.clone(),
                s.name.clone(),
                s.status.to_string(),
                detail,
            ]
        })
        .collect();
    print_table(&["DATABASE", "SCRIPT", "STATUS", "DETAIL"], &rows);

    println!();
    println!(
        "Run {}: {} applied, {} skipped, {} failed{}",
        report.run_id,
        report.count(ScriptStatus::Applied),
        report.count(ScriptStatus::Skipped),
        report.count(ScriptStatus::Failed),
        if report.dry_run { " (dry run)" } else { "" }
    );
}
