//! Status command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{build_deployer, parse_databases, print_table};

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let mut deployer = build_deployer(global)?;
    let databases = parse_databases(&args.databases);
    let states = deployer.status(databases.as_ref())?;

    if args.output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&states)?);
        return Ok(());
    }

    if states.is_empty() {
        println!("Manifest is empty");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = states
        .iter()
        .map(|s| {
            vec![
                s.database.clone(),
                s.name.clone(),
                if s.applied { "applied" } else { "pending" }.to_string(),
                s.applied_at.clone().unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["DATABASE", "SCRIPT", "STATE", "APPLIED AT"], &rows);

    let pending = states.iter().filter(|s| !s.applied).count();
    println!();
    println!("{} script(s), {} pending", states.len(), pending);
    Ok(())
}
