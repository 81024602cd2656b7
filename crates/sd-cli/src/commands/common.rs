//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use sd_core::Config;
use sd_deploy::{DeployOptions, Deployer};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors run and open database files are closed cleanly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) u8);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: main.rs turns this into the process status without printing
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Load and validate the config file named by `--config`, or the one found
/// in the current directory.
pub(crate) fn load_config(global: &GlobalArgs) -> Result<Config> {
    match &global.config {
        Some(path) => {
            let path = Path::new(path);
            Config::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => {
            let cwd = std::env::current_dir().context("Failed to read current directory")?;
            Config::load_from_dir(&cwd)
                .with_context(|| format!("Failed to load config from {}", cwd.display()))
        }
    }
}

/// Build a deployer from the global flags.
pub(crate) fn build_deployer(global: &GlobalArgs) -> Result<Deployer> {
    let config = load_config(global)?;
    let options = DeployOptions {
        dry_run: global.dry_run,
        verbose: global.verbose,
    };
    Ok(Deployer::new(config, options))
}

/// Parse a comma-separated `--databases` value.
///
/// Blank entries are ignored; `None` (or only blanks) means every database.
pub(crate) fn parse_databases(arg: &Option<String>) -> Option<BTreeSet<String>> {
    let names: BTreeSet<String> = arg
        .as_deref()?
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if names.is_empty() {
        None
    } else {
        Some(names)
    }
}

/// Calculate column widths for a table given headers and row data.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

/// Print a left-aligned table with a dashed separator under the header.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);
    let format_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", format_row(headers.to_vec()));
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));
    for row in rows {
        println!("{}", format_row(row.iter().map(String::as_str).collect()));
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
