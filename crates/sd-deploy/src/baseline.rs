//! Baseline loading: one-time creation of a database's initial schema.
//!
//! Baseline files live in `<schemas_path>/<database>/baseline/` and run in
//! lexical path order, each in its own transaction. Afterwards the database's
//! tracker table exists, so incremental deploys can start from there.

use crate::deployer::{open_tracker, Deployer};
use crate::error::{DeployError, DeployResult};
use crate::report::{DeploymentReport, ScriptStatus};
use sd_core::script::SCRIPT_EXTENSIONS;
use sd_core::{CoreError, CoreResult, Script};
use std::path::{Path, PathBuf};

/// Baseline script files for `database`, sorted by path.
///
/// Fails if the baseline directory is missing or unreadable.
pub fn discover_baseline_scripts(schemas_path: &Path, database: &str) -> CoreResult<Vec<PathBuf>> {
    let dir = schemas_path.join(database).join("baseline");
    let io_err = |e: std::io::Error| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    };

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(&dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_script = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SCRIPT_EXTENSIONS.contains(&e));
        if path.is_file() && is_script {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

impl Deployer {
    /// Create `database` from its baseline scripts, then bootstrap its tracker.
    /// A dry run only logs, and leaves the tracker uncreated.
    ///
    /// Stops at the first failing file with [`DeployError::BaselineFailed`]
    /// unless `baseline.continue_on_error` is set, in which case failures are
    /// logged and reported and the remaining files still run.
    pub fn create_from_baseline(&mut self, database: &str) -> DeployResult<DeploymentReport> {
        log::info!("Creating {database} database from baseline...");

        let schemas_path = self.config.schemas_path_absolute();
        let paths = discover_baseline_scripts(&schemas_path, database)?;
        let executor = self.executor();
        let dry_run = self.options.dry_run;
        let continue_on_error = self.config.baseline.continue_on_error;
        let mut report = DeploymentReport::new(dry_run);

        let engine = self.pool.engine(database)?;
        let conn = self.pool.connection(database)?;

        for path in &paths {
            let Some(script) = Script::from_file(database, path) else {
                continue;
            };
            log::info!("Executing {}", path.display());
            let statements = script.load_statements()?;

            let outcome = executor.execute(conn, &statements);
            if outcome.success {
                let status = if dry_run {
                    ScriptStatus::DryRun
                } else {
                    ScriptStatus::Applied
                };
                report.record(database, &script.name, status);
                continue;
            }

            report.record_failure(database, &script.name, &outcome);
            if !continue_on_error {
                return Err(DeployError::BaselineFailed {
                    path: path.display().to_string(),
                    statement: outcome.failed_statement_index,
                    message: outcome.error.unwrap_or_default(),
                });
            }
            log::error!(
                "Baseline file {} failed; continuing with the remaining files",
                path.display()
            );
        }

        if dry_run {
            log::info!("Would create the {engine} tracker for {database}");
        } else {
            log::debug!("Bootstrapping {engine} tracker for {database}");
            open_tracker(&mut self.pool, &self.config, database)?;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let baseline = dir.path().join("orders").join("baseline");
        std::fs::create_dir_all(baseline.join("nested.sql")).unwrap();
        for name in ["z.proc", "a.sql", "m.sql", "notes.md", "b.sql.bak"] {
            std::fs::write(baseline.join(name), "SELECT 1").unwrap();
        }

        let found: Vec<String> = discover_baseline_scripts(dir.path(), "orders")
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(found, vec!["a.sql", "m.sql", "z.proc"]);
    }

    #[test]
    fn test_discover_missing_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover_baseline_scripts(dir.path(), "orders").unwrap_err();
        assert!(matches!(err, CoreError::IoWithPath { .. }));
    }
}
