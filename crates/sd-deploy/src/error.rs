//! Error types for sd-deploy

use sd_core::CoreError;
use sd_db::DbError;
use thiserror::Error;

/// Deployment errors.
///
/// Per-script execution failures are not errors: they are recorded in the
/// [`crate::DeploymentReport`] and the run continues.
#[derive(Error, Debug)]
pub enum DeployError {
    /// Unmark requested for a script the tracker has no record of (P001)
    #[error("[P001] Script {script} not found to unmark")]
    ScriptNotTracked { script: String },

    /// A baseline file failed to execute (P002)
    #[error("[P002] Baseline file {path} failed{}: {message}", statement_suffix(.statement))]
    BaselineFailed {
        path: String,
        statement: Option<usize>,
        message: String,
    },

    /// Configuration, manifest, or file error
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Database, engine, or tracker error
    #[error(transparent)]
    Db(#[from] DbError),
}

fn statement_suffix(statement: &Option<usize>) -> String {
    statement
        .map(|i| format!(" at statement {}", i + 1))
        .unwrap_or_default()
}

/// Result type alias for [`DeployError`]
pub type DeployResult<T> = Result<T, DeployError>;
