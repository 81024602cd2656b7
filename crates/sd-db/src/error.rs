//! Error types for sd-db

use sd_core::CoreError;
use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Unknown engine identifier (D003)
    #[error("[D003] Unsupported database engine: {0}")]
    UnsupportedEngine(String),

    /// Tracker table could not be created or read (D004)
    #[error("[D004] Deployment tracker error: {0}")]
    TrackerError(String),

    /// Script has no tracker record (D005)
    #[error("[D005] Script '{0}' is not recorded in the deployment tracker")]
    ScriptNotTracked(String),

    /// Internal error (D006)
    #[error("[D006] Internal database error: {0}")]
    Internal(String),

    /// Configuration lookup failed (D007)
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;
