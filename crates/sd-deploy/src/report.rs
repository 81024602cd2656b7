//! Outcome record of one deployment run.

use chrono::{DateTime, Utc};
use sd_db::BatchOutcome;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// What happened to one script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStatus {
    /// Executed and committed
    Applied,
    /// Already recorded in the tracker, not executed
    Skipped,
    /// Execution failed and was rolled back, or the script could not be read
    Failed,
    /// Dry run: statements were logged, nothing was executed or tracked
    DryRun,
}

impl fmt::Display for ScriptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptStatus::Applied => write!(f, "applied"),
            ScriptStatus::Skipped => write!(f, "skipped"),
            ScriptStatus::Failed => write!(f, "failed"),
            ScriptStatus::DryRun => write!(f, "dry_run"),
        }
    }
}

/// Outcome of one script in a run
#[derive(Debug, Clone, Serialize)]
pub struct ScriptOutcome {
    /// Target database
    pub database: String,
    /// Script name
    pub name: String,
    /// Result
    pub status: ScriptStatus,
    /// 0-based index of the failing statement
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_statement: Option<usize>,
    /// Error message for failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Everything one deployment run did, in execution order
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    /// Unique identifier for this run
    pub run_id: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Per-script outcomes
    pub scripts: Vec<ScriptOutcome>,
}

impl DeploymentReport {
    /// Start an empty report
    pub fn new(dry_run: bool) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            dry_run,
            scripts: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, database: &str, name: &str, status: ScriptStatus) {
        self.scripts.push(ScriptOutcome {
            database: database.to_string(),
            name: name.to_string(),
            status,
            failed_statement: None,
            error: None,
        });
    }

    pub(crate) fn record_failure(&mut self, database: &str, name: &str, outcome: &BatchOutcome) {
        self.scripts.push(ScriptOutcome {
            database: database.to_string(),
            name: name.to_string(),
            status: ScriptStatus::Failed,
            failed_statement: outcome.failed_statement_index,
            error: outcome.error.clone(),
        });
    }

    /// Names with the given status, in execution order
    pub fn names_with(&self, status: ScriptStatus) -> Vec<&str> {
        self.scripts
            .iter()
            .filter(|s| s.status == status)
            .map(|s| s.name.as_str())
            .collect()
    }

    /// Number of scripts with the given status
    pub fn count(&self, status: ScriptStatus) -> usize {
        self.scripts.iter().filter(|s| s.status == status).count()
    }

    /// True if any script failed
    pub fn has_failures(&self) -> bool {
        self.count(ScriptStatus::Failed) > 0
    }
}
