//! Transactional batch executor.
//!
//! Applies the statements of one script inside a single transaction. A
//! failure never escapes as an error: it rolls the transaction back and is
//! reported through [`BatchOutcome`].

use duckdb::Connection;
use sd_core::script::is_blank_or_comment;

/// Result of executing one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Whether the whole batch committed
    pub success: bool,
    /// 0-based index into the input statements of the statement that failed.
    /// `None` on success, or when BEGIN/COMMIT itself failed.
    pub failed_statement_index: Option<usize>,
    /// Driver error message on failure
    pub error: Option<String>,
    /// Statements actually sent to the database
    pub executed: usize,
}

impl BatchOutcome {
    fn committed(executed: usize) -> Self {
        Self {
            success: true,
            failed_statement_index: None,
            error: None,
            executed,
        }
    }

    fn failed(index: Option<usize>, error: String) -> Self {
        Self {
            success: false,
            failed_statement_index: index,
            error: Some(error),
            executed: 0,
        }
    }
}

/// Runs statement batches with all-or-nothing semantics
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionalExecutor {
    /// Log statements instead of executing them
    pub dry_run: bool,
    /// Log every statement before it runs
    pub verbose: bool,
}

impl TransactionalExecutor {
    /// Create an executor
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self { dry_run, verbose }
    }

    /// Execute `statements` in order inside one transaction on `conn`.
    ///
    /// Blank and comment-only statements are skipped.
    pub fn execute(&self, conn: &Connection, statements: &[String]) -> BatchOutcome {
        if let Err(e) = conn.execute_batch("BEGIN TRANSACTION") {
            log::error!("Failed to begin transaction: {e}");
            return BatchOutcome::failed(None, format!("BEGIN failed: {e}"));
        }

        let total = statements.len();
        let mut executed = 0;

        for (i, sql) in statements.iter().enumerate() {
            if is_blank_or_comment(sql) {
                continue;
            }
            let sql = sql.trim();

            if self.dry_run {
                log::info!("Pretending to execute statement {} of {total}: {sql}", i + 1);
                continue;
            }

            if self.verbose {
                log::info!("Executing statement {} of {total}:\n\n{sql}\n", i + 1);
            } else {
                log::debug!("Executing statement {} of {total}", i + 1);
            }

            if let Err(e) = conn.execute_batch(sql) {
                log::error!("Failed on statement {} of {total}: {e}\n\n{sql}\n", i + 1);
                rollback(conn);
                return BatchOutcome::failed(Some(i), e.to_string());
            }
            executed += 1;
        }

        if let Err(e) = conn.execute_batch("COMMIT") {
            log::error!("Failed to commit transaction: {e}");
            rollback(conn);
            return BatchOutcome::failed(None, format!("COMMIT failed: {e}"));
        }

        BatchOutcome::committed(executed)
    }
}

fn rollback(conn: &Connection) {
    if let Err(e) = conn.execute_batch("ROLLBACK") {
        log::warn!("Rollback failed: {e}");
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
