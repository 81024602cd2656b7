//! Deployment tracker: the persistent record of applied scripts.
//!
//! Every target database carries a tracker table with one row per applied
//! script. A row is written only after the script's transaction committed, so
//! the table is the single source of truth for "has this script run here".

use crate::engine::EngineKind;
use crate::error::{DbError, DbResult};
use duckdb::Connection;
use sd_core::sql_utils::{quote_ident, quote_qualified, split_qualified_name};
use std::collections::BTreeSet;

/// A full tracker record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedScript {
    /// Script identifier
    pub name: String,
    /// Body or path recorded when the script was registered without running
    pub body: Option<String>,
    /// When the record was written, as rendered by the database
    pub applied_at: String,
}

/// Tracker over one database, dispatched on the database engine
pub enum Tracker<'c> {
    /// Tracker table in a DuckDB database
    DuckDb(DuckDbTracker<'c>),
}

impl<'c> Tracker<'c> {
    /// Open the tracker for `engine` on `conn`, creating its table if absent.
    pub fn open(engine: EngineKind, conn: &'c Connection, table: &str) -> DbResult<Self> {
        let tracker = Self::attach(engine, conn, table);
        tracker.ensure_created()?;
        Ok(tracker)
    }

    /// Open the tracker without creating anything.
    ///
    /// Returns `None` when the tracker table does not exist yet.
    pub fn open_existing(
        engine: EngineKind,
        conn: &'c Connection,
        table: &str,
    ) -> DbResult<Option<Self>> {
        let tracker = Self::attach(engine, conn, table);
        Ok(tracker.exists()?.then_some(tracker))
    }

    fn attach(engine: EngineKind, conn: &'c Connection, table: &str) -> Self {
        match engine {
            EngineKind::DuckDb => Tracker::DuckDb(DuckDbTracker::new(conn, table)),
        }
    }

    /// Whether the tracker table exists
    pub fn exists(&self) -> DbResult<bool> {
        match self {
            Tracker::DuckDb(t) => t.exists(),
        }
    }

    /// Create the tracker table if it does not exist yet
    pub fn ensure_created(&self) -> DbResult<()> {
        match self {
            Tracker::DuckDb(t) => t.ensure_created(),
        }
    }

    /// Names of every script recorded as applied
    pub fn get_executed_scripts(&self) -> DbResult<BTreeSet<String>> {
        match self {
            Tracker::DuckDb(t) => t.get_executed_scripts(),
        }
    }

    /// Record `name` as applied. Call only after its transaction committed.
    pub fn mark_script_as_run(&self, name: &str) -> DbResult<()> {
        match self {
            Tracker::DuckDb(t) => t.mark_script_as_run(name),
        }
    }

    /// Remove the record for `name`; fails with [`DbError::ScriptNotTracked`]
    /// when there is none.
    pub fn unmark_script_as_run(&self, name: &str) -> DbResult<()> {
        match self {
            Tracker::DuckDb(t) => t.unmark_script_as_run(name),
        }
    }

    /// Record a script applied out-of-band, without executing it
    pub fn add_script_to_tracker(&self, name: &str, body: &str) -> DbResult<()> {
        match self {
            Tracker::DuckDb(t) => t.add_script_to_tracker(name, body),
        }
    }

    /// Whether `name` has a tracker record
    pub fn verify_script_exists(&self, name: &str) -> DbResult<bool> {
        match self {
            Tracker::DuckDb(t) => t.verify_script_exists(name),
        }
    }

    /// All records, oldest first
    pub fn tracked_scripts(&self) -> DbResult<Vec<TrackedScript>> {
        match self {
            Tracker::DuckDb(t) => t.tracked_scripts(),
        }
    }
}

/// Tracker table stored in a DuckDB database
pub struct DuckDbTracker<'c> {
    conn: &'c Connection,
    /// Unquoted, possibly schema-qualified table name
    table: String,
    /// Quoted form used in SQL text
    quoted: String,
}

impl<'c> DuckDbTracker<'c> {
    /// Bind to `conn`. Nothing is created until [`Tracker::ensure_created`].
    pub fn new(conn: &'c Connection, table: &str) -> Self {
        Self {
            conn,
            table: table.to_string(),
            quoted: quote_qualified(table),
        }
    }

    fn exists(&self) -> DbResult<bool> {
        let (schema, table) = split_qualified_name(&self.table, "main");
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = ? AND table_name = ?",
                duckdb::params![schema, table],
                |row| row.get(0),
            )
            .map_err(|e| DbError::TrackerError(format!("existence check failed: {e}")))?;
        Ok(count > 0)
    }

    fn ensure_created(&self) -> DbResult<()> {
        if self.exists()? {
            return Ok(());
        }
        log::info!("Creating deployment tracker table {}", self.table);

        let (schema, _) = split_qualified_name(&self.table, "main");
        if self.table.contains('.') {
            self.conn
                .execute_batch(&format!(
                    "CREATE SCHEMA IF NOT EXISTS {}",
                    quote_ident(schema)
                ))
                .map_err(|e| DbError::TrackerError(format!("schema creation failed: {e}")))?;
        }

        // IF NOT EXISTS covers a concurrent creator winning the race
        self.conn
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                     script_name VARCHAR PRIMARY KEY,
                     script_body VARCHAR,
                     applied_at  TIMESTAMP NOT NULL
                 )",
                self.quoted
            ))
            .map_err(|e| DbError::TrackerError(format!("table creation failed: {e}")))
    }

    fn get_executed_scripts(&self) -> DbResult<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT script_name FROM {}", self.quoted))
            .map_err(|e| DbError::TrackerError(format!("read failed: {e}")))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| DbError::TrackerError(format!("read failed: {e}")))?
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(|e| DbError::TrackerError(format!("row error: {e}")))?;
        Ok(names)
    }

    fn mark_script_as_run(&self, name: &str) -> DbResult<()> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (script_name, applied_at) VALUES (?, CAST(? AS TIMESTAMP)) \
                     ON CONFLICT (script_name) DO UPDATE SET applied_at = excluded.applied_at",
                    self.quoted
                ),
                duckdb::params![name, now()],
            )
            .map_err(|e| DbError::ExecutionError(format!("failed to mark '{name}': {e}")))?;
        Ok(())
    }

    fn unmark_script_as_run(&self, name: &str) -> DbResult<()> {
        let deleted = self
            .conn
            .execute(
                &format!("DELETE FROM {} WHERE script_name = ?", self.quoted),
                duckdb::params![name],
            )
            .map_err(|e| DbError::ExecutionError(format!("failed to unmark '{name}': {e}")))?;
        if deleted == 0 {
            return Err(DbError::ScriptNotTracked(name.to_string()));
        }
        Ok(())
    }

    fn add_script_to_tracker(&self, name: &str, body: &str) -> DbResult<()> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (script_name, script_body, applied_at) \
                     VALUES (?, ?, CAST(? AS TIMESTAMP)) \
                     ON CONFLICT (script_name) DO UPDATE SET script_body = excluded.script_body",
                    self.quoted
                ),
                duckdb::params![name, body, now()],
            )
            .map_err(|e| DbError::ExecutionError(format!("failed to add '{name}': {e}")))?;
        Ok(())
    }

    fn verify_script_exists(&self, name: &str) -> DbResult<bool> {
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE script_name = ?", self.quoted),
                duckdb::params![name],
                |row| row.get(0),
            )
            .map_err(|e| DbError::TrackerError(format!("lookup of '{name}' failed: {e}")))?;
        Ok(count > 0)
    }

    fn tracked_scripts(&self) -> DbResult<Vec<TrackedScript>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT script_name, script_body, CAST(applied_at AS VARCHAR) \
                 FROM {} ORDER BY applied_at, script_name",
                self.quoted
            ))
            .map_err(|e| DbError::TrackerError(format!("read failed: {e}")))?;
        let records = stmt
            .query_map([], |row| {
                Ok(TrackedScript {
                    name: row.get(0)?,
                    body: row.get(1)?,
                    applied_at: row.get(2)?,
                })
            })
            .map_err(|e| DbError::TrackerError(format!("read failed: {e}")))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::TrackerError(format!("row error: {e}")))?;
        Ok(records)
    }
}

/// Current UTC time in a format DuckDB casts to TIMESTAMP
fn now() -> String {
    chrono::Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
#[path = "tracker_test.rs"]
mod tests;
