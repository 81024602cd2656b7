//! Per-database connection pool.
//!
//! One connection per configured database name, opened on first use and
//! reused for every later operation against that database. The pool is owned
//! by a single deployer and is not meant to be shared across threads.

use crate::engine::EngineKind;
use crate::error::{DbError, DbResult};
use duckdb::Connection;
use sd_core::{CoreError, DatabaseConfig};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Lazily-opened connections keyed by database name
pub struct ConnectionPool {
    databases: BTreeMap<String, DatabaseConfig>,
    connections: HashMap<String, Connection>,
}

impl ConnectionPool {
    /// Create a pool over the given database configs. Nothing is opened yet.
    pub fn new(databases: BTreeMap<String, DatabaseConfig>) -> Self {
        Self {
            databases,
            connections: HashMap::new(),
        }
    }

    /// Engine configured for `name`
    pub fn engine(&self, name: &str) -> DbResult<EngineKind> {
        self.config(name)?.db_type.parse()
    }

    /// Connection for `name`, opening it if this is the first request
    pub fn connection(&mut self, name: &str) -> DbResult<&Connection> {
        if self.connections.contains_key(name) {
            log::debug!("Using existing connection to {name}");
        } else {
            let conn = self.open(name)?;
            self.connections.insert(name.to_string(), conn);
        }

        self.connections
            .get(name)
            .ok_or_else(|| DbError::Internal(format!("connection to '{name}' vanished from pool")))
    }

    fn config(&self, name: &str) -> DbResult<&DatabaseConfig> {
        self.databases.get(name).ok_or_else(|| {
            DbError::Core(CoreError::UnknownDatabase {
                name: name.to_string(),
            })
        })
    }

    fn open(&self, name: &str) -> DbResult<Connection> {
        let config = self.config(name)?;
        let engine: EngineKind = config.db_type.parse()?;
        log::info!("Opening {engine} connection to {name}");

        match engine {
            EngineKind::DuckDb => {
                if config.is_in_memory() {
                    Connection::open_in_memory()
                        .map_err(|e| DbError::ConnectionError(format!("{name}: {e}")))
                } else {
                    Connection::open(Path::new(&config.path)).map_err(|e| {
                        DbError::ConnectionError(format!("{name} ({}): {e}", config.path))
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(entries: &[(&str, &str, &str)]) -> ConnectionPool {
        ConnectionPool::new(
            entries
                .iter()
                .map(|(name, ty, path)| (name.to_string(), DatabaseConfig::new(*ty, *path)))
                .collect(),
        )
    }

    #[test]
    fn test_connection_is_reused() {
        let mut pool = pool(&[("orders", "duckdb", ":memory:")]);
        pool.connection("orders")
            .unwrap()
            .execute_batch("CREATE TABLE t (id INT)")
            .unwrap();

        // Same in-memory database on the second request
        let count: i64 = pool
            .connection("orders")
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 't'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unknown_database() {
        let mut pool = pool(&[("orders", "duckdb", ":memory:")]);
        let err = pool.connection("billing").unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::UnknownDatabase { ref name }) if name == "billing"
        ));
        assert!(err.to_string().contains("[C003]"));
    }

    #[test]
    fn test_unsupported_engine() {
        let mut pool = pool(&[("legacy", "oracle", "ignored")]);
        assert!(matches!(
            pool.engine("legacy").unwrap_err(),
            DbError::UnsupportedEngine(ref id) if id == "oracle"
        ));
        assert!(matches!(
            pool.connection("legacy").unwrap_err(),
            DbError::UnsupportedEngine(_)
        ));
    }

    #[test]
    fn test_file_database_persists_across_pools() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.duckdb");
        let path_str = path.display().to_string();
        {
            let mut first = pool(&[("orders", "duckdb", path_str.as_str())]);
            first
                .connection("orders")
                .unwrap()
                .execute_batch("CREATE TABLE t (id INT); INSERT INTO t VALUES (7);")
                .unwrap();
        }

        let mut second = pool(&[("orders", "duckdb", path_str.as_str())]);
        let id: i32 = second
            .connection("orders")
            .unwrap()
            .query_row("SELECT id FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(id, 7);
    }
}
