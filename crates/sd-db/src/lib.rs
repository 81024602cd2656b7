//! sd-db - Database layer for schemadeploy
//!
//! This crate owns everything that talks to a target database: engine
//! identifiers, the per-database connection pool, the transactional batch
//! executor, and the deployment tracker backed by a table in each database.

pub mod engine;
pub mod error;
pub mod executor;
pub mod pool;
pub mod tracker;

pub use engine::EngineKind;
pub use error::{DbError, DbResult};
pub use executor::{BatchOutcome, TransactionalExecutor};
pub use pool::ConnectionPool;
pub use tracker::{DuckDbTracker, TrackedScript, Tracker};
