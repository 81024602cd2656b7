//! Database engine identifiers.
//!
//! Engines form a closed set: adding one means adding a variant here, a
//! connection opener in [`crate::pool`], and a tracker in [`crate::tracker`].

use crate::error::DbError;
use std::fmt;
use std::str::FromStr;

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    /// DuckDB (file-based or in-memory)
    DuckDb,
}

impl EngineKind {
    /// Identifier as written in the config
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::DuckDb => "duckdb",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "duckdb" => Ok(EngineKind::DuckDb),
            _ => Err(DbError::UnsupportedEngine(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duckdb() {
        assert_eq!("duckdb".parse::<EngineKind>().unwrap(), EngineKind::DuckDb);
        assert_eq!(" DuckDB ".parse::<EngineKind>().unwrap(), EngineKind::DuckDb);
    }

    #[test]
    fn test_unknown_engine_names_identifier() {
        let err = "postgresql".parse::<EngineKind>().unwrap_err();
        assert!(matches!(err, DbError::UnsupportedEngine(ref id) if id == "postgresql"));
        assert!(err.to_string().contains("postgresql"));
    }
}
