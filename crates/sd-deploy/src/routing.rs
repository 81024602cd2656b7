//! Routing of operator script references to a target database.
//!
//! Operators name scripts as `<database>/<identifier>[.ext]`. The first path
//! segment picks the database; the tracked name is the file stem of the rest.

use std::path::Path;

/// A script reference resolved to its database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRef {
    /// Target database (first path segment)
    pub database: String,
    /// Tracked script name (file stem of the remainder)
    pub name: String,
    /// The reference as given, trimmed
    pub raw: String,
}

impl ScriptRef {
    /// Parse `"<database>/<rest>"`; `None` when there is no database segment.
    pub fn parse(script: &str) -> Option<Self> {
        let raw = script.trim();
        let (database, rest) = raw.split_once('/')?;
        let database = database.trim();
        if database.is_empty() {
            return None;
        }

        let name = Path::new(rest).file_stem()?.to_str()?;
        if name.is_empty() {
            return None;
        }

        Some(Self {
            database: database.to_string(),
            name: name.to_string(),
            raw: raw.to_string(),
        })
    }
}
