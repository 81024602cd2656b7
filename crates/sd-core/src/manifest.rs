//! Deployment manifest: the ordered list of scripts that should be deployed.
//!
//! A manifest is owned by an external change-control process. Each row names
//! the target database, the script identifier, and either the script path or
//! an inline SQL body. Row order is significant: it is the execution order of
//! scripts within one database.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One manifest row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestRow {
    /// Target database name; rows with an empty value cannot be routed
    #[serde(default)]
    pub db: String,

    /// Script identifier, unique within its database
    pub name: String,

    /// Script path (relative to `<schemas_path>/<db>/`) or inline SQL
    pub command: String,
}

impl ManifestRow {
    /// Create a manifest row
    pub fn new(db: impl Into<String>, name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            name: name.into(),
            command: command.into(),
        }
    }
}

/// Anything that can produce the ordered manifest rows
pub trait ManifestSource {
    /// Return all manifest rows in deployment order
    fn rows(&self) -> CoreResult<Vec<ManifestRow>>;
}

impl ManifestSource for Vec<ManifestRow> {
    fn rows(&self) -> CoreResult<Vec<ManifestRow>> {
        Ok(self.clone())
    }
}

/// Manifest stored as a YAML sequence of `{db, name, command}` mappings
#[derive(Debug, Clone)]
pub struct YamlManifest {
    path: PathBuf,
}

impl YamlManifest {
    /// Point at a manifest file; the file is read on every [`ManifestSource::rows`] call
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ManifestSource for YamlManifest {
    fn rows(&self) -> CoreResult<Vec<ManifestRow>> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| CoreError::IoWithPath {
                path: self.path.display().to_string(),
                source: e,
            })?;

        // An empty file is an empty manifest
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<ManifestRow> =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ManifestParseError {
                path: self.path.display().to_string(),
                details: e.to_string(),
            })?;
        log::debug!("Read {} manifest row(s) from {}", rows.len(), self.path.display());
        Ok(rows)
    }
}

#[cfg(test)]
#[path = "manifest_test.rs"]
mod tests;
