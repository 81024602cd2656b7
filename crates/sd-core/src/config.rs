//! Configuration types and parsing for schemadeploy.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default name of the per-database tracking table
pub const DEFAULT_TRACKER_TABLE: &str = "schema_deployment_tracker";

/// Config file names searched in a project directory, in priority order
pub const CONFIG_FILE_NAMES: &[&str] = &["schemadeploy.yml", "schemadeploy.yaml"];

/// Main deployment configuration from schemadeploy.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root directory holding `<database>/baseline` and the deploy scripts
    #[serde(default = "default_schemas_path")]
    pub schemas_path: String,

    /// Path to the YAML manifest listing the scripts to deploy
    #[serde(default = "default_manifest_path")]
    pub manifest: String,

    /// Name of the tracking table created in every target database
    #[serde(default = "default_tracker_table")]
    pub tracker_table: String,

    /// Baseline loading behaviour
    #[serde(default)]
    pub baseline: BaselineConfig,

    /// Target databases keyed by the name used in the manifest
    #[serde(default)]
    pub databases: BTreeMap<String, DatabaseConfig>,

    /// Directory the config was loaded from; relative paths resolve against it
    #[serde(skip)]
    pub root: PathBuf,
}

/// Connection settings for one target database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Engine identifier (e.g. `duckdb`)
    #[serde(rename = "type", default = "default_db_type")]
    pub db_type: String,

    /// Database path (file-based, or `:memory:`)
    pub path: String,
}

impl DatabaseConfig {
    /// Create a config for the given engine identifier and path
    pub fn new(db_type: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            db_type: db_type.into(),
            path: path.into(),
        }
    }

    /// Whether this database lives only in memory
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

/// Baseline loader settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BaselineConfig {
    /// Keep executing remaining baseline files after one fails
    #[serde(default)]
    pub continue_on_error: bool,
}

fn default_schemas_path() -> String {
    "schemas".to_string()
}

fn default_manifest_path() -> String {
    "manifest.yml".to_string()
}

fn default_tracker_table() -> String {
    DEFAULT_TRACKER_TABLE.to_string()
}

fn default_db_type() -> String {
    "duckdb".to_string()
}

impl Config {
    /// Build a config programmatically, rooted at `root`
    pub fn new(root: impl Into<PathBuf>, databases: BTreeMap<String, DatabaseConfig>) -> Self {
        Self {
            schemas_path: default_schemas_path(),
            manifest: default_manifest_path(),
            tracker_table: default_tracker_table(),
            baseline: BaselineConfig::default(),
            databases,
            root: root.into(),
        }
    }

    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.validate()?;
        log::debug!(
            "Loaded config {} ({} database(s))",
            path.display(),
            config.databases.len()
        );
        Ok(config)
    }

    /// Load the first of [`CONFIG_FILE_NAMES`] present in `dir`.
    ///
    /// The not-found error names every candidate that was tried.
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let candidates: Vec<PathBuf> = CONFIG_FILE_NAMES.iter().map(|n| dir.join(n)).collect();
        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => Self::load(path),
            None => Err(CoreError::ConfigNotFound {
                path: candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" or "),
            }),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.databases.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one database must be configured".to_string(),
            });
        }

        if self.tracker_table.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "tracker_table cannot be empty".to_string(),
            });
        }

        for (name, db) in &self.databases {
            if name.is_empty() || name.contains('/') {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Invalid database name '{name}'"),
                });
            }
            if db.path.trim().is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("Database '{name}' has an empty path"),
                });
            }
        }

        Ok(())
    }

    /// Database configs with relative file paths resolved against the config root
    pub fn resolved_databases(&self) -> BTreeMap<String, DatabaseConfig> {
        self.databases
            .iter()
            .map(|(name, db)| {
                let path = if db.is_in_memory() {
                    db.path.clone()
                } else {
                    self.resolve(&db.path).display().to_string()
                };
                (name.clone(), DatabaseConfig::new(db.db_type.clone(), path))
            })
            .collect()
    }

    /// Absolute schemas root
    pub fn schemas_path_absolute(&self) -> PathBuf {
        self.resolve(&self.schemas_path)
    }

    /// Absolute manifest path
    pub fn manifest_path_absolute(&self) -> PathBuf {
        self.resolve(&self.manifest)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
