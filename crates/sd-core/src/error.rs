//! Error types for sd-core

use thiserror::Error;

/// Core error type for schemadeploy
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Database name is not declared in the config
    #[error("[C003] Database '{name}' is not configured")]
    UnknownDatabase { name: String },

    /// C004: Manifest file could not be parsed
    #[error("[C004] Failed to parse manifest {path}: {details}")]
    ManifestParseError { path: String, details: String },

    /// C005: IO error with file path context
    #[error("[C005] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C006: Config YAML parse error
    #[error("[C006] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
