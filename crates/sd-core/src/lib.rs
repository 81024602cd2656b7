//! sd-core - Core library for schemadeploy
//!
//! This crate provides the configuration file model, the deployment manifest,
//! the script model and statement splitter shared by the other schemadeploy
//! crates.

pub mod config;
pub mod error;
pub mod manifest;
pub mod script;
pub mod sql_utils;

pub use config::{BaselineConfig, Config, DatabaseConfig};
pub use error::{CoreError, CoreResult};
pub use manifest::{ManifestRow, ManifestSource, YamlManifest};
pub use script::{split_statements, Script, ScriptKind, ScriptSource};
