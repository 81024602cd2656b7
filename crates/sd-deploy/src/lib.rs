//! sd-deploy - Deployment engine for schemadeploy
//!
//! Ties the manifest, the connection pool, the transactional executor and the
//! per-database trackers together. [`Deployer`] is the operator-facing entry
//! point: incremental deploys, baseline creation, and the manual tracker
//! commands (mark, unmark, add).

pub mod baseline;
pub mod deployer;
pub mod error;
pub mod report;
pub mod routing;

pub use baseline::discover_baseline_scripts;
pub use deployer::{
    plan_deployment, CommandOutcome, DatabasePlan, DeployOptions, Deployer, ScriptState,
};
pub use error::{DeployError, DeployResult};
pub use report::{DeploymentReport, ScriptOutcome, ScriptStatus};
pub use routing::ScriptRef;
