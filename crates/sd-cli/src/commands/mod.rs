//! CLI command implementations

pub(crate) mod baseline;
pub(crate) mod common;
pub(crate) mod deploy;
pub(crate) mod status;
pub(crate) mod tracker;
