//! Deployer port
//!
//! Runs an admitted production artifact.

use crate::core::models::{Artifact, Deployment};

/// Managed runtime
pub trait Deployer: Send + Sync {
    /// Deploy the artifact and return the new revision
    fn deploy(&self, artifact: &Artifact) -> anyhow::Result<Deployment>;
}
