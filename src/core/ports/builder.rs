//! Image builder port
//!
//! Defines the interface for producing artifacts from a build context.

use std::path::PathBuf;

use crate::core::models::Artifact;

/// Inputs to a build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Repository the artifact is built into
    pub repository: String,
    /// Tag to apply
    pub tag: String,
    /// Build context directory
    pub context: PathBuf,
    /// Extra arguments from the build step
    pub args: Vec<String>,
}

/// Produces immutable artifacts
///
/// Implementations must derive the digest from content: building the same
/// context with the same arguments yields the same digest.
pub trait Builder: Send + Sync {
    /// Build an artifact
    fn build(&self, request: &BuildRequest) -> anyhow::Result<Artifact>;
}
