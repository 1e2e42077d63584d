//! Admission controller port
//!
//! Consulted at deploy time to decide whether an artifact may run.

use crate::core::models::{AdmissionDecision, Digest, Policy};

/// Deploy-time admission check
pub trait AdmissionController: Send + Sync {
    /// Decide whether `digest` may be deployed under `policy`
    fn authorize(&self, digest: &Digest, policy: &Policy) -> anyhow::Result<AdmissionDecision>;
}
