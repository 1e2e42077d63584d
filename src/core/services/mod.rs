//! Pipeline services
//!
//! Orchestration and decision logic that operates on domain models and
//! port traits. Nothing here touches the filesystem directly.
//!
//! - [`gate`] - Judge findings against a severity threshold
//! - [`attestor`] - Sign and publish attestations
//! - [`admission`] - Attestation-based admission controller
//! - [`orchestrator`] - Run a validated stage list to a terminal state
//! - [`retry`] - Bounded retry with backoff

pub mod admission;
pub mod attestor;
pub mod gate;
pub mod orchestrator;
pub mod retry;

pub use admission::PolicyAdmission;
pub use attestor::{Attestor, verify_attestation};
pub use gate::evaluate;
pub use orchestrator::{
    CancelToken, Collaborators, Pipeline, PipelineError, RunSettings, validate_stages,
};
pub use retry::RetryPolicy;
