//! Domain models for vulngate
//!
//! Pure data structures with no I/O dependencies.
//!
//! - [`Artifact`] - An immutable build output addressed by [`Digest`]
//! - [`Finding`] - A vulnerability reported against an artifact
//! - [`Severity`] - Ordered vulnerability severity
//! - [`Policy`] - Gate threshold and required attestors
//! - [`Attestation`] - Signed proof that an artifact passed the gate
//! - [`StageSpec`] - One declared pipeline step
//! - [`RunReport`] - Terminal state of a pipeline run

mod artifact;
mod attestation;
mod finding;
mod outcome;
mod policy;
mod severity;
mod stage;

pub use artifact::{Artifact, ArtifactError, ArtifactRef, Digest, Partition};
pub use attestation::{Attestation, KeyRef, KeyRefError, STATEMENT_TYPE, SigningPayload};
pub use finding::Finding;
pub use outcome::{
    AdmissionDecision, BlockReason, Deployment, GateDecision, Offense, RunReport, RunState, StageRecord,
};
pub use policy::{AttestorId, Capability, Permissions, Policy, SharedPolicy};
pub use severity::Severity;
pub use stage::{Stage, StageSpec};
