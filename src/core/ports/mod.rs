//! Port traits (interfaces) for external dependencies
//!
//! These traits define the boundaries between the pipeline core and the
//! external collaborators it drives: builder, registry, scanner, signing
//! backend, attestation store, admission controller and runtime.
//!
//! Implementations live in the `adapters` module.
//!
//! ## Design Principle
//!
//! The orchestrator depends only on these traits, never on concrete
//! implementations. This enables:
//!
//! - **Testability**: Mock implementations for unit tests
//! - **Flexibility**: Swap a local adapter for a managed service
//! - **Concurrency**: All ports are `Send + Sync` so runs can share them

mod admission;
mod artifact_store;
mod attestation_store;
mod builder;
mod clock;
mod deployer;
mod scanner;
mod signer;

pub use admission::AdmissionController;
pub use artifact_store::ArtifactStore;
pub use attestation_store::AttestationStore;
pub use builder::{BuildRequest, Builder};
pub use clock::Clock;
pub use deployer::Deployer;
pub use scanner::{ScanId, ScanStatus, Scanner};
pub use signer::Signer;
