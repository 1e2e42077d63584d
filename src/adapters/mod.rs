//! Adapter implementations for port traits
//!
//! This module contains concrete implementations that handle I/O:
//!
//! - `build/` - Content-addressed builder over a local context directory
//! - `registry/` - File-backed staging and production partitions
//! - `scanner/` - Scanner that waits for reports dropped in a directory
//! - `kms/` - Ed25519 keyring standing in for a managed KMS
//! - `attestation/` - JSON attestation store
//! - `deploy/` - Service revision records
//! - `clock` - Wall clock

pub mod attestation;
pub mod build;
pub mod clock;
pub mod deploy;
mod fs_util;
pub mod kms;
pub mod registry;
pub mod scanner;

pub use attestation::FileAttestationStore;
pub use build::LocalBuilder;
pub use clock::SystemClock;
pub use deploy::LocalDeployer;
pub use kms::{KeyInfo, KeyState, KeyringSigner};
pub use registry::FileArtifactStore;
pub use scanner::{ReportScanner, parse_report};
