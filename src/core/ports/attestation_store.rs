//! Attestation store port
//!
//! Defines the interface for publishing and querying attestations.

use crate::core::models::{Attestation, AttestorId, Digest};

/// Durable attestation storage, keyed by `(digest, attestor)`
///
/// Implementations must make `put` atomic: a reader sees either the old
/// record or the new one, never a partial write.
pub trait AttestationStore: Send + Sync {
    /// Store an attestation, replacing any record with the same key
    fn put(&self, attestation: &Attestation) -> anyhow::Result<()>;

    /// Fetch the attestation for a digest from one attestor
    fn get(&self, digest: &Digest, attestor: &AttestorId) -> anyhow::Result<Option<Attestation>>;

    /// All attestations for a digest
    fn list(&self, digest: &Digest) -> anyhow::Result<Vec<Attestation>>;
}
