//! Attestor - signs and publishes attestations
//!
//! The attestor has no view of gate state. Callers must only invoke it
//! after the gate allowed the artifact.

use std::sync::Arc;

use log::{debug, info};

use crate::core::error::{SigningError, StageError};
use crate::core::models::{Artifact, Attestation, AttestorId, KeyRef, SigningPayload};
use crate::core::ports::{AttestationStore, Clock, Signer};

/// Produces one attestation per `(digest, attestor)`
#[derive(Clone)]
pub struct Attestor {
    id: AttestorId,
    signer: Arc<dyn Signer>,
    store: Arc<dyn AttestationStore>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Attestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attestor").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Attestor {
    /// Create an attestor with the given identity
    #[must_use]
    pub fn new(
        id: AttestorId,
        signer: Arc<dyn Signer>,
        store: Arc<dyn AttestationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            id,
            signer,
            store,
            clock,
        }
    }

    /// This attestor's identity
    #[must_use]
    pub const fn id(&self) -> &AttestorId {
        &self.id
    }

    /// Sign and publish an attestation for `artifact`
    ///
    /// Idempotent: if a valid attestation from this attestor with the same
    /// key version and payload already exists it is returned unchanged.
    /// A record signed by another key version is replaced.
    pub fn attest(&self, artifact: &Artifact, key: &KeyRef) -> Result<Attestation, StageError> {
        let payload = SigningPayload::new(&artifact.repository, &artifact.digest, &self.id);

        let existing = self
            .store
            .get(&artifact.digest, &self.id)
            .map_err(|e| StageError::AttestationStore(format!("{e:#}")))?;

        if let Some(existing) = existing {
            if existing.key_version == *key
                && existing.payload == payload
                && verify_attestation(self.signer.as_ref(), &existing)?
            {
                debug!("Reusing attestation for {} by {}", artifact.digest, self.id);
                return Ok(existing);
            }
            info!(
                "Replacing attestation for {} by {} (was signed with {})",
                artifact.digest, self.id, existing.key_version
            );
        }

        let bytes = payload.to_bytes().map_err(|e| SigningError::Payload(e.to_string()))?;
        let signature = self.signer.sign(&bytes, key)?;

        let attestation = Attestation {
            artifact_digest: artifact.digest.clone(),
            attestor: self.id.clone(),
            signature: hex::encode(signature),
            key_version: key.clone(),
            created_at: self.clock.now_utc().to_rfc3339(),
            payload,
        };

        self.store
            .put(&attestation)
            .map_err(|e| StageError::AttestationStore(format!("{e:#}")))?;

        info!("Attested {} as {} with {}", artifact.digest, self.id, key);
        Ok(attestation)
    }
}

/// Check an attestation's signature against its own payload
///
/// A signature that is not valid hex, or a payload that names another
/// digest or another attestor than the record, counts as invalid rather
/// than as an error.
pub fn verify_attestation(signer: &dyn Signer, attestation: &Attestation) -> Result<bool, SigningError> {
    if attestation.payload.manifest_digest != attestation.artifact_digest
        || attestation.payload.attestor != attestation.attestor
    {
        return Ok(false);
    }
    let Ok(signature) = hex::decode(&attestation.signature) else {
        return Ok(false);
    };
    let bytes = attestation
        .payload
        .to_bytes()
        .map_err(|e| SigningError::Payload(e.to_string()))?;
    signer.verify(&bytes, &signature, &attestation.key_version)
}
