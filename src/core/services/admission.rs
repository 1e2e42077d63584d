//! Attestation-based admission controller
//!
//! Admits a digest only when every attestor the policy requires has a
//! stored attestation, signed by a key the policy trusts for that
//! attestor, whose signature verifies.

use std::sync::Arc;

use log::{debug, warn};

use crate::core::models::{AdmissionDecision, Digest, Policy};
use crate::core::ports::{AdmissionController, AttestationStore, Signer};

use super::attestor::verify_attestation;

/// Admission controller backed by an attestation store and signer
#[derive(Clone)]
pub struct PolicyAdmission {
    store: Arc<dyn AttestationStore>,
    signer: Arc<dyn Signer>,
}

impl std::fmt::Debug for PolicyAdmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyAdmission").finish_non_exhaustive()
    }
}

impl PolicyAdmission {
    /// Create an admission controller
    #[must_use]
    pub fn new(store: Arc<dyn AttestationStore>, signer: Arc<dyn Signer>) -> Self {
        Self { store, signer }
    }
}

impl AdmissionController for PolicyAdmission {
    fn authorize(&self, digest: &Digest, policy: &Policy) -> anyhow::Result<AdmissionDecision> {
        if policy.required_attestors.is_empty() {
            warn!("Policy names no required attestors; denying {digest}");
            return Ok(AdmissionDecision::Deny("policy requires no attestors".to_string()));
        }

        for attestor in &policy.required_attestors {
            let Some(attestation) = self.store.get(digest, attestor)? else {
                return Ok(AdmissionDecision::Deny(format!(
                    "no attestation from '{attestor}' for {digest}"
                )));
            };
            if attestation.attestor != *attestor || attestation.artifact_digest != *digest {
                return Ok(AdmissionDecision::Deny(format!(
                    "record stored for '{attestor}' is not its attestation for {digest}"
                )));
            }
            if !policy.trusts(attestor, &attestation.key_version) {
                return Ok(AdmissionDecision::Deny(format!(
                    "key {} is not trusted for '{attestor}'",
                    attestation.key_version
                )));
            }

            match verify_attestation(self.signer.as_ref(), &attestation) {
                Ok(true) => debug!("Attestation from {attestor} verified for {digest}"),
                Ok(false) => {
                    return Ok(AdmissionDecision::Deny(format!(
                        "attestation from '{attestor}' has an invalid signature"
                    )));
                },
                Err(e) if e.is_transient() => return Err(e.into()),
                Err(e) => {
                    return Ok(AdmissionDecision::Deny(format!(
                        "attestation from '{attestor}' cannot be trusted: {e}"
                    )));
                },
            }
        }

        Ok(AdmissionDecision::Allow)
    }
}
