//! Signing backend port
//!
//! The signing backend owns key material. Callers pass a [`KeyRef`] and
//! never see key bytes.

use crate::core::error::SigningError;
use crate::core::models::KeyRef;

/// Asymmetric signing backend (KMS equivalent)
pub trait Signer: Send + Sync {
    /// Sign `payload` with the referenced key version
    fn sign(&self, payload: &[u8], key: &KeyRef) -> Result<Vec<u8>, SigningError>;

    /// Check `signature` over `payload` against the key version's public key
    ///
    /// Returns `Ok(false)` for a well-formed but wrong signature.
    fn verify(&self, payload: &[u8], signature: &[u8], key: &KeyRef) -> Result<bool, SigningError>;
}
