//! Attestation model
//!
//! An attestation is a signed statement that an artifact digest passed
//! the severity gate. It binds digest, attestor identity and the key
//! version that signed it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AttestorId, Digest};

/// Statement type embedded in every signing payload
pub const STATEMENT_TYPE: &str = "vulngate container signature";

/// Errors that can occur when parsing a key reference
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyRefError {
    /// Not of the form `<keyring>/<key>/<version>`
    #[error("invalid key reference '{0}': expected <keyring>/<key>/<version>")]
    Malformed(String),

    /// Version is not a positive integer
    #[error("invalid key version in '{0}'")]
    InvalidVersion(String),
}

/// Reference to one version of a signing key
///
/// The attestor only ever holds this reference; key bytes stay with the
/// signing backend.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KeyRef {
    /// Keyring name
    pub keyring: String,
    /// Key name within the keyring
    pub key: String,
    /// Key version (1-based)
    pub version: u32,
}

impl KeyRef {
    /// Create a key reference
    #[must_use]
    pub fn new(keyring: &str, key: &str, version: u32) -> Self {
        Self {
            keyring: keyring.to_string(),
            key: key.to_string(),
            version,
        }
    }

    /// Parse `<keyring>/<key>/<version>`
    pub fn parse(s: &str) -> Result<Self, KeyRefError> {
        let parts: Vec<&str> = s.split('/').collect();
        let [keyring, key, version] = parts.as_slice() else {
            return Err(KeyRefError::Malformed(s.to_string()));
        };
        let valid_name = |n: &str| {
            !n.is_empty()
                && n.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };
        if !valid_name(keyring) || !valid_name(key) {
            return Err(KeyRefError::Malformed(s.to_string()));
        }
        let version: u32 =
            version.parse().map_err(|_| KeyRefError::InvalidVersion(s.to_string()))?;
        if version == 0 {
            return Err(KeyRefError::InvalidVersion(s.to_string()));
        }
        Ok(Self::new(keyring, key, version))
    }
}

impl std::fmt::Display for KeyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.keyring, self.key, self.version)
    }
}

impl TryFrom<String> for KeyRef {
    type Error = KeyRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<KeyRef> for String {
    fn from(k: KeyRef) -> Self {
        k.to_string()
    }
}

/// The exact bytes an attestor signs
///
/// Serialized as compact JSON with fixed field order, so the same
/// artifact always yields the same payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPayload {
    /// Repository the artifact was built into
    pub docker_reference: String,
    /// Manifest digest being vouched for
    pub manifest_digest: Digest,
    /// Attestor vouching for the digest
    pub attestor: AttestorId,
    /// Fixed statement type
    #[serde(rename = "type")]
    pub statement_type: String,
}

impl SigningPayload {
    /// Payload for an artifact, as signed by `attestor`
    #[must_use]
    pub fn new(docker_reference: &str, manifest_digest: &Digest, attestor: &AttestorId) -> Self {
        Self {
            docker_reference: docker_reference.to_string(),
            manifest_digest: manifest_digest.clone(),
            attestor: attestor.clone(),
            statement_type: STATEMENT_TYPE.to_string(),
        }
    }

    /// Canonical byte encoding
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// A stored, signed attestation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Digest the attestation vouches for
    pub artifact_digest: Digest,

    /// Which attestor produced it
    pub attestor: AttestorId,

    /// Hex-encoded signature over `payload`
    pub signature: String,

    /// Key version that produced the signature
    pub key_version: KeyRef,

    /// When the attestation was created (RFC3339)
    pub created_at: String,

    /// Signed statement
    pub payload: SigningPayload,
}
