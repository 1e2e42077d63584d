//! Error taxonomy for pipeline stages
//!
//! Every stage failure maps to one [`StageError`]. Gate rejections are not
//! errors; they end a run as `Blocked`.

use thiserror::Error;

use super::models::{Capability, KeyRef};

/// Errors from the signing backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    /// Key reference does not resolve to a key version
    #[error("unknown key version {0}")]
    UnknownKey(KeyRef),

    /// Key version exists but is disabled
    #[error("key version {0} is disabled")]
    KeyDisabled(KeyRef),

    /// Key version has been destroyed
    #[error("key version {0} is destroyed")]
    KeyDestroyed(KeyRef),

    /// Key material could not be decoded
    #[error("invalid key material for {key}: {reason}")]
    InvalidKeyMaterial {
        /// Offending key version
        key: KeyRef,
        /// What was wrong
        reason: String,
    },

    /// Backend could not be reached
    #[error("signing backend unreachable: {0}")]
    Unreachable(String),

    /// Payload could not be encoded for signing
    #[error("cannot encode signing payload: {0}")]
    Payload(String),
}

impl SigningError {
    /// Whether retrying can help
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// Errors from the vulnerability scanner
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    /// Scanner could not be reached or returned a server error
    #[error("scanner unavailable: {0}")]
    Unavailable(String),

    /// Scanner answered with data that cannot be interpreted
    #[error("malformed scan result: {0}")]
    Malformed(String),
}

impl ScanError {
    /// Whether retrying can help
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// A stage failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StageError {
    /// Build could not produce an artifact
    #[error("build failed: {0}")]
    Build(String),

    /// Artifact could not be written to staging
    #[error("push failed: {0}")]
    Push(String),

    /// Scanner failed after all retries
    #[error(transparent)]
    ScanUnavailable(ScanError),

    /// Scan results did not arrive within budget
    #[error("no scan results after {waited_ms} ms")]
    Timeout {
        /// How long the orchestrator waited
        waited_ms: u64,
    },

    /// Signing failed
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// Attestation could not be stored
    #[error("attestation store failed: {0}")]
    AttestationStore(String),

    /// Admission controller denied the artifact
    #[error("policy violation: {0}")]
    PolicyViolation(String),

    /// Artifact could not be copied to production
    #[error("promotion failed: {0}")]
    Promote(String),

    /// Deployment failed after admission
    #[error("deploy failed: {0}")]
    Deploy(String),

    /// A stage ran without the state an earlier stage should have produced
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Run lacks a capability the stage needs
    #[error("permission denied: '{0}' not granted")]
    PermissionDenied(Capability),
}

impl StageError {
    /// Stable reason code for reports
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Build(_) => "BuildError",
            Self::Push(_) => "PushError",
            Self::ScanUnavailable(_) => "ScanUnavailable",
            Self::Timeout { .. } => "Timeout",
            Self::Signing(_) => "SigningError",
            Self::AttestationStore(_) => "AttestationStoreError",
            Self::PolicyViolation(_) => "PolicyViolation",
            Self::Promote(_) => "PromoteError",
            Self::Deploy(_) => "DeployError",
            Self::Precondition(_) => "PreconditionFailed",
            Self::PermissionDenied(_) => "PermissionDenied",
        }
    }
}
