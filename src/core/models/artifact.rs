//! Artifact model
//!
//! An artifact is an immutable build output identified by its content
//! digest. Tags are mutable pointers; partitions hold copies.
//!
//! # Examples
//!
//! ```
//! use vulngate::core::models::{Artifact, Digest};
//!
//! let digest = Digest::from_bytes(b"layer data");
//! let artifact = Artifact::new("registry.local/app".into(), "latest".into(), digest);
//! assert!(artifact.reference().to_string().starts_with("registry.local/app:latest@sha256:"));
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use thiserror::Error;

/// Errors that can occur when parsing artifact identifiers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArtifactError {
    /// Digest is not `sha256:<64 lowercase hex>`
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Reference string is missing a component
    #[error("invalid artifact reference: {0}")]
    InvalidReference(String),
}

/// Content-derived immutable identifier (`sha256:<hex>`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Parse and validate a digest string
    pub fn parse(s: &str) -> Result<Self, ArtifactError> {
        let valid = s.strip_prefix("sha256:").is_some_and(|hex| {
            hex.len() == 64 && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        });
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(ArtifactError::InvalidDigest(s.to_string()))
        }
    }

    /// Digest of raw content
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_hasher(Sha256::new_with_prefix(data))
    }

    /// Finish a running hash into a digest
    #[must_use]
    pub fn from_hasher(hasher: Sha256) -> Self {
        Self(format!("sha256:{}", hex::encode(hasher.finalize())))
    }

    /// The hex part without the algorithm prefix
    #[must_use]
    pub fn hex(&self) -> &str {
        self.0.trim_start_matches("sha256:")
    }

    /// Full digest string
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Digest {
    type Error = ArtifactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Digest> for String {
    fn from(d: Digest) -> Self {
        d.0
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Digest {
    type Err = ArtifactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Storage partition an artifact lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// Freshly pushed, awaiting scan and gate
    Staging,
    /// Attested and promoted
    Production,
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// A built artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    /// Repository path (e.g., "registry.local/project/app")
    pub repository: String,
    /// Mutable tag
    pub tag: String,
    /// Immutable content digest
    pub digest: Digest,
}

impl Artifact {
    /// Create a new artifact
    #[must_use]
    pub const fn new(repository: String, tag: String, digest: Digest) -> Self {
        Self { repository, tag, digest }
    }

    /// Reference usable by scanners and deployers
    #[must_use]
    pub fn reference(&self) -> ArtifactRef {
        ArtifactRef {
            repository: self.repository.clone(),
            tag: Some(self.tag.clone()),
            digest: self.digest.clone(),
        }
    }

    /// Same content under another repository (promotion copy)
    #[must_use]
    pub fn retarget(&self, repository: &str) -> Self {
        Self {
            repository: repository.to_string(),
            tag: self.tag.clone(),
            digest: self.digest.clone(),
        }
    }
}

/// Pinned reference `repository[:tag]@digest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Repository path
    pub repository: String,
    /// Optional tag
    pub tag: Option<String>,
    /// Digest the reference is pinned to
    pub digest: Digest,
}

impl ArtifactRef {
    /// Parse `repository[:tag]@sha256:<hex>`
    pub fn parse(s: &str) -> Result<Self, ArtifactError> {
        let (name, digest) = s
            .rsplit_once('@')
            .ok_or_else(|| ArtifactError::InvalidReference(s.to_string()))?;
        let digest = Digest::parse(digest)?;

        // A colon after the last slash separates the tag; earlier colons are registry ports
        let slash = name.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match name[slash..].rfind(':') {
            Some(i) => (&name[..slash + i], Some(name[slash + i + 1..].to_string())),
            None => (name, None),
        };

        if repository.is_empty() || tag.as_deref() == Some("") {
            return Err(ArtifactError::InvalidReference(s.to_string()));
        }

        Ok(Self {
            repository: repository.to_string(),
            tag,
            digest,
        })
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}@{}", self.repository, tag, self.digest),
            None => write!(f, "{}@{}", self.repository, self.digest),
        }
    }
}
