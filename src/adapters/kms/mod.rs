//! Local keyring signing backend
//!
//! Stands in for a managed KMS. Each key version is a JSON file at
//! `<keyring_dir>/<keyring>/<key>/<version>.json` holding an Ed25519 key
//! pair and its lifecycle state. Callers only ever pass a [`KeyRef`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey};
use log::{debug, info};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use super::fs_util::{check_path_segment, write_json};
use crate::core::error::SigningError;
use crate::core::models::KeyRef;
use crate::core::ports::Signer;

/// Algorithm recorded on every key version
pub const ALGORITHM: &str = "ed25519";

/// Lifecycle state of a key version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyState {
    /// Usable for signing and verification
    Enabled,
    /// Temporarily unusable
    Disabled,
    /// Secret wiped; never usable again
    Destroyed,
}

impl std::fmt::Display for KeyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enabled => write!(f, "enabled"),
            Self::Disabled => write!(f, "disabled"),
            Self::Destroyed => write!(f, "destroyed"),
        }
    }
}

/// One stored key version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyVersion {
    /// Version number
    pub version: u32,
    /// Lifecycle state
    pub state: KeyState,
    /// Signature algorithm
    pub algorithm: String,
    /// Hex secret key, `None` once destroyed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// Hex public key
    pub public_key: String,
    /// When the version was created (RFC3339)
    pub created_at: String,
}

/// Summary of a key version for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    /// Full reference
    pub key: KeyRef,
    /// Lifecycle state
    pub state: KeyState,
    /// Signature algorithm
    pub algorithm: String,
    /// Hex public key
    pub public_key: String,
    /// When the version was created (RFC3339)
    pub created_at: String,
}

/// File-backed signing backend
#[derive(Debug, Clone)]
pub struct KeyringSigner {
    dir: PathBuf,
}

impl KeyringSigner {
    /// Open a keyring directory (created lazily)
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self { dir: dir.to_path_buf() }
    }

    /// Root directory of the keyring
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_dir(&self, keyring: &str, key: &str) -> anyhow::Result<PathBuf> {
        check_path_segment("keyring", keyring)?;
        check_path_segment("key", key)?;
        Ok(self.dir.join(keyring).join(key))
    }

    fn version_path(&self, key: &KeyRef) -> Result<PathBuf, SigningError> {
        self.key_dir(&key.keyring, &key.key)
            .map(|dir| dir.join(format!("{}.json", key.version)))
            .map_err(|_| SigningError::UnknownKey(key.clone()))
    }

    fn load(&self, key: &KeyRef) -> Result<KeyVersion, SigningError> {
        let path = self.version_path(key)?;
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SigningError::UnknownKey(key.clone()));
            },
            Err(e) => {
                return Err(SigningError::Unreachable(format!("{}: {e}", path.display())));
            },
        };
        serde_json::from_slice(&content).map_err(|e| SigningError::InvalidKeyMaterial {
            key: key.clone(),
            reason: e.to_string(),
        })
    }

    fn usable(&self, key: &KeyRef) -> Result<KeyVersion, SigningError> {
        let version = self.load(key)?;
        match version.state {
            KeyState::Enabled => Ok(version),
            KeyState::Disabled => Err(SigningError::KeyDisabled(key.clone())),
            KeyState::Destroyed => Err(SigningError::KeyDestroyed(key.clone())),
        }
    }

    /// Generate a new key version under `keyring/key`
    ///
    /// Versions are numbered from 1 upward.
    pub fn create_version(&self, keyring: &str, key: &str) -> anyhow::Result<KeyRef> {
        let dir = self.key_dir(keyring, key)?;
        let next = self
            .list(keyring, key)?
            .iter()
            .map(|info| info.key.version)
            .max()
            .unwrap_or(0)
            + 1;

        let signing = SigningKey::generate(&mut OsRng);
        let version = KeyVersion {
            version: next,
            state: KeyState::Enabled,
            algorithm: ALGORITHM.to_string(),
            secret_key: Some(hex::encode(signing.to_bytes())),
            public_key: hex::encode(signing.verifying_key().to_bytes()),
            created_at: Utc::now().to_rfc3339(),
        };
        write_json(&dir.join(format!("{next}.json")), &version)?;

        let reference = KeyRef::new(keyring, key, next);
        info!("Created key version {reference}");
        Ok(reference)
    }

    /// List versions of `keyring/key`, oldest first
    pub fn list(&self, keyring: &str, key: &str) -> anyhow::Result<Vec<KeyInfo>> {
        let dir = self.key_dir(keyring, key)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut infos = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))? {
            let path = entry?.path();
            let Some(version) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };
            let reference = KeyRef::new(keyring, key, version);
            let stored = self.load(&reference)?;
            infos.push(KeyInfo {
                key: reference,
                state: stored.state,
                algorithm: stored.algorithm,
                public_key: stored.public_key,
                created_at: stored.created_at,
            });
        }
        infos.sort_by_key(|info| info.key.version);
        Ok(infos)
    }

    /// Change the lifecycle state of a key version
    ///
    /// Destroying wipes the secret. A destroyed version cannot change state.
    pub fn set_state(&self, key: &KeyRef, state: KeyState) -> anyhow::Result<()> {
        let mut stored = self.load(key)?;
        if stored.state == KeyState::Destroyed && state != KeyState::Destroyed {
            anyhow::bail!("Key version {key} is destroyed");
        }
        stored.state = state;
        if state == KeyState::Destroyed {
            stored.secret_key = None;
        }
        write_json(&self.version_path(key)?, &stored)?;
        info!("Key version {key} is now {state}");
        Ok(())
    }

    /// Disable a key version
    pub fn disable(&self, key: &KeyRef) -> anyhow::Result<()> {
        self.set_state(key, KeyState::Disabled)
    }

    /// Re-enable a disabled key version
    pub fn enable(&self, key: &KeyRef) -> anyhow::Result<()> {
        self.set_state(key, KeyState::Enabled)
    }

    /// Destroy a key version
    pub fn destroy(&self, key: &KeyRef) -> anyhow::Result<()> {
        self.set_state(key, KeyState::Destroyed)
    }
}

fn decode_array<const N: usize>(key: &KeyRef, what: &str, hex_str: &str) -> Result<[u8; N], SigningError> {
    let invalid = |reason: String| SigningError::InvalidKeyMaterial {
        key: key.clone(),
        reason,
    };
    let bytes = hex::decode(hex_str).map_err(|e| invalid(format!("{what}: {e}")))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| invalid(format!("{what} must be {N} bytes, got {}", bytes.len())))
}

impl Signer for KeyringSigner {
    fn sign(&self, payload: &[u8], key: &KeyRef) -> Result<Vec<u8>, SigningError> {
        let stored = self.usable(key)?;
        let secret = stored.secret_key.as_deref().ok_or_else(|| SigningError::InvalidKeyMaterial {
            key: key.clone(),
            reason: "secret key missing".to_string(),
        })?;
        let signing = SigningKey::from_bytes(&decode_array::<32>(key, "secret key", secret)?);
        debug!("Signing {} byte payload with {key}", payload.len());
        Ok(signing.sign(payload).to_bytes().to_vec())
    }

    fn verify(&self, payload: &[u8], signature: &[u8], key: &KeyRef) -> Result<bool, SigningError> {
        let stored = self.usable(key)?;
        let public = decode_array::<32>(key, "public key", &stored.public_key)?;
        let verifying = VerifyingKey::from_bytes(&public).map_err(|e| SigningError::InvalidKeyMaterial {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        let Ok(signature) = Signature::from_slice(signature) else {
            return Ok(false);
        };
        Ok(verifying.verify_strict(payload, &signature).is_ok())
    }
}
