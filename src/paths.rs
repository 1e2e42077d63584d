//! Centralized path definitions for vulngate
//!
//! This module provides a single source of truth for all filesystem paths
//! used by the local adapters.
//!
//! ## Storage Layout
//!
//! ### Per-Project (next to `vulngate.toml`)
//!
//! ```text
//! project/
//! ├── vulngate.toml                        # Pipeline definition and policy
//! └── .vulngate/                           # Local state
//!     ├── registry/
//!     │   ├── staging/<repository>/<tag>.json
//!     │   └── production/<repository>/<tag>.json
//!     ├── scans/<digest-hex>.json          # Scanner reports
//!     ├── attestations/<digest-hex>/<attestor>.json
//!     └── deployments/<service>.json
//! ```
//!
//! ### Global (User-Level)
//!
//! ```text
//! ~/.vulngate/
//! └── keys/<keyring>/<key>/<version>.json  # Signing key versions
//! ```

use std::path::{Path, PathBuf};

use crate::core::models::Partition;

/// Directory name for local vulngate state
pub const STATE_DIR: &str = ".vulngate";

/// Pipeline configuration filename
pub const CONFIG_FILE: &str = "vulngate.toml";

/// Environment variable overriding the global keyring directory
pub const KEYRING_ENV: &str = "VULNGATE_KEYRING_DIR";

const REGISTRY_DIR: &str = "registry";
const SCANS_DIR: &str = "scans";
const ATTESTATIONS_DIR: &str = "attestations";
const DEPLOYMENTS_DIR: &str = "deployments";

/// Get path to `.vulngate/` under a project root.
#[must_use]
pub fn state_dir(root: &Path) -> PathBuf {
    root.join(STATE_DIR)
}

/// Get path to a registry partition directory.
#[must_use]
pub fn registry_partition(root: &Path, partition: Partition) -> PathBuf {
    state_dir(root).join(REGISTRY_DIR).join(partition.to_string())
}

/// Get path to the default scan report directory.
///
/// An external scanner drops one `<digest-hex>.json` report per artifact.
#[must_use]
pub fn scans_dir(root: &Path) -> PathBuf {
    state_dir(root).join(SCANS_DIR)
}

/// Get path to the attestation store.
#[must_use]
pub fn attestations_dir(root: &Path) -> PathBuf {
    state_dir(root).join(ATTESTATIONS_DIR)
}

/// Get path to the deployment records.
#[must_use]
pub fn deployments_dir(root: &Path) -> PathBuf {
    state_dir(root).join(DEPLOYMENTS_DIR)
}

/// Get the global keyring directory.
///
/// Returns `$VULNGATE_KEYRING_DIR` when set, otherwise `~/.vulngate/keys/`.
#[must_use]
pub fn global_keyring_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(KEYRING_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("~")).join(STATE_DIR).join("keys")
}
