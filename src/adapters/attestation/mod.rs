//! File-backed attestation store
//!
//! One record per `(digest, attestor)` at
//! `.vulngate/attestations/<digest-hex>/<attestor>.json`, written with an
//! atomic rename.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use super::fs_util::{check_path_segment, read_json, write_json};
use crate::core::models::{Attestation, AttestorId, Digest};
use crate::core::ports::AttestationStore;
use crate::paths;

/// Attestation store under a project root
#[derive(Debug, Clone)]
pub struct FileAttestationStore {
    dir: PathBuf,
}

impl FileAttestationStore {
    /// Create a store for the project at `root`
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            dir: paths::attestations_dir(root),
        }
    }

    fn record_path(&self, digest: &Digest, attestor: &AttestorId) -> anyhow::Result<PathBuf> {
        check_path_segment("attestor", attestor.as_str())?;
        Ok(self.dir.join(digest.hex()).join(format!("{}.json", attestor.as_str())))
    }
}

impl AttestationStore for FileAttestationStore {
    fn put(&self, attestation: &Attestation) -> anyhow::Result<()> {
        let path = self.record_path(&attestation.artifact_digest, &attestation.attestor)?;
        write_json(&path, attestation)
    }

    fn get(&self, digest: &Digest, attestor: &AttestorId) -> anyhow::Result<Option<Attestation>> {
        read_json(&self.record_path(digest, attestor)?)
    }

    fn list(&self, digest: &Digest) -> anyhow::Result<Vec<Attestation>> {
        let dir = self.dir.join(digest.hex());
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| {
                p.extension().is_some_and(|e| e == "json")
                    && !p.file_name().is_some_and(|n| n.to_string_lossy().starts_with('.'))
            })
            .collect();
        paths.sort();

        paths
            .iter()
            .map(|p| {
                let content = fs::read(p)?;
                serde_json::from_slice(&content)
                    .with_context(|| format!("Corrupt attestation {}", p.display()))
            })
            .collect()
    }
}
