//! File-backed artifact registry
//!
//! Each artifact is one JSON record at
//! `.vulngate/registry/<partition>/<repository>/<tag>.json`. Repository
//! path segments map to directories; a registry port colon is escaped.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::debug;
use walkdir::WalkDir;

use super::fs_util::{check_path_segment, read_json, write_json};
use crate::core::models::{Artifact, Partition};
use crate::core::ports::ArtifactStore;
use crate::paths;

/// Artifact registry stored under a project root
#[derive(Debug, Clone)]
pub struct FileArtifactStore {
    root: PathBuf,
}

impl FileArtifactStore {
    /// Create a store for the project at `root`
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn record_path(
        &self,
        partition: Partition,
        repository: &str,
        tag: &str,
    ) -> anyhow::Result<PathBuf> {
        let mut path = paths::registry_partition(&self.root, partition);
        for segment in repository.split('/') {
            let escaped = segment.replace(':', "%3A");
            check_path_segment("repository", &escaped.replace('%', "_"))
                .with_context(|| format!("Invalid repository '{repository}'"))?;
            path.push(escaped);
        }
        check_path_segment("tag", tag)?;
        Ok(path.join(format!("{tag}.json")))
    }
}

impl ArtifactStore for FileArtifactStore {
    fn put(&self, partition: Partition, artifact: &Artifact) -> anyhow::Result<()> {
        let path = self.record_path(partition, &artifact.repository, &artifact.tag)?;
        write_json(&path, artifact)?;
        debug!("Stored {} in {partition}", artifact.reference());
        Ok(())
    }

    fn get(
        &self,
        partition: Partition,
        repository: &str,
        tag: &str,
    ) -> anyhow::Result<Option<Artifact>> {
        read_json(&self.record_path(partition, repository, tag)?)
    }

    fn list(&self, partition: Partition) -> anyhow::Result<Vec<Artifact>> {
        let dir = paths::registry_partition(&self.root, partition);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut artifacts = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            let is_record = entry.file_type().is_file()
                && path.extension().is_some_and(|e| e == "json")
                && !entry.file_name().to_string_lossy().starts_with('.');
            if !is_record {
                continue;
            }
            let content = fs::read(path)?;
            let artifact: Artifact = serde_json::from_slice(&content)
                .with_context(|| format!("Corrupt registry record {}", path.display()))?;
            artifacts.push(artifact);
        }
        Ok(artifacts)
    }
}
