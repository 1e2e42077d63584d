//! Artifact store port
//!
//! Defines the interface for the partitioned artifact registry.

use crate::core::models::{Artifact, Digest, Partition};

/// Partitioned artifact registry
///
/// Writes for distinct digests must not interfere with each other, so
/// concurrent runs can share one store.
pub trait ArtifactStore: Send + Sync {
    /// Store an artifact under its repository and tag
    ///
    /// Re-putting the same tag moves the tag to the new digest.
    fn put(&self, partition: Partition, artifact: &Artifact) -> anyhow::Result<()>;

    /// Look up an artifact by repository and tag
    fn get(
        &self,
        partition: Partition,
        repository: &str,
        tag: &str,
    ) -> anyhow::Result<Option<Artifact>>;

    /// List every artifact in a partition
    fn list(&self, partition: Partition) -> anyhow::Result<Vec<Artifact>>;

    /// Find artifacts with the given digest
    fn find_by_digest(
        &self,
        partition: Partition,
        digest: &Digest,
    ) -> anyhow::Result<Vec<Artifact>> {
        Ok(self.list(partition)?.into_iter().filter(|a| &a.digest == digest).collect())
    }

    /// Whether any artifact with this digest is in the partition
    fn contains(&self, partition: Partition, digest: &Digest) -> anyhow::Result<bool> {
        Ok(!self.find_by_digest(partition, digest)?.is_empty())
    }

    /// Copy a staged artifact into production under `repository`
    ///
    /// Fails if the digest is not in staging. Returns the production copy.
    fn promote(&self, artifact: &Artifact, repository: &str) -> anyhow::Result<Artifact> {
        if !self.contains(Partition::Staging, &artifact.digest)? {
            anyhow::bail!("{} is not in the staging partition", artifact.digest);
        }
        let promoted = artifact.retarget(repository);
        self.put(Partition::Production, &promoted)?;
        Ok(promoted)
    }
}
