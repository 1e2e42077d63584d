//! Local image builder
//!
//! Implements `Builder` by hashing the build context. The digest covers
//! every file's relative path and bytes in sorted order, plus the build
//! step arguments, so identical inputs always yield the same digest.

use std::fs;
use std::path::Path;

use anyhow::Context;
use glob::Pattern;
use log::debug;
use sha2::{Digest as _, Sha256};
use walkdir::WalkDir;

use crate::core::models::{Artifact, Digest};
use crate::core::ports::{BuildRequest, Builder};

/// Content-addressed builder over a local directory
#[derive(Debug, Clone)]
pub struct LocalBuilder {
    ignore: Vec<Pattern>,
}

impl LocalBuilder {
    /// Create a builder that skips files matching any of `ignore`
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub fn new(ignore: &[String]) -> anyhow::Result<Self> {
        let ignore = ignore
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("Invalid ignore pattern '{p}'")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(Self { ignore })
    }

    fn is_ignored(&self, relative: &str) -> bool {
        self.ignore.iter().any(|p| p.matches(relative))
    }

    /// Compute the digest of a context directory
    pub fn digest_context(&self, context: &Path, args: &[String]) -> anyhow::Result<Digest> {
        if !context.is_dir() {
            anyhow::bail!("Build context {} is not a directory", context.display());
        }

        let mut hasher = Sha256::new();
        let mut files = 0_usize;

        for entry in WalkDir::new(context).follow_links(false).sort_by_file_name() {
            let entry = entry?;
            if entry.file_type().is_dir() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(context)?
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if self.is_ignored(&relative) {
                debug!("Skipping ignored {relative}");
                continue;
            }

            let content = if entry.file_type().is_symlink() {
                let target = fs::read_link(entry.path())?;
                format!("symlink:{}", target.to_string_lossy()).into_bytes()
            } else {
                fs::read(entry.path())
                    .with_context(|| format!("Failed to read {}", entry.path().display()))?
            };

            hasher.update(relative.as_bytes());
            hasher.update([0]);
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(&content);
            files += 1;
        }

        if files == 0 {
            anyhow::bail!("Build context {} contains no files", context.display());
        }

        for arg in args {
            hasher.update(b"arg\0");
            hasher.update(arg.as_bytes());
        }

        debug!("Hashed {files} file(s) from {}", context.display());
        Ok(Digest::from_hasher(hasher))
    }
}

impl Builder for LocalBuilder {
    fn build(&self, request: &BuildRequest) -> anyhow::Result<Artifact> {
        let digest = self.digest_context(&request.context, &request.args)?;
        Ok(Artifact::new(request.repository.clone(), request.tag.clone(), digest))
    }
}
