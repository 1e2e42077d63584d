//! A vulngate project on disk
//!
//! Ties a loaded [`PipelineConfig`] to the local adapters rooted at the
//! directory holding `vulngate.toml`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::adapters::{
    FileArtifactStore, FileAttestationStore, KeyringSigner, LocalBuilder, LocalDeployer,
    ReportScanner, SystemClock,
};
use crate::config::PipelineConfig;
use crate::core::ports::{AttestationStore, Clock, Signer};
use crate::core::services::{Attestor, Collaborators, Pipeline, PolicyAdmission};
use crate::paths;

/// Loaded configuration plus its project root
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: PipelineConfig,
}

impl Project {
    /// Load the project whose config file is `config_path`
    pub fn open(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            anyhow::bail!(
                "No {} found at {}. Run 'vulngate init' first.",
                paths::CONFIG_FILE,
                config_path.display()
            );
        }
        let config = PipelineConfig::load(config_path)?;
        let root = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(Self { root, config })
    }

    /// Build a project from parts
    #[must_use]
    pub const fn new(root: PathBuf, config: PipelineConfig) -> Self {
        Self { root, config }
    }

    /// Project root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loaded configuration
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Keyring the attestor signs with
    #[must_use]
    pub fn signer(&self) -> KeyringSigner {
        KeyringSigner::new(&self.config.keyring_dir(&self.root))
    }

    /// Attestation store under the project root
    #[must_use]
    pub fn attestation_store(&self) -> FileAttestationStore {
        FileAttestationStore::new(&self.root)
    }

    /// Wire the local adapters together
    pub fn collaborators(&self) -> anyhow::Result<Collaborators> {
        let signer: Arc<dyn Signer> = Arc::new(self.signer());
        let attestations: Arc<dyn AttestationStore> = Arc::new(self.attestation_store());
        let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());

        Ok(Collaborators {
            builder: Arc::new(LocalBuilder::new(&self.config.pipeline.ignore)?),
            store: Arc::new(FileArtifactStore::new(&self.root)),
            scanner: Arc::new(ReportScanner::new(&self.config.report_dir(&self.root))),
            attestor: Attestor::new(
                self.config.attestor.id.clone(),
                Arc::clone(&signer),
                Arc::clone(&attestations),
                Arc::clone(&clock),
            ),
            admission: Arc::new(PolicyAdmission::new(attestations, signer)),
            deployer: Arc::new(LocalDeployer::new(&self.root, &self.config.deploy.service)),
            clock,
        })
    }

    /// Validated pipeline over the local adapters
    pub fn pipeline(&self) -> anyhow::Result<Pipeline> {
        Pipeline::new(
            self.config.stages.clone(),
            self.collaborators()?,
            self.config.run_settings(&self.root),
        )
        .context("Invalid pipeline definition")
    }
}
