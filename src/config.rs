//! Pipeline configuration
//!
//! A project is described by `vulngate.toml`: the stage list, policy,
//! permissions and the settings each local adapter needs. Relative paths
//! are resolved against the directory holding the config file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::models::{AttestorId, KeyRef, Permissions, Policy, StageSpec};
use crate::core::services::{RetryPolicy, RunSettings, validate_stages};
use crate::paths;

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Artifact naming and build context
    #[serde(default)]
    pub pipeline: PipelineSection,
    /// Scanner settings
    #[serde(default)]
    pub scan: ScanSection,
    /// Attestor identity and signing key
    #[serde(default)]
    pub attestor: AttestorSection,
    /// Deployment target
    #[serde(default)]
    pub deploy: DeploySection,
    /// Gate threshold and required attestors
    #[serde(default)]
    pub policy: Policy,
    /// Capabilities granted to runs
    #[serde(default)]
    pub permissions: Permissions,
    /// Ordered pipeline steps
    #[serde(default = "StageSpec::default_pipeline")]
    pub stages: Vec<StageSpec>,
}

/// Artifact naming and build context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSection {
    /// Registry path of the staging (scanning) partition
    #[serde(default = "default_staging_repository")]
    pub staging_repository: String,
    /// Registry path of the production partition
    #[serde(default = "default_production_repository")]
    pub production_repository: String,
    /// Image name within each repository
    #[serde(default = "default_image")]
    pub image: String,
    /// Tag applied to built images
    #[serde(default = "default_tag")]
    pub tag: String,
    /// Build context directory
    #[serde(default = "default_context")]
    pub context: PathBuf,
    /// Glob patterns excluded from the build context
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

fn default_staging_repository() -> String {
    "registry.local/vulngate/scanning-repo".to_string()
}

fn default_production_repository() -> String {
    "registry.local/vulngate/artifact-scanning-repo".to_string()
}

fn default_image() -> String {
    "sample-image".to_string()
}

fn default_tag() -> String {
    "latest".to_string()
}

fn default_context() -> PathBuf {
    PathBuf::from(".")
}

fn default_ignore() -> Vec<String> {
    vec![format!("{}/**", paths::STATE_DIR), ".git/**".to_string()]
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            staging_repository: default_staging_repository(),
            production_repository: default_production_repository(),
            image: default_image(),
            tag: default_tag(),
            context: default_context(),
            ignore: default_ignore(),
        }
    }
}

/// Scanner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSection {
    /// Directory the scanner writes reports to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,
    /// Total seconds to wait for results
    #[serde(default = "default_scan_timeout")]
    pub timeout_secs: u64,
    /// Delay between polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Attempts per scanner call
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial retry backoff
    #[serde(default = "default_backoff")]
    pub backoff_ms: u64,
}

const fn default_scan_timeout() -> u64 {
    60
}

const fn default_poll_interval() -> u64 {
    2_000
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_backoff() -> u64 {
    500
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            report_dir: None,
            timeout_secs: default_scan_timeout(),
            poll_interval_ms: default_poll_interval(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff(),
        }
    }
}

/// Attestor identity and signing key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestorSection {
    /// Attestor name recorded in attestations
    #[serde(default = "default_attestor")]
    pub id: AttestorId,
    /// Key version to sign with
    #[serde(default = "default_key")]
    pub key: KeyRef,
    /// Keyring directory (defaults to the global keyring)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyring_dir: Option<PathBuf>,
    /// Attempts when the signing backend is unreachable
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial retry backoff
    #[serde(default = "default_backoff")]
    pub backoff_ms: u64,
}

fn default_attestor() -> AttestorId {
    AttestorId::new("vulnz-attestor")
}

fn default_key() -> KeyRef {
    KeyRef::new("binauthz", "vulnz-signer", 1)
}

impl Default for AttestorSection {
    fn default() -> Self {
        Self {
            id: default_attestor(),
            key: default_key(),
            keyring_dir: None,
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff(),
        }
    }
}

/// Deployment target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploySection {
    /// Service name
    #[serde(default = "default_service")]
    pub service: String,
}

fn default_service() -> String {
    "auth-service".to_string()
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            service: default_service(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineSection::default(),
            scan: ScanSection::default(),
            attestor: AttestorSection::default(),
            deploy: DeploySection::default(),
            policy: Policy::default(),
            permissions: Permissions::default(),
            stages: StageSpec::default_pipeline(),
        }
    }
}

impl PipelineConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> anyhow::Result<()> {
        validate_stages(&self.stages).context("Invalid stage list")?;
        if self.pipeline.staging_repository == self.pipeline.production_repository {
            anyhow::bail!("Staging and production repositories must differ");
        }
        if self.pipeline.image.trim().is_empty() || self.pipeline.tag.trim().is_empty() {
            anyhow::bail!("Image name and tag must not be empty");
        }
        Ok(())
    }

    /// Save config to disk
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Staging repository for the image
    #[must_use]
    pub fn staging_repository(&self) -> String {
        format!("{}/{}", self.pipeline.staging_repository, self.pipeline.image)
    }

    /// Production repository for the image
    #[must_use]
    pub fn production_repository(&self) -> String {
        format!("{}/{}", self.pipeline.production_repository, self.pipeline.image)
    }

    /// Scan report directory resolved against `root`
    #[must_use]
    pub fn report_dir(&self, root: &Path) -> PathBuf {
        self.scan
            .report_dir
            .as_ref()
            .map_or_else(|| paths::scans_dir(root), |dir| root.join(dir))
    }

    /// Keyring directory resolved against `root`
    #[must_use]
    pub fn keyring_dir(&self, root: &Path) -> PathBuf {
        self.attestor
            .keyring_dir
            .as_ref()
            .map_or_else(paths::global_keyring_dir, |dir| root.join(dir))
    }

    /// Orchestrator settings for a project rooted at `root`
    #[must_use]
    pub fn run_settings(&self, root: &Path) -> RunSettings {
        RunSettings {
            repository: self.staging_repository(),
            production_repository: self.production_repository(),
            tag: self.pipeline.tag.clone(),
            context: root.join(&self.pipeline.context),
            signing_key: self.attestor.key.clone(),
            scan_timeout_ms: self.scan.timeout_secs.saturating_mul(1_000),
            scan_poll_interval_ms: self.scan.poll_interval_ms,
            scan_retry: RetryPolicy {
                max_attempts: self.scan.max_attempts,
                initial_backoff_ms: self.scan.backoff_ms,
                max_backoff_ms: self.scan.backoff_ms.saturating_mul(8),
            },
            sign_retry: RetryPolicy {
                max_attempts: self.attestor.max_attempts,
                initial_backoff_ms: self.attestor.backoff_ms,
                max_backoff_ms: self.attestor.backoff_ms.saturating_mul(8),
            },
        }
    }
}
