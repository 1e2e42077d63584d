//! Local deployer
//!
//! Records the running revision of a service in
//! `.vulngate/deployments/<service>.json`. Each deploy bumps the revision
//! counter.

use std::path::{Path, PathBuf};

use chrono::Utc;
use log::info;
use serde::{Deserialize, Serialize};

use super::fs_util::{check_path_segment, read_json, write_json};
use crate::core::models::{Artifact, Deployment};
use crate::core::ports::Deployer;
use crate::paths;

#[derive(Debug, Serialize, Deserialize)]
struct ServiceRecord {
    generation: u64,
    current: Deployment,
}

/// Deployer writing service records under a project root
#[derive(Debug, Clone)]
pub struct LocalDeployer {
    dir: PathBuf,
    service: String,
}

impl LocalDeployer {
    /// Create a deployer for `service`
    #[must_use]
    pub fn new(root: &Path, service: &str) -> Self {
        Self {
            dir: paths::deployments_dir(root),
            service: service.to_string(),
        }
    }

    fn record_path(&self) -> anyhow::Result<PathBuf> {
        check_path_segment("service", &self.service)?;
        Ok(self.dir.join(format!("{}.json", self.service)))
    }

    /// Currently running revision, if any
    pub fn current(&self) -> anyhow::Result<Option<Deployment>> {
        let record: Option<ServiceRecord> = read_json(&self.record_path()?)?;
        Ok(record.map(|r| r.current))
    }
}

impl Deployer for LocalDeployer {
    fn deploy(&self, artifact: &Artifact) -> anyhow::Result<Deployment> {
        let path = self.record_path()?;
        let previous: Option<ServiceRecord> = read_json(&path)?;
        let generation = previous.map_or(1, |r| r.generation + 1);

        let deployment = Deployment {
            service: self.service.clone(),
            revision: format!("{}-{generation:05}", self.service),
            image: format!("{}@{}", artifact.repository, artifact.digest),
            deployed_at: Utc::now().to_rfc3339(),
        };
        write_json(
            &path,
            &ServiceRecord {
                generation,
                current: deployment.clone(),
            },
        )?;

        info!("Deployed {} as {}", deployment.image, deployment.revision);
        Ok(deployment)
    }
}
