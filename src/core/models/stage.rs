//! Pipeline stages
//!
//! A pipeline is data: an ordered list of [`StageSpec`]s, each naming the
//! [`Stage`] it performs plus the builder image and arguments used for it.

use serde::{Deserialize, Serialize};

/// The kind of work a stage performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Produce an artifact from source
    Build,
    /// Write the artifact to the staging partition
    Push,
    /// Obtain vulnerability findings
    Scan,
    /// Judge findings against the policy threshold
    Gate,
    /// Sign and publish an attestation
    Attest,
    /// Copy the artifact into the production partition
    Promote,
    /// Run the production artifact
    Deploy,
}

impl Stage {
    /// Required order of stages in every pipeline
    pub const ORDER: [Self; 7] = [
        Self::Build,
        Self::Push,
        Self::Scan,
        Self::Gate,
        Self::Attest,
        Self::Promote,
        Self::Deploy,
    ];
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Build => "build",
            Self::Push => "push",
            Self::Scan => "scan",
            Self::Gate => "gate",
            Self::Attest => "attest",
            Self::Promote => "promote",
            Self::Deploy => "deploy",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ORDER
            .into_iter()
            .find(|stage| stage.to_string() == s.to_lowercase())
            .ok_or_else(|| {
                format!("Unknown stage: {s}. Use: build, push, scan, gate, attest, promote, deploy")
            })
    }
}

/// One declared pipeline step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    /// Step identifier, unique within the pipeline
    pub id: String,

    /// What the step does
    pub kind: Stage,

    /// Builder image reference that performs the step
    #[serde(default)]
    pub image: String,

    /// Arguments handed to the step
    #[serde(default)]
    pub args: Vec<String>,
}

impl StageSpec {
    /// Step with no image or arguments
    #[must_use]
    pub fn new(id: &str, kind: Stage) -> Self {
        Self {
            id: id.to_string(),
            kind,
            image: String::new(),
            args: Vec::new(),
        }
    }

    /// The canonical seven-step pipeline
    #[must_use]
    pub fn default_pipeline() -> Vec<Self> {
        Stage::ORDER.iter().map(|s| Self::new(&s.to_string(), *s)).collect()
    }
}
