//! Decisions and run outcomes
//!
//! - [`GateDecision`] - result of the severity gate
//! - [`AdmissionDecision`] - result of the admission controller
//! - [`RunState`] / [`RunReport`] - terminal state of a pipeline run

use serde::{Deserialize, Serialize};

use super::{Artifact, Attestation, Severity, Stage};

/// A finding that tripped the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offense {
    /// Vulnerability id
    pub cve_id: String,
    /// Affected package
    pub package: String,
    /// Severity as reported (may be unparseable)
    pub severity: String,
}

/// Why the gate blocked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReason {
    /// Threshold in effect
    pub threshold: Severity,
    /// Every offending finding, in scanner order
    pub offending: Vec<Offense>,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} finding(s) at or above {}",
            self.offending.len(),
            self.threshold
        )?;
        if let Some(first) = self.offending.first() {
            write!(f, " (first: {} in {} [{}])", first.cve_id, first.package, first.severity)?;
        }
        Ok(())
    }
}

/// Severity gate decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum GateDecision {
    /// Pipeline may continue
    Allow,
    /// Pipeline must stop
    Block(BlockReason),
}

impl GateDecision {
    /// Whether the gate allowed the artifact
    #[must_use]
    pub const fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Admission controller decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "lowercase")]
pub enum AdmissionDecision {
    /// Deployment may proceed
    Allow,
    /// Deployment refused
    Deny(String),
}

/// Terminal state of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RunState {
    /// Deploy confirmed
    Succeeded,
    /// A stage errored
    Failed {
        /// Stage that failed
        stage: Stage,
        /// Reason code (e.g., "SigningError")
        reason: String,
        /// Human-readable detail
        message: String,
    },
    /// Gate rejected the artifact
    Blocked(BlockReason),
    /// Run cancelled between stages
    Cancelled {
        /// Last stage that completed, if any
        after: Option<Stage>,
    },
}

impl RunState {
    /// Process exit code for this state
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Succeeded => 0,
            Self::Failed { .. } => 1,
            Self::Blocked(_) => 2,
            Self::Cancelled { .. } => 3,
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "Succeeded"),
            Self::Failed { stage, reason, .. } => write!(f, "Failed({stage}, {reason})"),
            Self::Blocked(_) => write!(f, "Blocked"),
            Self::Cancelled { after: Some(stage) } => write!(f, "Cancelled(after {stage})"),
            Self::Cancelled { after: None } => write!(f, "Cancelled"),
        }
    }
}

/// A running revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Service name
    pub service: String,
    /// Revision identifier
    pub revision: String,
    /// Pinned image reference that is running
    pub image: String,
    /// When the revision went live (RFC3339)
    pub deployed_at: String,
}

/// A completed stage in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Step id from the pipeline definition
    pub id: String,
    /// Stage kind
    pub stage: Stage,
    /// Wall time spent, in milliseconds
    pub elapsed_ms: u64,
}

/// Everything a finished run reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Run identifier
    pub run_id: String,
    /// Terminal state
    pub state: RunState,
    /// Built artifact, if the build stage completed
    pub artifact: Option<Artifact>,
    /// Number of findings the scanner reported
    pub findings: usize,
    /// Attestation produced by this run
    pub attestation: Option<Attestation>,
    /// Revision started by the deploy stage
    pub deployment: Option<Deployment>,
    /// Stages that completed, in order
    pub completed: Vec<StageRecord>,
}

impl RunReport {
    /// Process exit code for this run
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }

    /// Whether a given stage completed
    #[must_use]
    pub fn reached(&self, stage: Stage) -> bool {
        self.completed.iter().any(|r| r.stage == stage)
    }
}
