//! Pipeline orchestrator - drives a run through its stages
//!
//! The pipeline is a validated list of [`StageSpec`]s executed strictly in
//! order. The only branch is at the gate: a block ends the run before the
//! attest stage is reached, so an attestation can never exist for a run
//! whose gate did not allow it.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, error, info, warn};
use thiserror::Error;

use crate::core::error::{ScanError, StageError};
use crate::core::models::{
    AdmissionDecision, Artifact, Attestation, BlockReason, Capability, Deployment, Finding,
    GateDecision, KeyRef, Partition, Permissions, Policy, RunReport, RunState, SharedPolicy,
    Stage, StageRecord, StageSpec,
};
use crate::core::ports::{
    AdmissionController, ArtifactStore, BuildRequest, Builder, Clock, Deployer, ScanStatus,
    Scanner,
};

use super::attestor::Attestor;
use super::gate;
use super::retry::RetryPolicy;

/// Errors in a pipeline definition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// Stage list is empty
    #[error("pipeline has no stages")]
    Empty,

    /// A stage appears where another kind is required
    #[error("step '{id}' is a {found} stage but {expected} is required at position {position}")]
    OutOfOrder {
        /// Step id at the offending position
        id: String,
        /// Kind found
        found: Stage,
        /// Kind required
        expected: Stage,
        /// 1-based position
        position: usize,
    },

    /// Required stage kind absent
    #[error("pipeline is missing the {0} stage")]
    Missing(Stage),

    /// Extra step after deploy
    #[error("unexpected step '{0}' after the deploy stage")]
    Trailing(String),

    /// Two steps share an id
    #[error("duplicate step id '{0}'")]
    DuplicateId(String),

    /// Step id is blank
    #[error("step at position {0} has an empty id")]
    EmptyId(usize),
}

/// Validate that `stages` lists every stage exactly once in canonical order
pub fn validate_stages(stages: &[StageSpec]) -> Result<(), PipelineError> {
    if stages.is_empty() {
        return Err(PipelineError::Empty);
    }

    let mut ids = HashSet::new();
    for (i, spec) in stages.iter().enumerate() {
        if spec.id.trim().is_empty() {
            return Err(PipelineError::EmptyId(i + 1));
        }
        if !ids.insert(spec.id.as_str()) {
            return Err(PipelineError::DuplicateId(spec.id.clone()));
        }
    }

    for (i, expected) in Stage::ORDER.iter().enumerate() {
        let Some(spec) = stages.get(i) else {
            return Err(PipelineError::Missing(*expected));
        };
        if spec.kind != *expected {
            return Err(PipelineError::OutOfOrder {
                id: spec.id.clone(),
                found: spec.kind,
                expected: *expected,
                position: i + 1,
            });
        }
    }

    match stages.get(Stage::ORDER.len()) {
        Some(extra) => Err(PipelineError::Trailing(extra.id.clone())),
        None => Ok(()),
    }
}

/// Cooperative cancellation flag, checked between stages
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// New, not-cancelled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// External collaborators a pipeline drives
#[derive(Clone)]
pub struct Collaborators {
    /// Image builder
    pub builder: Arc<dyn Builder>,
    /// Partitioned registry
    pub store: Arc<dyn ArtifactStore>,
    /// Vulnerability scanner
    pub scanner: Arc<dyn Scanner>,
    /// Attestor (signer + attestation store)
    pub attestor: Attestor,
    /// Deploy-time admission check
    pub admission: Arc<dyn AdmissionController>,
    /// Runtime
    pub deployer: Arc<dyn Deployer>,
    /// Time source
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").field("attestor", &self.attestor).finish_non_exhaustive()
    }
}

/// Per-pipeline settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Staging repository the artifact is built into
    pub repository: String,
    /// Production repository artifacts are promoted into
    pub production_repository: String,
    /// Tag for the built artifact
    pub tag: String,
    /// Build context directory
    pub context: PathBuf,
    /// Key version the attestor signs with
    pub signing_key: KeyRef,
    /// Total time to wait for scan results
    pub scan_timeout_ms: u64,
    /// Delay between scan polls
    pub scan_poll_interval_ms: u64,
    /// Retry budget for scanner calls
    pub scan_retry: RetryPolicy,
    /// Retry budget for unreachable signing backends
    pub sign_retry: RetryPolicy,
}

enum Step {
    Continue,
    Blocked(BlockReason),
}

#[derive(Default)]
struct RunContext {
    artifact: Option<Artifact>,
    findings: Option<Vec<Finding>>,
    policy: Option<Policy>,
    gate_passed: bool,
    attestation: Option<Attestation>,
    promoted: Option<Artifact>,
    deployment: Option<Deployment>,
}

/// A validated pipeline ready to run
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<StageSpec>,
    deps: Collaborators,
    settings: RunSettings,
}

impl Pipeline {
    /// Create a pipeline, validating the stage list
    pub fn new(
        stages: Vec<StageSpec>,
        deps: Collaborators,
        settings: RunSettings,
    ) -> Result<Self, PipelineError> {
        validate_stages(&stages)?;
        Ok(Self { stages, deps, settings })
    }

    /// Declared stages
    #[must_use]
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Execute one run to a terminal state
    ///
    /// The policy is snapshotted when the gate runs; updates made to
    /// `policy` after that point do not affect this run.
    pub fn run(
        &self,
        run_id: &str,
        policy: &SharedPolicy,
        permissions: &Permissions,
        cancel: &CancelToken,
    ) -> RunReport {
        let mut ctx = RunContext::default();
        let mut completed = Vec::new();

        info!("[{run_id}] Starting pipeline for {}:{}", self.settings.repository, self.settings.tag);
        let state = self.drive(run_id, &mut ctx, &mut completed, policy, permissions, cancel);
        match &state {
            RunState::Succeeded => info!("[{run_id}] {state}"),
            RunState::Blocked(reason) => warn!("[{run_id}] Blocked: {reason}"),
            RunState::Failed { message, .. } => error!("[{run_id}] {state}: {message}"),
            RunState::Cancelled { .. } => warn!("[{run_id}] {state}"),
        }

        RunReport {
            run_id: run_id.to_string(),
            state,
            artifact: ctx.artifact,
            findings: ctx.findings.map_or(0, |f| f.len()),
            attestation: ctx.attestation,
            deployment: ctx.deployment,
            completed,
        }
    }

    fn drive(
        &self,
        run_id: &str,
        ctx: &mut RunContext,
        completed: &mut Vec<StageRecord>,
        policy: &SharedPolicy,
        permissions: &Permissions,
        cancel: &CancelToken,
    ) -> RunState {
        for spec in &self.stages {
            if cancel.is_cancelled() {
                return RunState::Cancelled {
                    after: completed.last().map(|r: &StageRecord| r.stage),
                };
            }

            info!("[{run_id}] Step '{}' ({})", spec.id, spec.kind);
            let started = self.deps.clock.now_ms();

            match self.execute(spec, ctx, policy, permissions) {
                Ok(Step::Continue) => {
                    let elapsed_ms = self.deps.clock.now_ms().saturating_sub(started);
                    debug!("[{run_id}] Step '{}' done in {elapsed_ms} ms", spec.id);
                    completed.push(StageRecord {
                        id: spec.id.clone(),
                        stage: spec.kind,
                        elapsed_ms,
                    });
                },
                Ok(Step::Blocked(reason)) => return RunState::Blocked(reason),
                Err(e) => {
                    return RunState::Failed {
                        stage: spec.kind,
                        reason: e.kind().to_string(),
                        message: e.to_string(),
                    };
                },
            }
        }

        RunState::Succeeded
    }

    fn execute(
        &self,
        spec: &StageSpec,
        ctx: &mut RunContext,
        policy: &SharedPolicy,
        permissions: &Permissions,
    ) -> Result<Step, StageError> {
        match spec.kind {
            Stage::Build => self.build(spec, ctx),
            Stage::Push => {
                require(permissions, Capability::Push)?;
                self.push(ctx)
            },
            Stage::Scan => self.scan(ctx),
            Stage::Gate => Ok(Self::gate(ctx, policy)),
            Stage::Attest => {
                require(permissions, Capability::Sign)?;
                self.attest(ctx)
            },
            Stage::Promote => {
                require(permissions, Capability::Promote)?;
                self.promote(ctx)
            },
            Stage::Deploy => {
                require(permissions, Capability::Deploy)?;
                self.deploy(ctx)
            },
        }
    }

    fn build(&self, spec: &StageSpec, ctx: &mut RunContext) -> Result<Step, StageError> {
        let request = BuildRequest {
            repository: self.settings.repository.clone(),
            tag: self.settings.tag.clone(),
            context: self.settings.context.clone(),
            args: spec.args.clone(),
        };
        let artifact =
            self.deps.builder.build(&request).map_err(|e| StageError::Build(format!("{e:#}")))?;
        info!("Built {}", artifact.reference());
        ctx.artifact = Some(artifact);
        Ok(Step::Continue)
    }

    fn push(&self, ctx: &RunContext) -> Result<Step, StageError> {
        let artifact = built(ctx)?;
        self.deps
            .store
            .put(Partition::Staging, artifact)
            .map_err(|e| StageError::Push(format!("{e:#}")))?;
        info!("Pushed {} to {}", artifact.reference(), Partition::Staging);
        Ok(Step::Continue)
    }

    fn scan(&self, ctx: &mut RunContext) -> Result<Step, StageError> {
        let reference = built(ctx)?.reference();
        let clock = self.deps.clock.as_ref();
        let retry = &self.settings.scan_retry;

        let started = clock.now_ms();
        let deadline = started.saturating_add(self.settings.scan_timeout_ms);
        let timed_out = |waited_ms: u64| StageError::Timeout { waited_ms };
        let scan_failed = |e: ScanError| {
            let now = clock.now_ms();
            if e.is_transient() && now >= deadline {
                timed_out(now.saturating_sub(started))
            } else {
                StageError::ScanUnavailable(e)
            }
        };

        let scan_id = retry
            .run_until(clock, deadline, "scan", ScanError::is_transient, || {
                self.deps.scanner.scan(&reference)
            })
            .map_err(scan_failed)?;
        debug!("Scan {scan_id} started for {reference}");

        loop {
            let status = retry
                .run_until(clock, deadline, "list findings", ScanError::is_transient, || {
                    self.deps.scanner.list_findings(&scan_id)
                })
                .map_err(scan_failed)?;

            if let ScanStatus::Complete(findings) = status {
                info!("Scan {scan_id} reported {} finding(s)", findings.len());
                ctx.findings = Some(findings);
                return Ok(Step::Continue);
            }

            let now = clock.now_ms();
            if now >= deadline {
                return Err(timed_out(now.saturating_sub(started)));
            }
            let wait = self.settings.scan_poll_interval_ms.clamp(1, deadline - now);
            debug!("Scan {scan_id} pending, polling again in {wait} ms");
            clock.sleep(Duration::from_millis(wait));
        }
    }

    fn gate(ctx: &mut RunContext, policy: &SharedPolicy) -> Step {
        let snapshot = policy.snapshot();
        let findings = ctx.findings.as_deref().unwrap_or_default();
        let decision = gate::evaluate(findings, snapshot.threshold);
        ctx.policy = Some(snapshot);

        match decision {
            GateDecision::Allow => {
                ctx.gate_passed = true;
                Step::Continue
            },
            GateDecision::Block(reason) => Step::Blocked(reason),
        }
    }

    fn attest(&self, ctx: &mut RunContext) -> Result<Step, StageError> {
        if !ctx.gate_passed {
            return Err(StageError::Precondition("gate has not allowed this artifact".into()));
        }
        let artifact = built(ctx)?;
        let key = &self.settings.signing_key;

        let attestation = self.settings.sign_retry.run(
            self.deps.clock.as_ref(),
            "attest",
            |e: &StageError| matches!(e, StageError::Signing(s) if s.is_transient()),
            || self.deps.attestor.attest(artifact, key),
        )?;

        ctx.attestation = Some(attestation);
        Ok(Step::Continue)
    }

    fn promote(&self, ctx: &mut RunContext) -> Result<Step, StageError> {
        if ctx.attestation.is_none() {
            return Err(StageError::Precondition("artifact has no attestation".into()));
        }
        let artifact = built(ctx)?;
        let promoted = self
            .deps
            .store
            .promote(artifact, &self.settings.production_repository)
            .map_err(|e| StageError::Promote(format!("{e:#}")))?;

        info!("Promoted {} to {}", promoted.reference(), Partition::Production);
        ctx.promoted = Some(promoted);
        Ok(Step::Continue)
    }

    fn deploy(&self, ctx: &mut RunContext) -> Result<Step, StageError> {
        let promoted = ctx
            .promoted
            .as_ref()
            .ok_or_else(|| StageError::Precondition("artifact was not promoted".into()))?;
        let policy = ctx
            .policy
            .as_ref()
            .ok_or_else(|| StageError::Precondition("no policy snapshot".into()))?;

        let decision = self
            .deps
            .admission
            .authorize(&promoted.digest, policy)
            .map_err(|e| StageError::Deploy(format!("admission check failed: {e:#}")))?;
        if let AdmissionDecision::Deny(reason) = decision {
            return Err(StageError::PolicyViolation(reason));
        }

        let deployment = self
            .deps
            .deployer
            .deploy(promoted)
            .map_err(|e| StageError::Deploy(format!("{e:#}")))?;
        info!("Deployed {} as {} revision {}", deployment.image, deployment.service, deployment.revision);
        ctx.deployment = Some(deployment);
        Ok(Step::Continue)
    }
}

fn require(permissions: &Permissions, capability: Capability) -> Result<(), StageError> {
    if permissions.allows(capability) {
        Ok(())
    } else {
        Err(StageError::PermissionDenied(capability))
    }
}

fn built(ctx: &RunContext) -> Result<&Artifact, StageError> {
    ctx.artifact
        .as_ref()
        .ok_or_else(|| StageError::Precondition("no artifact has been built".into()))
}
