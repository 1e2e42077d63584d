//! Output formatting for human and JSON modes
//!
//! This module provides structured output that can be rendered either as
//! human-readable text or machine-parseable JSON.

use colored::Colorize;
use serde::Serialize;

use crate::adapters::KeyInfo;
use crate::core::models::{
    AdmissionDecision, Attestation, Digest, GateDecision, RunReport, RunState, Severity,
};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

/// Result of a pipeline run
#[derive(Debug, Serialize)]
pub struct RunResult {
    /// The finished run
    #[serde(flatten)]
    pub report: RunReport,
    /// Process exit code
    pub exit_code: i32,
}

impl From<RunReport> for RunResult {
    fn from(report: RunReport) -> Self {
        let exit_code = report.exit_code();
        Self { report, exit_code }
    }
}

impl RunResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        let report = &self.report;
        println!("Run {}\n", report.run_id);

        for record in &report.completed {
            println!("  {} {:<8} {} ms", "ok".green(), record.stage, record.elapsed_ms);
        }
        if !report.completed.is_empty() {
            println!();
        }

        if let Some(artifact) = &report.artifact {
            println!("Artifact:  {}", artifact.reference());
            println!("Findings:  {}", report.findings);
        }
        if let Some(attestation) = &report.attestation {
            println!(
                "Attested:  by {} with {}",
                attestation.attestor, attestation.key_version
            );
        }
        if let Some(deployment) = &report.deployment {
            println!("Deployed:  {} revision {}", deployment.service, deployment.revision);
        }
        println!();

        match &report.state {
            RunState::Succeeded => println!("{}", "SUCCEEDED".green().bold()),
            RunState::Blocked(reason) => {
                println!("{}: {reason}", "BLOCKED".red().bold());
                for offense in &reason.offending {
                    println!("  [{}] {} in {}", offense.severity, offense.cve_id, offense.package);
                }
            },
            RunState::Failed { stage, reason, message } => {
                println!("{} at {stage} ({reason}): {message}", "FAILED".red().bold());
            },
            RunState::Cancelled { .. } => println!("{}", report.state.to_string().yellow().bold()),
        }
    }
}

/// Result of evaluating a findings file against a threshold
#[derive(Debug, Serialize)]
pub struct GateResult {
    /// Threshold applied
    pub threshold: Severity,
    /// Number of findings evaluated
    pub findings: usize,
    /// The gate's decision
    pub decision: GateDecision,
}

impl GateResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        println!("Evaluated {} finding(s) at threshold {}\n", self.findings, self.threshold);
        match &self.decision {
            GateDecision::Allow => println!("{}", "ALLOW".green().bold()),
            GateDecision::Block(reason) => {
                println!("{}: {} offending finding(s)", "BLOCK".red().bold(), reason.offending.len());
                for offense in &reason.offending {
                    println!("  [{}] {} in {}", offense.severity, offense.cve_id, offense.package);
                }
            },
        }
    }
}

/// Result of a key listing
#[derive(Debug, Serialize)]
pub struct KeyListResult {
    /// Key versions, oldest first
    pub keys: Vec<KeyInfo>,
}

impl KeyListResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        if self.keys.is_empty() {
            println!("No key versions found.");
            return;
        }

        println!("Key versions:\n");
        for k in &self.keys {
            println!("  {}  [{}]  {}", k.key, k.state, k.algorithm);
            println!("  created {}\n", k.created_at);
        }
    }
}

/// An attestation with its verification status
#[derive(Debug, Serialize)]
pub struct AttestationInfo {
    /// The stored record
    #[serde(flatten)]
    pub attestation: Attestation,
    /// Whether the signature verifies; `None` if verification errored
    pub valid: Option<bool>,
}

/// Result of an attestation listing
#[derive(Debug, Serialize)]
pub struct AttestationListResult {
    /// Digest queried
    pub digest: Digest,
    /// Attestations for the digest
    pub attestations: Vec<AttestationInfo>,
}

impl AttestationListResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => print_json(self),
        }
    }

    fn render_human(&self) {
        if self.attestations.is_empty() {
            println!("No attestations for {}.", self.digest);
            return;
        }

        println!("Attestations for {}:\n", self.digest);
        for info in &self.attestations {
            let status = match info.valid {
                Some(true) => "valid".green(),
                Some(false) => "INVALID".red(),
                None => "unverifiable".yellow(),
            };
            println!("  {}  [{status}]", info.attestation.attestor);
            println!("  key {}  created {}\n", info.attestation.key_version, info.attestation.created_at);
        }
    }
}

/// Result of an admission check
#[derive(Debug, Serialize)]
pub struct AdmissionResult {
    /// Digest checked
    pub digest: Digest,
    /// Controller decision
    #[serde(flatten)]
    pub decision: AdmissionDecision,
}

impl AdmissionResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => match &self.decision {
                AdmissionDecision::Allow => {
                    println!("{} {}", "ALLOW".green().bold(), self.digest);
                },
                AdmissionDecision::Deny(reason) => {
                    println!("{} {}: {reason}", "DENY".red().bold(), self.digest);
                },
            },
            OutputMode::Json => print_json(self),
        }
    }
}

/// Generic operation result for simple commands
#[derive(Debug, Serialize)]
pub struct OperationResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable message
    pub message: String,
}

impl OperationResult {
    /// Render the result based on output mode
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => println!("{}", self.message),
            OutputMode::Json => print_json(self),
        }
    }
}
