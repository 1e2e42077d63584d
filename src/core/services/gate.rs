//! Severity gate - decides whether findings allow an artifact through
//!
//! This module contains pure decision logic with no I/O dependencies.

use crate::core::models::{BlockReason, Finding, GateDecision, Offense, Severity};

/// Evaluate scan findings against a severity threshold
///
/// Decision rules:
/// - No findings: allow
/// - Any finding whose effective severity is `>= threshold`: block
/// - Any finding whose severity cannot be parsed: block (fail closed)
///
/// # Arguments
///
/// * `findings` - Findings reported for one artifact
/// * `threshold` - Lowest severity that blocks
///
/// # Returns
///
/// `GateDecision::Block` listing every offending finding, or
/// `GateDecision::Allow`
#[must_use]
pub fn evaluate(findings: &[Finding], threshold: Severity) -> GateDecision {
    let offending: Vec<Offense> = findings
        .iter()
        .filter(|f| f.effective_level().is_none_or(|level| level >= threshold))
        .map(|f| Offense {
            cve_id: f.cve_id.clone(),
            package: f.package.clone(),
            severity: f.reported_severity().to_string(),
        })
        .collect();

    if offending.is_empty() {
        GateDecision::Allow
    } else {
        GateDecision::Block(BlockReason { threshold, offending })
    }
}
