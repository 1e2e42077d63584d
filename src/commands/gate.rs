//! Evaluate a scan report without running the pipeline

use std::fs;
use std::path::Path;

use anyhow::Context;

use vulngate::adapters::parse_report;
use vulngate::config::PipelineConfig;
use vulngate::core::models::{Digest, Severity};
use vulngate::core::services::evaluate;
use vulngate::output::{GateResult, OutputMode};

/// Exit code when the gate blocks
const BLOCKED: i32 = 2;

/// Judge a report file and return 0 for allow, 2 for block
pub fn gate(
    config_path: &Path,
    findings_path: &Path,
    threshold: Option<&str>,
    mode: OutputMode,
) -> anyhow::Result<i32> {
    let threshold = match threshold {
        Some(t) => t.parse::<Severity>().map_err(anyhow::Error::msg)?,
        None if config_path.exists() => PipelineConfig::load(config_path)?.policy.threshold,
        None => Severity::default(),
    };

    let content = fs::read(findings_path)
        .with_context(|| format!("Failed to read {}", findings_path.display()))?;

    // Reports are named after the artifact digest; fall back to a content digest
    let digest = findings_path
        .file_stem()
        .and_then(|s| Digest::parse(&format!("sha256:{}", s.to_string_lossy())).ok())
        .unwrap_or_else(|| Digest::from_bytes(&content));

    let findings = parse_report(&content, &digest)
        .with_context(|| format!("Failed to parse {}", findings_path.display()))?;
    let decision = evaluate(&findings, threshold);
    let code = if decision.is_allow() { 0 } else { BLOCKED };

    GateResult {
        threshold,
        findings: findings.len(),
        decision,
    }
    .render(mode);
    Ok(code)
}
