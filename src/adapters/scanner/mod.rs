//! Report-directory scanner
//!
//! An external scanner (Trivy, Grype, a CI job) drops one report per
//! artifact at `<report_dir>/<digest-hex>.json`:
//!
//! ```json
//! {"findings": [{"cve_id": "CVE-2023-1", "package": "openssl",
//!                "severity": "HIGH", "effective_severity": "MEDIUM"}]}
//! ```
//!
//! Until that file exists the scan is pending.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::core::error::ScanError;
use crate::core::models::{ArtifactRef, Digest, Finding};
use crate::core::ports::{ScanId, ScanStatus, Scanner};

#[derive(Debug, Deserialize)]
struct Report {
    #[serde(default)]
    findings: Vec<ReportEntry>,
}

#[derive(Debug, Deserialize)]
struct ReportEntry {
    cve_id: String,
    #[serde(default)]
    package: String,
    severity: String,
    #[serde(default)]
    effective_severity: String,
}

/// Scanner that reads reports from a directory
#[derive(Debug, Clone)]
pub struct ReportScanner {
    dir: PathBuf,
}

impl ReportScanner {
    /// Create a scanner over `dir`
    #[must_use]
    pub fn new(dir: &Path) -> Self {
        Self { dir: dir.to_path_buf() }
    }

    /// Where the report for `digest` is expected
    #[must_use]
    pub fn report_path(&self, digest: &Digest) -> PathBuf {
        self.dir.join(format!("{}.json", digest.hex()))
    }
}

impl Scanner for ReportScanner {
    fn scan(&self, artifact: &ArtifactRef) -> Result<ScanId, ScanError> {
        if self.dir.exists() && !self.dir.is_dir() {
            return Err(ScanError::Unavailable(format!(
                "report location {} is not a directory",
                self.dir.display()
            )));
        }
        debug!("Awaiting report for {artifact}");
        Ok(ScanId(artifact.digest.to_string()))
    }

    fn list_findings(&self, scan: &ScanId) -> Result<ScanStatus, ScanError> {
        let digest = Digest::parse(&scan.0).map_err(|e| ScanError::Malformed(e.to_string()))?;
        let path = self.report_path(&digest);

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ScanStatus::Pending),
            Err(e) => {
                return Err(ScanError::Unavailable(format!("{}: {e}", path.display())));
            },
        };

        let findings = parse_report(&content, &digest)
            .map_err(|e| ScanError::Malformed(format!("{}: {e}", path.display())))?;
        Ok(ScanStatus::Complete(findings))
    }
}

/// Parse a report body into findings against `digest`
pub fn parse_report(content: &[u8], digest: &Digest) -> serde_json::Result<Vec<Finding>> {
    let report: Report = serde_json::from_slice(content)?;
    Ok(report
        .findings
        .into_iter()
        .map(|entry| Finding {
            artifact_digest: digest.clone(),
            cve_id: entry.cve_id,
            severity: entry.severity,
            package: entry.package,
            effective_severity: entry.effective_severity,
        })
        .collect())
}
