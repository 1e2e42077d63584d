//! Vulnerability finding model
//!
//! Findings come from an external scanner, so severities are kept as the
//! strings the scanner reported. Interpretation happens in the gate.

use serde::{Deserialize, Serialize};

use super::{Digest, Severity};

/// One vulnerability reported against an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Digest of the scanned artifact
    pub artifact_digest: Digest,

    /// Vulnerability identifier (e.g., "CVE-2023-1234")
    pub cve_id: String,

    /// Severity as published upstream
    pub severity: String,

    /// Affected package name
    pub package: String,

    /// Severity after distro-specific adjustment; empty when the scanner
    /// did not provide one
    #[serde(default)]
    pub effective_severity: String,
}

impl Finding {
    /// Create a finding where effective severity equals base severity
    #[must_use]
    pub fn new(artifact_digest: Digest, cve_id: &str, package: &str, severity: &str) -> Self {
        Self {
            artifact_digest,
            cve_id: cve_id.to_string(),
            severity: severity.to_string(),
            package: package.to_string(),
            effective_severity: severity.to_string(),
        }
    }

    /// Override the effective severity
    #[must_use]
    pub fn with_effective(mut self, effective: &str) -> Self {
        self.effective_severity = effective.to_string();
        self
    }

    /// Severity string the gate should judge
    ///
    /// Falls back to the base severity when no effective severity was set.
    #[must_use]
    pub fn reported_severity(&self) -> &str {
        if self.effective_severity.trim().is_empty() {
            &self.severity
        } else {
            &self.effective_severity
        }
    }

    /// Parsed effective severity, `None` when unknown
    #[must_use]
    pub fn effective_level(&self) -> Option<Severity> {
        self.reported_severity().parse().ok()
    }
}
