//! Vulnerability scanner port
//!
//! Scanning is asynchronous: `scan` starts (or looks up) a scan and
//! `list_findings` is polled until results are ready.

use crate::core::error::ScanError;
use crate::core::models::{ArtifactRef, Finding};

/// Handle for an in-progress or finished scan
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScanId(pub String);

impl std::fmt::Display for ScanId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Poll result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    /// Results not yet available
    Pending,
    /// Scan finished with these findings
    Complete(Vec<Finding>),
}

/// External vulnerability scanner
pub trait Scanner: Send + Sync {
    /// Start a scan of the referenced artifact
    fn scan(&self, artifact: &ArtifactRef) -> Result<ScanId, ScanError>;

    /// Fetch findings for a scan
    fn list_findings(&self, scan: &ScanId) -> Result<ScanStatus, ScanError>;
}
