//! Deploy-time admission check

use std::path::Path;

use vulngate::core::models::{AdmissionDecision, Digest};
use vulngate::output::{AdmissionResult, OutputMode};
use vulngate::project::Project;

/// Exit code when admission is denied
const DENIED: i32 = 1;

/// Ask the admission controller about `digest` under the configured policy
pub fn authorize(config_path: &Path, digest: &str, mode: OutputMode) -> anyhow::Result<i32> {
    let project = Project::open(config_path)?;
    let digest = Digest::parse(digest)?;

    let deps = project.collaborators()?;
    let decision = deps.admission.authorize(&digest, &project.config().policy)?;
    let code = match decision {
        AdmissionDecision::Allow => 0,
        AdmissionDecision::Deny(_) => DENIED,
    };

    AdmissionResult { digest, decision }.render(mode);
    Ok(code)
}
