//! Attestation inspection

use std::path::Path;

use vulngate::core::models::Digest;
use vulngate::core::ports::AttestationStore;
use vulngate::core::services::verify_attestation;
use vulngate::output::{AttestationInfo, AttestationListResult, OutputMode};
use vulngate::project::Project;

use crate::cli::AttestationAction;

/// Handle attestation subcommands
pub fn attestations(
    config_path: &Path,
    action: AttestationAction,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let project = Project::open(config_path)?;

    match action {
        AttestationAction::List { digest } => {
            let digest = Digest::parse(&digest)?;
            let signer = project.signer();
            let attestations = project
                .attestation_store()
                .list(&digest)?
                .into_iter()
                .map(|attestation| {
                    let valid = verify_attestation(&signer, &attestation).ok();
                    AttestationInfo { attestation, valid }
                })
                .collect();

            AttestationListResult { digest, attestations }.render(mode);
        },
    }
    Ok(())
}
