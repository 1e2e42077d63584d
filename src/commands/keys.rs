//! Signing key management

use std::path::Path;

use vulngate::adapters::KeyringSigner;
use vulngate::config::PipelineConfig;
use vulngate::core::models::KeyRef;
use vulngate::output::{KeyListResult, OperationResult, OutputMode};

use crate::cli::KeyAction;

/// Handle key subcommands
pub fn keys(config_path: &Path, action: KeyAction, mode: OutputMode) -> anyhow::Result<()> {
    let (config, root) = load_or_default(config_path)?;
    let signer = KeyringSigner::new(&config.keyring_dir(root));
    let configured = &config.attestor.key;

    match action {
        KeyAction::Create { keyring, key } => {
            let keyring = keyring.as_deref().unwrap_or(&configured.keyring);
            let key = key.as_deref().unwrap_or(&configured.key);
            let created = signer.create_version(keyring, key)?;
            OperationResult {
                success: true,
                message: format!("Created key version {created} in {}", signer.dir().display()),
            }
            .render(mode);
        },
        KeyAction::List { keyring, key } => {
            let keyring = keyring.as_deref().unwrap_or(&configured.keyring);
            let key = key.as_deref().unwrap_or(&configured.key);
            KeyListResult {
                keys: signer.list(keyring, key)?,
            }
            .render(mode);
        },
        KeyAction::Disable { key } => {
            let key = KeyRef::parse(&key)?;
            signer.disable(&key)?;
            done(&format!("Disabled {key}"), mode);
        },
        KeyAction::Enable { key } => {
            let key = KeyRef::parse(&key)?;
            signer.enable(&key)?;
            done(&format!("Enabled {key}"), mode);
        },
        KeyAction::Destroy { key } => {
            let key = KeyRef::parse(&key)?;
            signer.destroy(&key)?;
            done(&format!("Destroyed {key}"), mode);
        },
    }
    Ok(())
}

fn done(message: &str, mode: OutputMode) {
    OperationResult {
        success: true,
        message: message.to_string(),
    }
    .render(mode);
}

/// Key commands work before `init`, falling back to defaults
fn load_or_default(config_path: &Path) -> anyhow::Result<(PipelineConfig, &Path)> {
    let root = config_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let config = if config_path.exists() {
        PipelineConfig::load(config_path)?
    } else {
        PipelineConfig::default()
    };
    Ok((config, root))
}
