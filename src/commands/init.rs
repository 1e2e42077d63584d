//! Initialize vulngate in a directory

use std::fs;
use std::path::Path;

use vulngate::config::PipelineConfig;
use vulngate::output::{OperationResult, OutputMode};
use vulngate::paths;

/// Write a default `vulngate.toml` and create the local state directory
pub fn init(config_path: &Path, force: bool, mode: OutputMode) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        OperationResult {
            success: false,
            message: format!(
                "Already initialized ({} exists). Use --force to reinitialize.",
                config_path.display()
            ),
        }
        .render(mode);
        return Ok(());
    }

    let root = config_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let config = PipelineConfig::default();
    config.save(config_path)?;

    let state = paths::state_dir(root);
    fs::create_dir_all(paths::scans_dir(root))?;
    fs::write(state.join(".gitignore"), "*\n")?;

    let message = if mode == OutputMode::Json {
        format!("Initialized {}", config_path.display())
    } else {
        format!(
            "Initialized vulngate\n\n  Created {}\n  Created {}/\n\nNext steps:\n  \
             vulngate keys create          # signing key {}\n  \
             vulngate run                  # reports are read from {}/<digest>.json",
            config_path.display(),
            paths::STATE_DIR,
            config.attestor.key,
            config.report_dir(Path::new("")).display(),
        )
    };
    OperationResult { success: true, message }.render(mode);
    Ok(())
}
