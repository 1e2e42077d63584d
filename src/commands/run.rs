//! Run the pipeline once

use std::path::Path;

use chrono::Utc;

use vulngate::core::models::{Severity, SharedPolicy};
use vulngate::core::services::CancelToken;
use vulngate::output::{OutputMode, RunResult};
use vulngate::project::Project;

/// Run the configured pipeline and return the run's exit code
pub fn run_pipeline(
    config_path: &Path,
    run_id: Option<String>,
    threshold: Option<&str>,
    mode: OutputMode,
) -> anyhow::Result<i32> {
    let project = Project::open(config_path)?;
    let pipeline = project.pipeline()?;

    let mut policy = project.config().policy.clone();
    if let Some(threshold) = threshold {
        policy.threshold = threshold.parse::<Severity>().map_err(anyhow::Error::msg)?;
    }
    let policy = SharedPolicy::new(policy);

    let run_id = run_id.unwrap_or_else(|| format!("run-{}", Utc::now().format("%Y%m%dT%H%M%S%.3f")));
    let report = pipeline.run(&run_id, &policy, &project.config().permissions, &CancelToken::new());

    let result = RunResult::from(report);
    result.render(mode);
    Ok(result.exit_code)
}
