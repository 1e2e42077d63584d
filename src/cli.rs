//! CLI definitions and entry point

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands;
use vulngate::output::OutputMode;
use vulngate::paths;

/// vulngate - Build, scan, attest and deploy behind a severity gate
#[derive(Parser, Debug)]
#[command(
    name = "vulngate",
    version,
    about = "Gated build-sign-deploy pipeline",
    long_about = "Build an image, scan it, and only sign, promote and deploy it\n\
                  when no finding meets the policy's severity threshold.\n\n\
                  Deploys are admitted only with a valid attestation from\n\
                  every attestor the policy requires."
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output in JSON format (machine-readable)
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to the pipeline configuration
    #[arg(short, long, global = true, default_value = paths::CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create vulngate.toml and local state in the current directory
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Run the pipeline once
    Run {
        /// Run identifier (defaults to a timestamp)
        #[arg(long)]
        run_id: Option<String>,

        /// Override the policy threshold for this run
        #[arg(short, long)]
        threshold: Option<String>,
    },

    /// Evaluate a scan report against a threshold without running the pipeline
    Gate {
        /// Report file ({"findings": [...]})
        #[arg(short, long)]
        findings: PathBuf,

        /// Severity threshold (defaults to the configured policy)
        #[arg(short, long)]
        threshold: Option<String>,
    },

    /// Manage signing key versions
    Keys {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Inspect attestations
    Attestations {
        #[command(subcommand)]
        action: AttestationAction,
    },

    /// Ask the admission controller whether a digest may be deployed
    Authorize {
        /// Artifact digest (sha256:...)
        digest: String,
    },

    /// Show version
    Version,
}

#[derive(Subcommand, Debug)]
pub enum KeyAction {
    /// Create a new key version (defaults to the configured signing key)
    Create {
        /// Keyring name
        #[arg(long)]
        keyring: Option<String>,

        /// Key name
        #[arg(long)]
        key: Option<String>,
    },

    /// List key versions
    List {
        /// Keyring name
        #[arg(long)]
        keyring: Option<String>,

        /// Key name
        #[arg(long)]
        key: Option<String>,
    },

    /// Disable a key version (<keyring>/<key>/<version>)
    Disable {
        /// Key version reference
        key: String,
    },

    /// Re-enable a disabled key version
    Enable {
        /// Key version reference
        key: String,
    },

    /// Destroy a key version; its secret is wiped
    Destroy {
        /// Key version reference
        key: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum AttestationAction {
    /// List attestations for a digest and verify their signatures
    List {
        /// Artifact digest (sha256:...)
        digest: String,
    },
}

/// Run the CLI, returning the process exit code
pub fn run() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let config = cli.config.as_path();
    match cli.command {
        Some(Command::Init { force }) => commands::init(config, force, output_mode).map(|()| 0),
        Some(Command::Run { run_id, threshold }) => {
            commands::run_pipeline(config, run_id, threshold.as_deref(), output_mode)
        },
        Some(Command::Gate { findings, threshold }) => {
            commands::gate(config, &findings, threshold.as_deref(), output_mode)
        },
        Some(Command::Keys { action }) => commands::keys(config, action, output_mode).map(|()| 0),
        Some(Command::Attestations { action }) => {
            commands::attestations(config, action, output_mode).map(|()| 0)
        },
        Some(Command::Authorize { digest }) => commands::authorize(config, &digest, output_mode),
        Some(Command::Version) => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": vulngate::VERSION
                    })
                );
            } else {
                println!("vulngate v{}", vulngate::VERSION);
            }
            Ok(0)
        },
        None => {
            if output_mode == OutputMode::Json {
                println!(
                    "{}",
                    serde_json::json!({
                        "version": vulngate::VERSION,
                        "hint": "Use --help for usage"
                    })
                );
            } else {
                println!("vulngate v{}", vulngate::VERSION);
                println!("\nRun 'vulngate --help' for usage");
                println!("Run 'vulngate init' to get started");
            }
            Ok(0)
        },
    }
}
