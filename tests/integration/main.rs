//! Integration tests for vulngate CLI
//!
//! These tests drive the binary in a temporary project directory, with a
//! private keyring, through the full cycle of:
//! init → keys create → run (blocked / succeeded) → authorize


use assert_cmd::cargo;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper function to create a vulngate command
fn vulngate() -> assert_cmd::Command {
    assert_cmd::Command::new(cargo::cargo_bin!("vulngate"))
}

/// A project directory plus a keyring kept outside it
struct Workspace {
    project: TempDir,
    keyring: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("Dockerfile"), "FROM scratch\nCOPY app /app\n").unwrap();
        fs::write(project.path().join("app"), "#!/bin/sh\necho auth\n").unwrap();
        Self {
            project,
            keyring: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.project.path()
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = vulngate();
        cmd.current_dir(self.path()).env("VULNGATE_KEYRING_DIR", self.keyring.path());
        cmd
    }

    /// `init`, shorten the scan timeout, create the signing key
    fn init(&self) {
        self.cmd().arg("init").assert().success();

        let config_path = self.path().join("vulngate.toml");
        let config = fs::read_to_string(&config_path).unwrap();
        assert!(config.contains("timeout_secs = 60"));
        fs::write(&config_path, config.replace("timeout_secs = 60", "timeout_secs = 1")).unwrap();

        self.cmd().args(["keys", "create"]).assert().success();
    }

    /// Run once without a report to learn the artifact digest
    fn digest(&self) -> String {
        let output = self.cmd().args(["--json", "run"]).output().unwrap();
        assert_eq!(output.status.code(), Some(1));
        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["state"]["reason"], "Timeout");
        report["artifact"]["digest"].as_str().unwrap().to_string()
    }

    fn write_report(&self, digest: &str, severities: &[&str]) {
        let findings: Vec<_> = severities
            .iter()
            .enumerate()
            .map(|(i, s)| {
                serde_json::json!({
                    "cve_id": format!("CVE-2024-{i:04}"),
                    "package": "openssl",
                    "severity": s
                })
            })
            .collect();
        let hex = digest.trim_start_matches("sha256:");
        let dir = self.path().join(".vulngate/scans");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(format!("{hex}.json")),
            serde_json::json!({ "findings": findings }).to_string(),
        )
        .unwrap();
    }
}

// =============================================================================
// INIT
// =============================================================================

#[test]
fn test_init_creates_config() {
    let ws = Workspace::new();

    ws.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized vulngate"));

    assert!(ws.path().join("vulngate.toml").exists());
    assert!(ws.path().join(".vulngate/scans").is_dir());

    ws.cmd()
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Already initialized"));
}

#[test]
fn test_run_without_init_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("vulngate init"));
}

// =============================================================================
// END-TO-END PIPELINE
// =============================================================================

#[test]
fn test_e2e_clean_scan_deploys() {
    let ws = Workspace::new();
    ws.init();
    let digest = ws.digest();

    ws.write_report(&digest, &["LOW", "MEDIUM"]);
    ws.cmd()
        .arg("run")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("SUCCEEDED"))
        .stdout(predicate::str::contains("auth-service"));

    ws.cmd()
        .args(["authorize", digest.as_str()])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("ALLOW"));

    ws.cmd()
        .args(["--json", "attestations", "list", digest.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"valid\": true"))
        .stdout(predicate::str::contains("vulnz-attestor"));

    assert!(ws.path().join(".vulngate/deployments/auth-service.json").exists());
}

#[test]
fn test_e2e_critical_finding_blocks() {
    let ws = Workspace::new();
    ws.init();
    let digest = ws.digest();

    ws.write_report(&digest, &["LOW", "CRITICAL"]);
    ws.cmd()
        .arg("run")
        .assert()
        .code(2)
        .stdout(predicate::str::contains("BLOCKED"))
        .stdout(predicate::str::contains("CVE-2024-0001"))
        .stdout(predicate::str::contains("openssl"));

    ws.cmd()
        .args(["authorize", digest.as_str()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("DENY"));

    ws.cmd()
        .args(["attestations", "list", digest.as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("No attestations"));
}

#[test]
fn test_e2e_threshold_override() {
    let ws = Workspace::new();
    ws.init();
    let digest = ws.digest();
    ws.write_report(&digest, &["HIGH"]);

    ws.cmd().args(["run", "--threshold", "high"]).assert().code(2);
    ws.cmd().arg("run").assert().code(0);
}

#[test]
fn test_e2e_destroyed_key_fails_attest() {
    let ws = Workspace::new();
    ws.init();
    let digest = ws.digest();
    ws.write_report(&digest, &["LOW"]);

    ws.cmd().args(["keys", "destroy", "binauthz/vulnz-signer/1"]).assert().success();

    let output = ws.cmd().args(["--json", "run"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["state"]["stage"], "attest");
    assert_eq!(report["state"]["reason"], "SigningError");
}

// =============================================================================
// OFFLINE GATE
// =============================================================================

#[test]
fn test_gate_command() {
    let ws = Workspace::new();
    let report = ws.path().join("report.json");
    fs::write(
        &report,
        r#"{"findings":[{"cve_id":"CVE-2023-1","package":"zlib","severity":"HIGH","effective_severity":"LOW"}]}"#,
    )
    .unwrap();

    ws.cmd()
        .args(["gate", "--findings", "report.json"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("ALLOW"));

    ws.cmd()
        .args(["gate", "--findings", "report.json", "--threshold", "low"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("CVE-2023-1"));

    ws.cmd()
        .args(["gate", "--findings", "report.json", "--threshold", "severe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid severity"));
}

#[test]
fn test_version_json() {
    vulngate()
        .args(["--json", "version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\""));
}
