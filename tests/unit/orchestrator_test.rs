//! Tests for the pipeline orchestrator
//!
//! Each test drives the full stage list over the mock ports and checks
//! both the terminal state and what the collaborators saw.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use vulngate::core::error::{ScanError, SigningError};
use vulngate::core::models::{
    AdmissionDecision, ArtifactRef, Capability, KeyRef, Partition, Permissions, Policy, RunState,
    Severity, SharedPolicy, Stage,
};
use vulngate::core::ports::{Clock, ScanId, ScanStatus, Scanner, Signer};
use vulngate::core::services::{CancelToken, RetryPolicy};

use crate::common::fixtures::{ATTESTOR, Harness, PRODUCTION, policy, trusting_policy};
use crate::common::mocks::{FixedAdmission, MockScanner, MockSigner, ScanStep};

fn failed(state: &RunState) -> (Stage, &str) {
    match state {
        RunState::Failed { stage, reason, .. } => (*stage, reason.as_str()),
        other => panic!("expected failure, got {other}"),
    }
}

// =============================================================================
// Gate outcomes
// =============================================================================

#[test]
fn test_low_finding_under_critical_succeeds() {
    let h = Harness::new(MockScanner::with_severities(&["LOW"]));
    let report = h.run(Severity::Critical);

    assert_eq!(report.state, RunState::Succeeded);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.findings, 1);

    let stages: Vec<Stage> = report.completed.iter().map(|r| r.stage).collect();
    assert_eq!(stages, Stage::ORDER.to_vec());

    let artifact = report.artifact.as_ref().unwrap();
    assert_eq!(h.store.digests(Partition::Production), vec![artifact.digest.clone()]);
    assert!(report.attestation.is_some());

    let deployed = h.deployer.deployed.lock().unwrap();
    assert_eq!(deployed.len(), 1);
    assert_eq!(deployed[0].repository, PRODUCTION);
    assert_eq!(deployed[0].digest, artifact.digest);
}

#[test]
fn test_critical_finding_blocks_and_stays_in_staging() {
    let h = Harness::new(MockScanner::with_severities(&["LOW", "CRITICAL"]));
    let report = h.run(Severity::Critical);

    let RunState::Blocked(reason) = &report.state else {
        panic!("expected blocked, got {}", report.state);
    };
    assert_eq!(reason.offending.len(), 1);
    assert_eq!(reason.offending[0].severity, "CRITICAL");
    assert_ne!(report.exit_code(), 0);

    let digest = report.artifact.as_ref().unwrap().digest.clone();
    assert_eq!(h.store.digests(Partition::Staging), vec![digest]);
    assert!(h.store.digests(Partition::Production).is_empty());
    assert_eq!(h.signer.sign_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.attestations.count(), 0);
    assert!(!report.reached(Stage::Gate));
    assert!(report.reached(Stage::Scan));
}

#[test]
fn test_high_threshold_blocks_high_finding() {
    let h = Harness::new(MockScanner::with_severities(&["HIGH"]));
    assert!(matches!(h.run(Severity::High).state, RunState::Blocked(_)));

    let h = Harness::new(MockScanner::with_severities(&["HIGH"]));
    assert_eq!(h.run(Severity::Critical).state, RunState::Succeeded);
}

#[test]
fn test_no_findings_succeeds() {
    let h = Harness::new(MockScanner::with_severities(&[]));
    assert_eq!(h.run(Severity::Minimal).state, RunState::Succeeded);
}

// =============================================================================
// Scan failures
// =============================================================================

#[test]
fn test_scan_timeout_fails_without_attestation() {
    let h = Harness::new(MockScanner::never_ready());
    let report = h.run(Severity::Critical);

    assert_eq!(failed(&report.state), (Stage::Scan, "Timeout"));
    assert_eq!(report.exit_code(), 1);
    assert_eq!(h.attestations.count(), 0);
    assert!(h.clock.now_ms() >= h.settings.scan_timeout_ms);
    assert!(h.scanner.polls.load(Ordering::SeqCst) > 1);
}

#[test]
fn test_pending_then_ready_succeeds() {
    let h = Harness::new(MockScanner::new(vec![
        ScanStep::Pending,
        ScanStep::Pending,
        ScanStep::Findings(vec![("CVE-2024-0001", "zlib", "MEDIUM")]),
    ]));
    let report = h.run(Severity::Critical);

    assert_eq!(report.state, RunState::Succeeded);
    assert_eq!(h.scanner.polls.load(Ordering::SeqCst), 3);
    assert_eq!(h.clock.sleeps.load(Ordering::SeqCst), 2);
}

#[test]
fn test_scan_retries_stop_at_timeout() {
    let mut h = Harness::new(MockScanner::new(vec![
        ScanStep::Pending,
        ScanStep::Fail(ScanError::Unavailable("503".into())),
        ScanStep::Fail(ScanError::Unavailable("503".into())),
        ScanStep::Findings(vec![("CVE-2024-0001", "zlib", "LOW")]),
    ]));
    h.settings.scan_timeout_ms = 1_000;
    h.settings.scan_poll_interval_ms = 250;
    h.settings.scan_retry = RetryPolicy {
        max_attempts: 3,
        initial_backoff_ms: 20_000,
        max_backoff_ms: 20_000,
    };
    let report = h.run(Severity::Critical);

    assert_eq!(failed(&report.state), (Stage::Scan, "Timeout"));
    assert_eq!(h.clock.now_ms(), 1_000);
    assert_eq!(h.attestations.count(), 0);
}

#[test]
fn test_transient_scan_error_is_retried() {
    let h = Harness::new(MockScanner::new(vec![
        ScanStep::Fail(ScanError::Unavailable("503".into())),
        ScanStep::Findings(vec![("CVE-2024-0001", "zlib", "LOW")]),
    ]));
    assert_eq!(h.run(Severity::Critical).state, RunState::Succeeded);
}

#[test]
fn test_scan_unavailable_after_retries() {
    let h = Harness::new(MockScanner::new(vec![ScanStep::Fail(ScanError::Unavailable(
        "connection refused".into(),
    ))]));
    let report = h.run(Severity::Critical);

    assert_eq!(failed(&report.state), (Stage::Scan, "ScanUnavailable"));
    assert_eq!(h.scanner.polls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_malformed_scan_is_not_retried() {
    let h = Harness::new(MockScanner::new(vec![ScanStep::Fail(ScanError::Malformed(
        "bad json".into(),
    ))]));
    let report = h.run(Severity::Critical);

    assert_eq!(failed(&report.state).0, Stage::Scan);
    assert_eq!(h.scanner.polls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Signing failures
// =============================================================================

#[test]
fn test_signing_error_fails_attest_and_skips_promotion() {
    let key = KeyRef::new("binauthz", "vulnz-signer", 1);
    let h = Harness::with_signer(
        MockScanner::with_severities(&["LOW"]),
        MockSigner::failing(vec![SigningError::KeyDestroyed(key)]),
    );
    let report = h.run(Severity::Critical);

    assert_eq!(failed(&report.state), (Stage::Attest, "SigningError"));
    assert!(h.store.digests(Partition::Production).is_empty());
    assert!(h.deployer.deployed.lock().unwrap().is_empty());
    assert_eq!(h.signer.sign_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unreachable_signer_is_retried() {
    let h = Harness::with_signer(
        MockScanner::with_severities(&["LOW"]),
        MockSigner::failing(vec![SigningError::Unreachable("timeout".into())]),
    );
    let report = h.run(Severity::Critical);

    assert_eq!(report.state, RunState::Succeeded);
    assert_eq!(h.signer.sign_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unreachable_signer_gives_up() {
    let down = || SigningError::Unreachable("timeout".into());
    let h = Harness::with_signer(
        MockScanner::with_severities(&["LOW"]),
        MockSigner::failing(vec![down(), down(), down(), down()]),
    );
    let report = h.run(Severity::Critical);

    assert_eq!(failed(&report.state), (Stage::Attest, "SigningError"));
    assert_eq!(h.signer.sign_calls.load(Ordering::SeqCst), 3);
}

// =============================================================================
// Admission and permissions
// =============================================================================

#[test]
fn test_admission_deny_is_policy_violation() {
    let admission = Arc::new(FixedAdmission::new(AdmissionDecision::Deny("nope".into())));
    let h = Harness::new(MockScanner::with_severities(&["LOW"])).admission(admission);
    let report = h.run(Severity::Critical);

    assert_eq!(failed(&report.state), (Stage::Deploy, "PolicyViolation"));
    assert!(h.deployer.deployed.lock().unwrap().is_empty());
}

#[test]
fn test_missing_deploy_permission() {
    let h = Harness::new(MockScanner::with_severities(&["LOW"]));
    let permissions: Permissions =
        [Capability::Push, Capability::Sign, Capability::Promote].into_iter().collect();

    let report = h.pipeline().run("run-1", &policy(Severity::Critical), &permissions, &CancelToken::new());

    assert_eq!(failed(&report.state), (Stage::Deploy, "PermissionDenied"));
    assert!(h.deployer.deployed.lock().unwrap().is_empty());
}

#[test]
fn test_missing_sign_permission() {
    let h = Harness::new(MockScanner::with_severities(&["LOW"]));
    let permissions: Permissions = [Capability::Push].into_iter().collect();

    let report = h.pipeline().run("run-1", &policy(Severity::Critical), &permissions, &CancelToken::new());

    assert_eq!(failed(&report.state), (Stage::Attest, "PermissionDenied"));
    assert_eq!(h.signer.sign_calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Policy snapshot
// =============================================================================

/// Signer that swaps the shared policy while the attest stage runs
struct PolicyChangingSigner {
    inner: MockSigner,
    policy: SharedPolicy,
}

impl Signer for PolicyChangingSigner {
    fn sign(&self, payload: &[u8], key: &KeyRef) -> Result<Vec<u8>, SigningError> {
        self.policy.update(Policy::new(Severity::Low, &["someone-else"]));
        self.inner.sign(payload, key)
    }

    fn verify(&self, payload: &[u8], signature: &[u8], key: &KeyRef) -> Result<bool, SigningError> {
        self.inner.verify(payload, signature, key)
    }
}

#[test]
fn test_policy_change_mid_run_does_not_affect_it() {
    let shared = policy(Severity::Critical);
    let admission = Arc::new(FixedAdmission::new(AdmissionDecision::Allow));
    let h = Harness::new(MockScanner::with_severities(&["MEDIUM"])).admission(admission.clone());

    let mut deps = h.collaborators();
    deps.attestor = vulngate::core::services::Attestor::new(
        vulngate::core::models::AttestorId::new(ATTESTOR),
        Arc::new(PolicyChangingSigner {
            inner: MockSigner::default(),
            policy: shared.clone(),
        }),
        h.attestations.clone(),
        h.clock.clone(),
    );
    let pipeline = vulngate::core::services::Pipeline::new(
        vulngate::core::models::StageSpec::default_pipeline(),
        deps,
        h.settings.clone(),
    )
    .unwrap();

    let report = pipeline.run("run-1", &shared, &Permissions::all(), &CancelToken::new());

    assert_eq!(report.state, RunState::Succeeded);
    let seen = admission.seen.lock().unwrap();
    assert_eq!(seen[0], trusting_policy(Severity::Critical));
    assert_eq!(shared.snapshot().threshold, Severity::Low);
}

// =============================================================================
// Cancellation
// =============================================================================

#[test]
fn test_cancel_before_start() {
    let h = Harness::new(MockScanner::with_severities(&["LOW"]));
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = h.pipeline().run("run-1", &policy(Severity::Critical), &Permissions::all(), &cancel);

    assert_eq!(report.state, RunState::Cancelled { after: None });
    assert_eq!(report.exit_code(), 3);
    assert_eq!(h.builder.builds.load(Ordering::SeqCst), 0);
}

/// Scanner that requests cancellation once it reports
struct CancellingScanner {
    inner: MockScanner,
    cancel: CancelToken,
}

impl Scanner for CancellingScanner {
    fn scan(&self, artifact: &ArtifactRef) -> Result<ScanId, ScanError> {
        self.inner.scan(artifact)
    }

    fn list_findings(&self, scan: &ScanId) -> Result<ScanStatus, ScanError> {
        self.cancel.cancel();
        self.inner.list_findings(scan)
    }
}

#[test]
fn test_cancel_between_stages() {
    let cancel = CancelToken::new();
    let h = Harness::new(MockScanner::never_ready());
    let mut deps = h.collaborators();
    deps.scanner = Arc::new(CancellingScanner {
        inner: MockScanner::with_severities(&["LOW"]),
        cancel: cancel.clone(),
    });
    let pipeline = vulngate::core::services::Pipeline::new(
        vulngate::core::models::StageSpec::default_pipeline(),
        deps,
        h.settings.clone(),
    )
    .unwrap();

    let report = pipeline.run("run-1", &policy(Severity::Critical), &Permissions::all(), &cancel);

    assert_eq!(report.state, RunState::Cancelled { after: Some(Stage::Scan) });
    assert_eq!(h.attestations.count(), 0);
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_concurrent_runs_share_collaborators() {
    let h = Harness::new(MockScanner::with_severities(&["LOW"]));
    let shared = policy(Severity::Critical);

    let pipelines: Vec<_> = ["v1", "v2", "v3", "v4"]
        .iter()
        .map(|tag| {
            let mut settings = h.settings.clone();
            settings.tag = (*tag).to_string();
            vulngate::core::services::Pipeline::new(
                vulngate::core::models::StageSpec::default_pipeline(),
                h.collaborators(),
                settings,
            )
            .unwrap()
        })
        .collect();

    let reports: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = pipelines
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let shared = &shared;
                s.spawn(move || {
                    p.run(&format!("run-{i}"), shared, &Permissions::all(), &CancelToken::new())
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).collect()
    });

    assert!(reports.iter().all(|r| r.state == RunState::Succeeded));
    assert_eq!(h.attestations.count(), 4);
    assert_eq!(h.store.digests(Partition::Production).len(), 4);
}
