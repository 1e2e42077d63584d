//! Mock implementations of port traits for testing
//!
//! These mocks provide configurable behavior for unit testing
//! without real I/O operations. All of them are `Send + Sync` so a single
//! set can be shared by concurrent runs.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use sha2::{Digest as _, Sha256};
use vulngate::core::error::{ScanError, SigningError};
use vulngate::core::models::{
    AdmissionDecision, Artifact, ArtifactRef, Attestation, AttestorId, Deployment, Digest,
    Finding, KeyRef, Partition, Policy,
};
use vulngate::core::ports::{
    AdmissionController, ArtifactStore, AttestationStore, BuildRequest, Builder, Clock, Deployer,
    ScanId, ScanStatus, Scanner, Signer,
};

// =============================================================================
// Builder
// =============================================================================

/// Builder whose digest is derived from repository, tag, context and args
#[derive(Default)]
pub struct MockBuilder {
    pub builds: AtomicUsize,
}

impl Builder for MockBuilder {
    fn build(&self, request: &BuildRequest) -> anyhow::Result<Artifact> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        let seed = format!(
            "{}|{}|{}|{}",
            request.repository,
            request.tag,
            request.context.display(),
            request.args.join(",")
        );
        Ok(Artifact::new(
            request.repository.clone(),
            request.tag.clone(),
            Digest::from_bytes(seed.as_bytes()),
        ))
    }
}

// =============================================================================
// Artifact store
// =============================================================================

/// In-memory partitioned registry
#[derive(Default)]
pub struct MockArtifactStore {
    records: Mutex<HashMap<(Partition, String, String), Artifact>>,
}

impl MockArtifactStore {
    pub fn digests(&self, partition: Partition) -> Vec<Digest> {
        self.list(partition).unwrap().into_iter().map(|a| a.digest).collect()
    }
}

impl ArtifactStore for MockArtifactStore {
    fn put(&self, partition: Partition, artifact: &Artifact) -> anyhow::Result<()> {
        self.records.lock().unwrap().insert(
            (partition, artifact.repository.clone(), artifact.tag.clone()),
            artifact.clone(),
        );
        Ok(())
    }

    fn get(
        &self,
        partition: Partition,
        repository: &str,
        tag: &str,
    ) -> anyhow::Result<Option<Artifact>> {
        let key = (partition, repository.to_string(), tag.to_string());
        Ok(self.records.lock().unwrap().get(&key).cloned())
    }

    fn list(&self, partition: Partition) -> anyhow::Result<Vec<Artifact>> {
        let mut found: Vec<Artifact> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|((p, _, _), _)| *p == partition)
            .map(|(_, a)| a.clone())
            .collect();
        found.sort_by(|a, b| a.repository.cmp(&b.repository).then(a.tag.cmp(&b.tag)));
        Ok(found)
    }
}

// =============================================================================
// Scanner
// =============================================================================

/// One scripted scanner response
#[derive(Clone)]
pub enum ScanStep {
    Pending,
    Fail(ScanError),
    Findings(Vec<(&'static str, &'static str, &'static str)>),
}

/// Scanner that replays a script, then repeats its last step
///
/// Findings are `(cve_id, package, severity)` and are bound to whatever
/// digest was scanned.
pub struct MockScanner {
    script: Mutex<VecDeque<ScanStep>>,
    last: Mutex<ScanStep>,
    scanned: Mutex<Vec<Digest>>,
    pub polls: AtomicUsize,
}

impl MockScanner {
    pub fn new(script: Vec<ScanStep>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(ScanStep::Pending),
            scanned: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
        }
    }

    /// Scanner that immediately reports these severities
    pub fn with_severities(severities: &[&'static str]) -> Self {
        let findings = severities
            .iter()
            .enumerate()
            .map(|(i, s)| (cve(i), "openssl", *s))
            .collect();
        Self::new(vec![ScanStep::Findings(findings)])
    }

    /// Scanner that never produces results
    pub fn never_ready() -> Self {
        Self::new(vec![ScanStep::Pending])
    }
}

fn cve(i: usize) -> &'static str {
    const IDS: [&str; 4] = ["CVE-2024-0001", "CVE-2024-0002", "CVE-2024-0003", "CVE-2024-0004"];
    IDS[i % IDS.len()]
}

impl Scanner for MockScanner {
    fn scan(&self, artifact: &ArtifactRef) -> Result<ScanId, ScanError> {
        self.scanned.lock().unwrap().push(artifact.digest.clone());
        Ok(ScanId(artifact.digest.to_string()))
    }

    fn list_findings(&self, scan: &ScanId) -> Result<ScanStatus, ScanError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            if let Some(next) = script.pop_front() {
                *last = next;
            }
            last.clone()
        };
        let digest = Digest::parse(&scan.0).unwrap();
        match step {
            ScanStep::Pending => Ok(ScanStatus::Pending),
            ScanStep::Fail(e) => Err(e),
            ScanStep::Findings(items) => Ok(ScanStatus::Complete(
                items
                    .into_iter()
                    .map(|(id, pkg, sev)| Finding::new(digest.clone(), id, pkg, sev))
                    .collect(),
            )),
        }
    }
}

// =============================================================================
// Signer
// =============================================================================

/// Deterministic keyed-hash signer
///
/// Signatures are `sha256(key || payload)`, so a signature made with one
/// key version never verifies under another.
#[derive(Default)]
pub struct MockSigner {
    failures: Mutex<VecDeque<SigningError>>,
    pub sign_calls: AtomicUsize,
    revoked: Mutex<Vec<KeyRef>>,
}

impl MockSigner {
    /// Signer that returns these errors from the next `sign` calls
    pub fn failing(errors: Vec<SigningError>) -> Self {
        Self {
            failures: Mutex::new(errors.into()),
            ..Self::default()
        }
    }

    /// Make every later call with `key` fail as destroyed
    pub fn revoke(&self, key: &KeyRef) {
        self.revoked.lock().unwrap().push(key.clone());
    }

    pub fn signature(payload: &[u8], key: &KeyRef) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(key.to_string().as_bytes());
        hasher.update(payload);
        hasher.finalize().to_vec()
    }

    fn check(&self, key: &KeyRef) -> Result<(), SigningError> {
        if self.revoked.lock().unwrap().contains(key) {
            return Err(SigningError::KeyDestroyed(key.clone()));
        }
        Ok(())
    }
}

impl Signer for MockSigner {
    fn sign(&self, payload: &[u8], key: &KeyRef) -> Result<Vec<u8>, SigningError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.check(key)?;
        Ok(Self::signature(payload, key))
    }

    fn verify(&self, payload: &[u8], signature: &[u8], key: &KeyRef) -> Result<bool, SigningError> {
        self.check(key)?;
        Ok(Self::signature(payload, key) == signature)
    }
}

// =============================================================================
// Attestation store
// =============================================================================

/// In-memory attestation store
#[derive(Default)]
pub struct MockAttestationStore {
    records: Mutex<HashMap<(Digest, AttestorId), Attestation>>,
    pub puts: AtomicUsize,
}

impl MockAttestationStore {
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl AttestationStore for MockAttestationStore {
    fn put(&self, attestation: &Attestation) -> anyhow::Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().insert(
            (attestation.artifact_digest.clone(), attestation.attestor.clone()),
            attestation.clone(),
        );
        Ok(())
    }

    fn get(&self, digest: &Digest, attestor: &AttestorId) -> anyhow::Result<Option<Attestation>> {
        let key = (digest.clone(), attestor.clone());
        Ok(self.records.lock().unwrap().get(&key).cloned())
    }

    fn list(&self, digest: &Digest) -> anyhow::Result<Vec<Attestation>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|a| &a.artifact_digest == digest)
            .cloned()
            .collect())
    }
}

// =============================================================================
// Admission and deploy
// =============================================================================

/// Admission controller that records what it was asked and always answers the same
pub struct FixedAdmission {
    pub decision: AdmissionDecision,
    pub seen: Mutex<Vec<Policy>>,
}

impl FixedAdmission {
    pub fn new(decision: AdmissionDecision) -> Self {
        Self {
            decision,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl AdmissionController for FixedAdmission {
    fn authorize(&self, _digest: &Digest, policy: &Policy) -> anyhow::Result<AdmissionDecision> {
        self.seen.lock().unwrap().push(policy.clone());
        Ok(self.decision.clone())
    }
}

/// Deployer that records deployed artifacts
#[derive(Default)]
pub struct MockDeployer {
    pub deployed: Mutex<Vec<Artifact>>,
}

impl Deployer for MockDeployer {
    fn deploy(&self, artifact: &Artifact) -> anyhow::Result<Deployment> {
        let mut deployed = self.deployed.lock().unwrap();
        deployed.push(artifact.clone());
        Ok(Deployment {
            service: "auth-service".into(),
            revision: format!("auth-service-{:05}", deployed.len()),
            image: format!("{}@{}", artifact.repository, artifact.digest),
            deployed_at: "2024-01-01T00:00:00Z".into(),
        })
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Clock that advances only when slept on
///
/// Wall-clock time starts at the Unix epoch.
#[derive(Default)]
pub struct FakeClock {
    now: AtomicU64,
    pub sleeps: AtomicUsize,
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn now_utc(&self) -> chrono::DateTime<chrono::Utc> {
        let elapsed = i64::try_from(self.now_ms()).unwrap();
        chrono::DateTime::<chrono::Utc>::UNIX_EPOCH + chrono::TimeDelta::milliseconds(elapsed)
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.now.fetch_add(u64::try_from(duration.as_millis()).unwrap(), Ordering::SeqCst);
    }
}
