//! Policy and permission models
//!
//! A [`Policy`] is consulted by the severity gate (threshold) and by the
//! admission controller (required attestors and the key versions trusted
//! for each of them). [`Permissions`] say which
//! privileged stages a run may perform. Both are passed into a run
//! explicitly.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::{KeyRef, Severity};

/// Name of an attestor (late-bound, looked up by name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttestorId(String);

impl AttestorId {
    /// Create an attestor id
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// The attestor name
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AttestorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Gating and admission policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Findings at or above this level block the pipeline
    #[serde(default)]
    pub threshold: Severity,

    /// Attestors whose signatures must be present at deploy time
    #[serde(default)]
    pub required_attestors: BTreeSet<AttestorId>,

    /// Key versions whose signatures count for each attestor
    #[serde(default)]
    pub trusted_keys: BTreeMap<AttestorId, BTreeSet<KeyRef>>,
}

impl Policy {
    /// Create a policy that trusts no keys yet
    #[must_use]
    pub fn new(threshold: Severity, required: &[&str]) -> Self {
        Self {
            threshold,
            required_attestors: required.iter().map(|name| AttestorId::new(name)).collect(),
            trusted_keys: BTreeMap::new(),
        }
    }

    /// Trust `key` for signatures made on behalf of `attestor`
    #[must_use]
    pub fn trust(mut self, attestor: &str, key: KeyRef) -> Self {
        self.trusted_keys.entry(AttestorId::new(attestor)).or_default().insert(key);
        self
    }

    /// Whether `key` may sign for `attestor`
    #[must_use]
    pub fn trusts(&self, attestor: &AttestorId, key: &KeyRef) -> bool {
        self.trusted_keys.get(attestor).is_some_and(|keys| keys.contains(key))
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new(Severity::Critical, &["vulnz-attestor"])
            .trust("vulnz-attestor", KeyRef::new("binauthz", "vulnz-signer", 1))
    }
}

/// Shared, updatable policy handle
///
/// Runs call [`SharedPolicy::snapshot`] once; later updates only affect
/// runs that snapshot afterwards.
#[derive(Debug, Clone, Default)]
pub struct SharedPolicy(Arc<RwLock<Policy>>);

impl SharedPolicy {
    /// Wrap a policy
    #[must_use]
    pub fn new(policy: Policy) -> Self {
        Self(Arc::new(RwLock::new(policy)))
    }

    /// Copy of the current policy
    #[must_use]
    pub fn snapshot(&self) -> Policy {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the policy for future snapshots
    pub fn update(&self, policy: Policy) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = policy;
    }
}

/// A privileged action a run may be granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Write to the staging partition
    Push,
    /// Use the signing backend
    Sign,
    /// Copy into the production partition
    Promote,
    /// Trigger a deployment
    Deploy,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::Sign => write!(f, "sign"),
            Self::Promote => write!(f, "promote"),
            Self::Deploy => write!(f, "deploy"),
        }
    }
}

/// Capabilities granted to a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permissions {
    /// Granted capabilities
    #[serde(default)]
    pub granted: BTreeSet<Capability>,
}

impl Permissions {
    /// Every capability
    #[must_use]
    pub fn all() -> Self {
        Self::from_iter([
            Capability::Push,
            Capability::Sign,
            Capability::Promote,
            Capability::Deploy,
        ])
    }

    /// Whether a capability was granted
    #[must_use]
    pub fn allows(&self, capability: Capability) -> bool {
        self.granted.contains(&capability)
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Capability> for Permissions {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        Self {
            granted: iter.into_iter().collect(),
        }
    }
}
