//! Clock port
//!
//! Scan polling, retry backoff and attestation timestamps read time
//! through this trait so tests can run without real waiting.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Source of monotonic and wall-clock time
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&self) -> u64;

    /// Current wall-clock time
    fn now_utc(&self) -> DateTime<Utc>;

    /// Block the current thread
    fn sleep(&self, duration: Duration);
}
