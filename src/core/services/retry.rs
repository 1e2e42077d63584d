//! Bounded retry with exponential backoff

use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::core::ports::Clock;

/// Retry budget for calls to a remote collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_backoff_ms: u64,
    /// Upper bound for any single delay
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Single attempt, no retries
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }

    /// Delay after the given failed attempt (1-based)
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1_u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let ms = self.initial_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// Run `op`, retrying errors for which `is_transient` holds
    ///
    /// Permanent errors and the last transient error are returned as-is.
    pub fn run<T, E, F, P>(&self, clock: &dyn Clock, what: &str, is_transient: P, op: F) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Result<T, E>,
        P: Fn(&E) -> bool,
    {
        self.attempt(clock, None, what, is_transient, op)
    }

    /// Like [`RetryPolicy::run`], but never sleeps past `deadline_ms`
    ///
    /// Backoff is cut short at the deadline. A transient error seen at or
    /// after the deadline is returned without another attempt.
    pub fn run_until<T, E, F, P>(
        &self,
        clock: &dyn Clock,
        deadline_ms: u64,
        what: &str,
        is_transient: P,
        op: F,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Result<T, E>,
        P: Fn(&E) -> bool,
    {
        self.attempt(clock, Some(deadline_ms), what, is_transient, op)
    }

    fn attempt<T, E, F, P>(
        &self,
        clock: &dyn Clock,
        deadline_ms: Option<u64>,
        what: &str,
        is_transient: P,
        mut op: F,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Result<T, E>,
        P: Fn(&E) -> bool,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && is_transient(&e) => {
                    let mut delay = self.backoff(attempt);
                    if let Some(deadline) = deadline_ms {
                        let left = deadline.saturating_sub(clock.now_ms());
                        if left == 0 {
                            debug!("{what}: attempt {attempt}/{attempts} failed ({e}), deadline reached");
                            return Err(e);
                        }
                        delay = delay.min(Duration::from_millis(left));
                    }
                    debug!("{what}: attempt {attempt}/{attempts} failed ({e}), retrying in {delay:?}");
                    clock.sleep(delay);
                    attempt += 1;
                },
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 5_000,
        }
    }
}
