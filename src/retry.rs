//! Bounded retry policy for waterfall load attempts.
//!
//! A terminal waterfall failure schedules exactly one retry after a fixed
//! delay, up to a consecutive-failure cap. The counter resets on any
//! success; beyond the cap no further automatic retry runs until an
//! explicit reload trigger (close event or a new caller-initiated load).

use std::time::Duration;

/// Retry policy: bounded attempts with fixed backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum consecutive failures before giving up. The cap counts the
    /// initial attempt too: a value of 3 means the first walk plus two
    /// automatic retries.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given cap and fixed backoff.
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }
}

/// Per-kind consecutive-failure tracker.
#[derive(Debug, Default, Clone, Copy)]
pub struct RetryState {
    attempts: u32,
}

impl RetryState {
    /// Creates a fresh state with zero recorded failures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure and reports whether an automatic retry remains
    /// under the given policy.
    pub fn record_failure(&mut self, policy: &RetryPolicy) -> bool {
        self.attempts += 1;
        self.attempts < policy.max_retries
    }

    /// Resets the counter after a success or an explicit reload trigger.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Number of consecutive failures recorded.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
