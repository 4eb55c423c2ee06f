//! Mediation tuning configuration.
//!
//! All numeric values are empirical tuning defaults, not invariants; hosts
//! (and tests) override them through the `with_` builders.

use std::time::Duration;

/// Maximum consecutive waterfall failures before automatic retry stops.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fixed delay between automatic retries.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(3);

/// Watchdog budget for one load attempt.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(20);

/// Upper bound on waiting for provider initialization to settle.
pub const DEFAULT_INIT_WAIT_BUDGET: Duration = Duration::from_secs(5);

/// Poll interval while waiting for initialization.
pub const DEFAULT_INIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Delay before reloading an ad kind after its ad closes.
pub const DEFAULT_RELOAD_DELAY: Duration = Duration::from_secs(1);

/// Inclusive reward amount bounds.
pub const DEFAULT_REWARD_MIN: u32 = 1;
pub const DEFAULT_REWARD_MAX: u32 = 5;

/// Tuning knobs for the mediation engine.
#[derive(Debug, Clone)]
pub struct MediationConfig {
    /// Consecutive failures tolerated before giving up until the next
    /// explicit reload trigger. Counts the initial attempt: 3 means one
    /// walk plus two automatic retries.
    pub max_retries: u32,
    /// Fixed backoff between automatic retries.
    pub retry_backoff: Duration,
    /// Load attempt watchdog budget.
    pub load_timeout: Duration,
    /// Bounded wait for provider initialization.
    pub init_wait_budget: Duration,
    /// Poll interval during the init wait.
    pub init_poll_interval: Duration,
    /// Delay before the close-triggered reload.
    pub reload_delay: Duration,
    /// Minimum grantable reward; also the out-of-range fallback.
    pub reward_min: u32,
    /// Maximum requestable and grantable reward.
    pub reward_max: u32,
}

impl Default for MediationConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            init_wait_budget: DEFAULT_INIT_WAIT_BUDGET,
            init_poll_interval: DEFAULT_INIT_POLL_INTERVAL,
            reload_delay: DEFAULT_RELOAD_DELAY,
            reward_min: DEFAULT_REWARD_MIN,
            reward_max: DEFAULT_REWARD_MAX,
        }
    }
}

impl MediationConfig {
    /// Sets the maximum consecutive automatic retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the fixed retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Sets the load watchdog budget.
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Sets the bounded init wait budget.
    pub fn with_init_wait_budget(mut self, budget: Duration) -> Self {
        self.init_wait_budget = budget;
        self
    }

    /// Sets the init wait poll interval.
    pub fn with_init_poll_interval(mut self, interval: Duration) -> Self {
        self.init_poll_interval = interval;
        self
    }

    /// Sets the close-triggered reload delay.
    pub fn with_reload_delay(mut self, delay: Duration) -> Self {
        self.reload_delay = delay;
        self
    }

    /// Validates a caller-requested reward amount.
    pub fn is_valid_reward_request(&self, amount: u32) -> bool {
        amount >= self.reward_min && amount <= self.reward_max
    }

    /// Maps a network-reported reward to the granted amount.
    ///
    /// In-range values pass through; zero and out-of-range reports fall
    /// back to `reward_min`.
    pub fn clamp_reward(&self, reported: u32) -> u32 {
        if reported >= self.reward_min && reported <= self.reward_max {
            reported
        } else {
            self.reward_min
        }
    }
}
