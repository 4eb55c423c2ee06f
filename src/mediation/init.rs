//! Concurrent provider-initialization tracking.
//!
//! One background task per provider writes its settled outcome here;
//! the waterfall walker reads. Each key has a single writer, so only the
//! map insert and the pending-count decrement need atomicity.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Shared initialization state: provider-name → initialized flag, plus a
/// count of providers whose init task has not yet settled.
#[derive(Debug, Default)]
pub(crate) struct InitializationState {
    initialized: DashMap<String, bool>,
    pending: AtomicUsize,
    started: AtomicBool,
}

impl InitializationState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Marks the start of an initialization round covering `count`
    /// providers. Returns `false` if a round already started (init is
    /// driven at most once per manager instance).
    pub(crate) fn begin(&self, count: usize) -> bool {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        self.pending.store(count, Ordering::SeqCst);
        true
    }

    /// Records a provider's settled outcome and decrements the pending
    /// count. Called exactly once per provider per round, regardless of
    /// success, error, or panic.
    pub(crate) fn settle(&self, name: &str, initialized: bool) {
        self.initialized.insert(name.to_string(), initialized);
        self.pending.fetch_sub(1, Ordering::SeqCst);
    }

    /// Whether the named provider initialized successfully.
    pub(crate) fn is_initialized(&self, name: &str) -> bool {
        self.initialized.get(name).map(|v| *v).unwrap_or(false)
    }

    /// Number of providers whose init task has not settled yet.
    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Clears all state so a released manager can be re-initialized.
    pub(crate) fn clear(&self) {
        self.initialized.clear();
        self.pending.store(0, Ordering::SeqCst);
        self.started.store(false, Ordering::SeqCst);
    }
}
