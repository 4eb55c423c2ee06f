//! Scripted provider double shared by unit tests across the crate.

use super::types::{AdKind, AdProvider, PerKind, ProviderError, ProviderFuture, ShowOutcome};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted behavior for `initialize` and `load`.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Operation succeeds.
    Succeed,
    /// Operation fails with the given code.
    Fail(i32),
    /// Operation panics (misbehaving vendor SDK).
    Panic,
}

/// Configurable in-memory provider for tests.
///
/// Tracks call counts so tests can assert exact invocation ordering
/// (e.g. the waterfall calls each provider's `load` exactly once).
pub struct MockAdProvider {
    name: String,
    init_behavior: MockBehavior,
    load_behavior: MockBehavior,
    init_delay: Duration,
    load_delay: Duration,
    reward: Option<u32>,
    initialized: AtomicBool,
    loaded: PerKind<AtomicBool>,
    pub init_calls: AtomicUsize,
    pub load_calls: AtomicUsize,
    pub show_calls: AtomicUsize,
    pub release_calls: AtomicUsize,
}

impl MockAdProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            init_behavior: MockBehavior::Succeed,
            load_behavior: MockBehavior::Succeed,
            init_delay: Duration::ZERO,
            load_delay: Duration::ZERO,
            reward: None,
            initialized: AtomicBool::new(false),
            loaded: PerKind::from_fn(|_| AtomicBool::new(false)),
            init_calls: AtomicUsize::new(0),
            load_calls: AtomicUsize::new(0),
            show_calls: AtomicUsize::new(0),
            release_calls: AtomicUsize::new(0),
        }
    }

    /// Provider that initializes and loads successfully.
    pub fn succeeding(name: impl Into<String>) -> Self {
        Self::new(name)
    }

    /// Provider whose every load fails with the given code.
    pub fn failing_load(name: impl Into<String>, code: i32) -> Self {
        let mut mock = Self::new(name);
        mock.load_behavior = MockBehavior::Fail(code);
        mock
    }

    /// Provider whose initialization fails.
    pub fn failing_init(name: impl Into<String>) -> Self {
        let mut mock = Self::new(name);
        mock.init_behavior = MockBehavior::Fail(1);
        mock
    }

    /// Provider whose initialization panics.
    pub fn panicking_init(name: impl Into<String>) -> Self {
        let mut mock = Self::new(name);
        mock.init_behavior = MockBehavior::Panic;
        mock
    }

    /// Provider whose every load panics.
    pub fn panicking_load(name: impl Into<String>) -> Self {
        let mut mock = Self::new(name);
        mock.load_behavior = MockBehavior::Panic;
        mock
    }

    /// Sets the reward amount reported when a rewarded ad is shown.
    pub fn with_reward(mut self, amount: u32) -> Self {
        self.reward = Some(amount);
        self
    }

    /// Adds an artificial delay to every load cycle.
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Adds an artificial delay to initialization.
    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = delay;
        self
    }

    /// Marks an ad as already loaded without going through `load`.
    pub fn force_loaded(&self, kind: AdKind) {
        self.initialized.store(true, Ordering::SeqCst);
        self.loaded.get(kind).store(true, Ordering::SeqCst);
    }

    /// Drops a loaded ad without showing it (simulates expiry/drift).
    pub fn expire(&self, kind: AdKind) {
        self.loaded.get(kind).store(false, Ordering::SeqCst);
    }
}

impl AdProvider for MockAdProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&self) -> ProviderFuture<'_, ()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.init_behavior.clone();
        let delay = self.init_delay;
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match behavior {
                MockBehavior::Succeed => {
                    self.initialized.store(true, Ordering::SeqCst);
                    Ok(())
                }
                MockBehavior::Fail(code) => Err(ProviderError::new(code, "init failed")),
                MockBehavior::Panic => panic!("mock provider panic during initialize"),
            }
        })
    }

    fn load(&self, kind: AdKind) -> ProviderFuture<'_, ()> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.load_behavior.clone();
        let delay = self.load_delay;
        Box::pin(async move {
            if !self.initialized.load(Ordering::SeqCst) {
                return Err(ProviderError::not_initialized());
            }
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match behavior {
                MockBehavior::Succeed => {
                    self.loaded.get(kind).store(true, Ordering::SeqCst);
                    Ok(())
                }
                MockBehavior::Fail(code) => Err(ProviderError::new(code, "load failed")),
                MockBehavior::Panic => panic!("mock provider panic during load"),
            }
        })
    }

    fn show(&self, kind: AdKind) -> ProviderFuture<'_, ShowOutcome> {
        self.show_calls.fetch_add(1, Ordering::SeqCst);
        let reward = self.reward;
        Box::pin(async move {
            if !self.loaded.get(kind).swap(false, Ordering::SeqCst) {
                return Err(ProviderError::new(2, "nothing loaded to show"));
            }
            let reward = match kind {
                AdKind::Rewarded => reward,
                AdKind::Interstitial => None,
            };
            Ok(ShowOutcome { reward })
        })
    }

    fn is_loaded(&self, kind: AdKind) -> bool {
        self.loaded.get(kind).load(Ordering::SeqCst)
    }

    fn release(&self) {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.initialized.store(false, Ordering::SeqCst);
        for kind in AdKind::ALL {
            self.loaded.get(kind).store(false, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_load_before_init_fails() {
        let mock = MockAdProvider::succeeding("A");
        let err = mock.load(AdKind::Interstitial).await.unwrap_err();
        assert_eq!(err, ProviderError::not_initialized());
    }

    #[tokio::test]
    async fn test_mock_load_after_init_succeeds() {
        let mock = MockAdProvider::succeeding("A");
        mock.initialize().await.unwrap();
        mock.load(AdKind::Interstitial).await.unwrap();
        assert!(mock.is_loaded(AdKind::Interstitial));
        assert!(!mock.is_loaded(AdKind::Rewarded));
    }

    #[tokio::test]
    async fn test_mock_show_consumes_loaded_ad() {
        let mock = MockAdProvider::succeeding("A").with_reward(3);
        mock.force_loaded(AdKind::Rewarded);

        let outcome = mock.show(AdKind::Rewarded).await.unwrap();
        assert_eq!(outcome.reward, Some(3));
        assert!(!mock.is_loaded(AdKind::Rewarded));

        // Second show has nothing to display
        assert!(mock.show(AdKind::Rewarded).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_release_resets_state() {
        let mock = MockAdProvider::succeeding("A");
        mock.initialize().await.unwrap();
        mock.load(AdKind::Interstitial).await.unwrap();

        mock.release();
        assert!(!mock.is_loaded(AdKind::Interstitial));
        assert!(mock.load(AdKind::Interstitial).await.is_err());
        assert_eq!(mock.release_calls.load(Ordering::SeqCst), 1);
    }
}
