//! Mediation manager: concurrent initialization and the waterfall walk.
//!
//! The manager owns the ordered provider list for the current session,
//! drives one independent initialization task per provider, tracks
//! per-provider readiness, and executes the priority-ordered fallback
//! walk per ad kind.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     MediationManager                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────┐  │
//! │  │ Init state   │  │ Waterfall    │  │ Current-provider  │  │
//! │  │ (map+count)  │  │ cursor/guard │  │ pointer per kind  │  │
//! │  └──────────────┘  └──────────────┘  └───────────────────┘  │
//! │         ▲                                                    │
//! │   one task per provider during initialize()                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Selection is strictly priority-ordered: the walk tries providers in
//! list order, skips the uninitialized without attempting, and stops at
//! the first success. No scoring, no reordering mid-session.

mod init;

use crate::config::MediationConfig;
use crate::error::WaterfallError;
use crate::provider::{AdKind, AdProvider, PerKind, ProviderError};
use init::InitializationState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Error code synthesized when a provider adapter panics mid-call.
const CODE_ADAPTER_PANIC: i32 = -2;

/// A successful waterfall outcome: the winning provider's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedAd {
    /// Name of the provider that filled the request.
    pub provider: String,
}

/// Clears the per-kind walk guard when the walk ends, however it ends.
struct WalkGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> WalkGuard<'a> {
    fn acquire(flag: &'a AtomicBool, kind: AdKind) -> Result<Self, WaterfallError> {
        if flag
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(%kind, "Waterfall walk already in flight, ignoring load request");
            return Err(WaterfallError::WalkInFlight { kind });
        }
        Ok(Self { flag })
    }
}

impl Drop for WalkGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Coordinates the ordered provider list behind one load/show surface.
///
/// The provider list and its order are fixed at construction (selected by
/// the device-classification collaborator through the registry) and never
/// re-derived mid-session.
pub struct MediationManager {
    providers: Vec<Arc<dyn AdProvider>>,
    init: Arc<InitializationState>,
    cursors: PerKind<AtomicUsize>,
    walk_in_flight: PerKind<AtomicBool>,
    current: PerKind<Mutex<Option<usize>>>,
    init_wait_budget: Duration,
    init_poll_interval: Duration,
}

impl MediationManager {
    /// Creates a manager over the given priority-ordered provider list.
    pub fn new(providers: Vec<Arc<dyn AdProvider>>, config: &MediationConfig) -> Self {
        Self {
            providers,
            init: Arc::new(InitializationState::new()),
            cursors: PerKind::from_fn(|_| AtomicUsize::new(0)),
            walk_in_flight: PerKind::from_fn(|_| AtomicBool::new(false)),
            current: PerKind::from_fn(|_| Mutex::new(None)),
            init_wait_budget: config.init_wait_budget,
            init_poll_interval: config.init_poll_interval,
        }
    }

    /// Number of providers in the waterfall.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Providers whose init tasks have not settled yet.
    pub fn pending_init_count(&self) -> usize {
        self.init.pending()
    }

    /// Launches one independent initialization task per provider.
    ///
    /// Each task settles the provider's readiness flag and decrements the
    /// pending count regardless of outcome. A provider whose init errors
    /// (or panics) is marked unavailable and skipped by later walks,
    /// never retried by this manager instance. Calling `initialize` again
    /// before `release` is a logged no-op.
    ///
    /// Must be called from within a tokio runtime.
    pub fn initialize(&self) {
        if !self.init.begin(self.providers.len()) {
            debug!("Mediation already initializing, ignoring");
            return;
        }
        info!(providers = self.providers.len(), "Initializing ad providers");

        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let init = Arc::clone(&self.init);
            tokio::spawn(async move {
                // Inner task contains panics from misbehaving adapters so
                // the settle/decrement below always runs.
                let inner = tokio::spawn({
                    let provider = Arc::clone(&provider);
                    async move { provider.initialize().await }
                });
                let initialized = match inner.await {
                    Ok(Ok(())) => {
                        info!(provider = provider.name(), "Provider initialized");
                        true
                    }
                    Ok(Err(e)) => {
                        warn!(
                            provider = provider.name(),
                            code = e.code,
                            error = %e,
                            "Provider initialization failed, marking unavailable"
                        );
                        false
                    }
                    Err(join_err) => {
                        error!(
                            provider = provider.name(),
                            error = %join_err,
                            "Provider initialization panicked, marking unavailable"
                        );
                        false
                    }
                };
                init.settle(provider.name(), initialized);
            });
        }
    }

    /// Waits until all init tasks settle or the wait budget elapses.
    ///
    /// A slow or failed provider must not block the whole waterfall: once
    /// the budget is spent the walk proceeds with whatever has settled.
    pub async fn wait_for_init(&self) {
        let started = Instant::now();
        while self.init.pending() > 0 {
            if started.elapsed() >= self.init_wait_budget {
                warn!(
                    pending = self.init.pending(),
                    budget_ms = self.init_wait_budget.as_millis() as u64,
                    "Initialization wait budget exhausted, proceeding"
                );
                return;
            }
            tokio::time::sleep(self.init_poll_interval).await;
        }
    }

    /// Runs one waterfall walk for the given kind.
    ///
    /// Waits (bounded) for initialization, then tries providers in
    /// priority order: uninitialized providers are skipped without
    /// attempting; the first successful load sets the current-provider
    /// pointer and wins. Exhausting the list yields
    /// [`WaterfallError::AllProvidersExhausted`] with the number of
    /// providers actually attempted.
    ///
    /// At most one walk per kind is in flight; a concurrent call returns
    /// [`WaterfallError::WalkInFlight`] without touching the cursor.
    pub async fn load_ad(&self, kind: AdKind) -> Result<LoadedAd, WaterfallError> {
        self.wait_for_init().await;

        let _guard = WalkGuard::acquire(self.walk_in_flight.get(kind), kind)?;
        let cursor = self.cursors.get(kind);
        cursor.store(0, Ordering::SeqCst);
        let mut attempts = 0usize;

        loop {
            let index = cursor.load(Ordering::SeqCst);
            if index >= self.providers.len() {
                warn!(%kind, attempts, "All ad networks failed");
                return Err(WaterfallError::AllProvidersExhausted { kind, attempts });
            }

            let provider = &self.providers[index];
            if !self.init.is_initialized(provider.name()) {
                debug!(provider = provider.name(), %kind, "Skipping uninitialized provider");
                cursor.fetch_add(1, Ordering::SeqCst);
                continue;
            }

            attempts += 1;
            match self.attempt_load(provider, kind).await {
                Ok(()) => {
                    *self.current.get(kind).lock().unwrap() = Some(index);
                    info!(provider = provider.name(), %kind, "Waterfall load succeeded");
                    return Ok(LoadedAd {
                        provider: provider.name().to_string(),
                    });
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        %kind,
                        code = e.code,
                        error = %e,
                        "Provider load failed, advancing waterfall"
                    );
                    cursor.fetch_add(1, Ordering::SeqCst);
                }
            }
        }
    }

    /// Runs one provider load cycle in its own task so an adapter panic
    /// becomes a load failure instead of aborting the walk.
    async fn attempt_load(
        &self,
        provider: &Arc<dyn AdProvider>,
        kind: AdKind,
    ) -> Result<(), ProviderError> {
        let task = tokio::spawn({
            let provider = Arc::clone(provider);
            async move { provider.load(kind).await }
        });
        match task.await {
            Ok(result) => result,
            Err(join_err) => Err(ProviderError::new(
                CODE_ADAPTER_PANIC,
                format!("provider panicked during load: {join_err}"),
            )),
        }
    }

    /// Takes the provider believed to hold a ready ad of this kind.
    ///
    /// Consumes the current-provider pointer. When the cached pointer
    /// disagrees with the provider's live readiness query the pointer is
    /// cleared, the inconsistency logged, and nothing is returned; no
    /// synchronous auto-reload happens here.
    pub fn ready_provider(&self, kind: AdKind) -> Option<Arc<dyn AdProvider>> {
        let mut current = self.current.get(kind).lock().unwrap();
        let index = (*current)?;
        let provider = &self.providers[index];
        if !provider.is_loaded(kind) {
            warn!(
                provider = provider.name(),
                %kind,
                "Cached ready pointer disagrees with live readiness, clearing"
            );
            *current = None;
            return None;
        }
        *current = None;
        Some(Arc::clone(provider))
    }

    /// Whether an ad of this kind is believed ready, verified against the
    /// provider's live query. Does not consume the pointer.
    pub fn peek_ready(&self, kind: AdKind) -> bool {
        let current = self.current.get(kind).lock().unwrap();
        match *current {
            Some(index) => self.providers[index].is_loaded(kind),
            None => false,
        }
    }

    /// Releases every provider and clears all cursors, pointers, guards,
    /// and initialization state.
    ///
    /// Failures are isolated per provider: one misbehaving adapter cannot
    /// skip releasing the rest.
    pub fn release(&self) {
        info!(providers = self.providers.len(), "Releasing ad providers");
        for provider in &self.providers {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| provider.release()));
            if result.is_err() {
                error!(
                    provider = provider.name(),
                    "Provider release panicked, continuing with remaining providers"
                );
            }
        }
        for kind in AdKind::ALL {
            self.cursors.get(kind).store(0, Ordering::SeqCst);
            self.walk_in_flight.get(kind).store(false, Ordering::SeqCst);
            *self.current.get(kind).lock().unwrap() = None;
        }
        self.init.clear();
    }
}

impl std::fmt::Debug for MediationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediationManager")
            .field("providers", &self.providers.len())
            .field("pending_init", &self.init.pending())
            .finish_non_exhaustive()
    }
}
