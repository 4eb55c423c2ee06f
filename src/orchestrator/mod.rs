//! App-facing ad orchestrator.
//!
//! Owns one [`MediationManager`] and wraps it with bounded retries, a
//! load-timeout watchdog, the reload-after-close policy, and the reward
//! request flow. All outcomes are reported through the configured
//! [`AdEventSink`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        AdOrchestrator                        │
//! │                                                              │
//! │  load/show/reward API        background tasks                │
//! │        │                ┌──────────────────────────┐         │
//! │        ▼                │ load cycle (retry+timeout)│        │
//! │  per-kind lifecycle ───►│ show watcher              │        │
//! │  + cycle ids            │ reload timer              │        │
//! │                         └──────────────────────────┘         │
//! │        │                            │                        │
//! │        ▼                            ▼                        │
//! │                   MediationManager (waterfall)               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Lifecycle
//!
//! 1. **Creation**: build with a provider registry (or a prebuilt manager)
//! 2. **Operation**: `initialize`, then load/show/watch as the app needs
//! 3. **Teardown**: `release` cancels every pending timer and task before
//!    releasing providers, so nothing fires into released state

mod lifecycle;

pub use lifecycle::AdLifecycle;

use crate::config::MediationConfig;
use crate::device::{DeviceClass, DeviceClassifier, FixedDeviceClassifier};
use crate::entitlement::{AlwaysEntitled, EntitlementCheck};
use crate::error::{RewardRequestError, WaterfallError};
use crate::events::{AdEvent, AdEventSink, TracingAdEventSink};
use crate::mediation::{LoadedAd, MediationManager};
use crate::provider::{AdKind, AdProvider, PerKind, ProviderRegistry};
use crate::retry::{RetryPolicy, RetryState};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// The single outstanding reward request, held while a rewarded ad loads
/// on the user's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingRewardRequest {
    amount: u32,
}

/// Per-kind mutable orchestrator state, guarded by a short-held mutex.
#[derive(Debug, Default)]
struct KindState {
    lifecycle: AdLifecycle,
    retry: RetryState,
    /// Load-cycle id implementing the handled-once guard: a cycle may
    /// settle state exactly once, and only while it is still current.
    cycle: u64,
}

struct OrchestratorInner {
    mediation: Arc<MediationManager>,
    config: MediationConfig,
    retry_policy: RetryPolicy,
    sink: Arc<dyn AdEventSink>,
    entitlements: Arc<dyn EntitlementCheck>,
    shutdown: CancellationToken,
    kinds: PerKind<Mutex<KindState>>,
    pending_reward: Mutex<Option<PendingRewardRequest>>,
}

/// The app-facing mediation surface.
///
/// Cheap to clone handles are not provided; the host's composition root
/// owns the single instance and calls [`release`](Self::release) at
/// teardown.
pub struct AdOrchestrator {
    inner: Arc<OrchestratorInner>,
}

/// Builder for [`AdOrchestrator`].
pub struct AdOrchestratorBuilder {
    registry: Option<ProviderRegistry>,
    providers: Option<Vec<Arc<dyn AdProvider>>>,
    classifier: Box<dyn DeviceClassifier>,
    config: MediationConfig,
    sink: Arc<dyn AdEventSink>,
    entitlements: Arc<dyn EntitlementCheck>,
}

impl AdOrchestratorBuilder {
    fn new() -> Self {
        Self {
            registry: None,
            providers: None,
            classifier: Box::new(FixedDeviceClassifier::new(DeviceClass::Phone)),
            config: MediationConfig::default(),
            sink: Arc::new(TracingAdEventSink),
            entitlements: Arc::new(AlwaysEntitled),
        }
    }

    /// Supplies the registry of vendor adapters; the waterfall order is
    /// resolved once at build time from the device class.
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Supplies a prebuilt provider list, bypassing the registry.
    pub fn providers(mut self, providers: Vec<Arc<dyn AdProvider>>) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Sets the device classifier consulted once at build time.
    pub fn classifier(mut self, classifier: impl DeviceClassifier + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    /// Overrides the tuning configuration.
    pub fn config(mut self, config: MediationConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the event sink the UI layer subscribes through.
    pub fn event_sink(mut self, sink: Arc<dyn AdEventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the ads-disabled entitlement check.
    pub fn entitlements(mut self, entitlements: Arc<dyn EntitlementCheck>) -> Self {
        self.entitlements = entitlements;
        self
    }

    /// Builds the orchestrator. The provider list and its priority order
    /// are fixed here and never re-derived mid-session.
    pub fn build(self) -> AdOrchestrator {
        let providers = match (self.providers, self.registry) {
            (Some(providers), _) => providers,
            (None, Some(registry)) => {
                let class = self.classifier.device_class();
                info!(device_class = %class, "Selecting waterfall for device class");
                registry.build_waterfall(class)
            }
            (None, None) => Vec::new(),
        };
        let mediation = Arc::new(MediationManager::new(providers, &self.config));
        AdOrchestrator {
            inner: Arc::new(OrchestratorInner {
                retry_policy: RetryPolicy::new(self.config.max_retries, self.config.retry_backoff),
                mediation,
                config: self.config,
                sink: self.sink,
                entitlements: self.entitlements,
                shutdown: CancellationToken::new(),
                kinds: PerKind::from_fn(|_| Mutex::new(KindState::default())),
                pending_reward: Mutex::new(None),
            }),
        }
    }
}

impl AdOrchestrator {
    /// Starts building an orchestrator.
    pub fn builder() -> AdOrchestratorBuilder {
        AdOrchestratorBuilder::new()
    }

    /// Drives concurrent provider initialization and transitions both ad
    /// kinds to Idle once the providers settle (bounded wait).
    ///
    /// Must be called from within a tokio runtime.
    pub fn initialize(&self) {
        for kind in AdKind::ALL {
            let mut state = self.inner.kinds.get(kind).lock().unwrap();
            if state.lifecycle == AdLifecycle::Uninitialized {
                state.lifecycle = AdLifecycle::Initializing;
            }
        }
        self.inner.mediation.initialize();

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = inner.shutdown.cancelled() => return,
                _ = inner.mediation.wait_for_init() => {}
            }
            for kind in AdKind::ALL {
                let mut state = inner.kinds.get(kind).lock().unwrap();
                if state.lifecycle == AdLifecycle::Initializing {
                    state.lifecycle = AdLifecycle::Idle;
                }
            }
            debug!("Provider initialization settled");
        });
    }

    /// Begins loading an interstitial ad. Returns whether a new load
    /// cycle was started (a load already in flight is a logged no-op).
    pub fn load_interstitial(&self) -> bool {
        Arc::clone(&self.inner).request_load(AdKind::Interstitial)
    }

    /// Begins loading a rewarded ad. Same no-op semantics as
    /// [`load_interstitial`](Self::load_interstitial).
    pub fn load_rewarded(&self) -> bool {
        Arc::clone(&self.inner).request_load(AdKind::Rewarded)
    }

    /// Shows a loaded interstitial ad, if one is ready.
    pub fn show_interstitial(&self) -> bool {
        Arc::clone(&self.inner).show(AdKind::Interstitial)
    }

    /// Shows a loaded rewarded ad, if one is ready. The granted amount is
    /// reported through [`AdEvent::RewardGranted`].
    pub fn show_rewarded(&self) -> bool {
        Arc::clone(&self.inner).show(AdKind::Rewarded)
    }

    /// Requests a rewarded ad worth `amount` credits on the user's behalf.
    ///
    /// Rejects synchronously, with no state change and no network call,
    /// when the amount is out of range or another request is pending.
    /// Otherwise either shows a ready rewarded ad immediately, or stores
    /// the single pending request, emits
    /// [`AdEvent::RewardLoadingStarted`], and triggers a rewarded load.
    pub fn watch_ad_for_reward(&self, amount: u32) -> Result<(), RewardRequestError> {
        let inner = &self.inner;
        if !inner.config.is_valid_reward_request(amount) {
            return Err(RewardRequestError::AmountOutOfRange(amount));
        }

        {
            let mut pending = inner.pending_reward.lock().unwrap();
            if pending.is_some() {
                return Err(RewardRequestError::RequestPending);
            }

            if inner.entitlements.ads_disabled() {
                // A load entry point like any other: never start loading
                // for an entitled user, and never show a loading UI.
                debug!("Ads disabled, reward request cannot be served");
                drop(pending);
                inner.sink.emit(AdEvent::RewardLoadingFailed);
                return Ok(());
            }

            if inner.mediation.peek_ready(AdKind::Rewarded) {
                info!(amount, "Rewarded ad already ready, showing immediately");
                drop(pending);
                Arc::clone(inner).show(AdKind::Rewarded);
                return Ok(());
            }

            *pending = Some(PendingRewardRequest { amount });
        }

        inner.sink.emit(AdEvent::RewardLoadingStarted { amount });
        Arc::clone(inner).request_load(AdKind::Rewarded);
        Ok(())
    }

    /// Whether any ad kind has a verified-ready ad.
    pub fn is_any_ad_ready(&self) -> bool {
        AdKind::ALL
            .iter()
            .any(|kind| self.inner.mediation.peek_ready(*kind))
    }

    /// Current lifecycle state for an ad kind.
    pub fn lifecycle(&self, kind: AdKind) -> AdLifecycle {
        self.inner.kinds.get(kind).lock().unwrap().lifecycle
    }

    /// Amount of the pending reward request, if one is held.
    pub fn pending_reward_amount(&self) -> Option<u32> {
        self.inner.pending_reward.lock().unwrap().map(|r| r.amount)
    }

    /// Releases the orchestrator: cancels every pending timer and
    /// background task first, then releases all providers and clears all
    /// state. No callback mutates state after this returns.
    ///
    /// Release is one-shot teardown: the cancellation covers the whole
    /// orchestrator lifetime, so a released instance accepts no further
    /// loads. Build a new orchestrator for a new session.
    pub fn release(&self) {
        info!("Releasing ad orchestrator");
        // Timers and load cycles observe the token before touching state.
        self.inner.shutdown.cancel();
        self.inner.mediation.release();
        for kind in AdKind::ALL {
            let mut state = self.inner.kinds.get(kind).lock().unwrap();
            state.lifecycle = AdLifecycle::Uninitialized;
            state.retry.reset();
            state.cycle += 1;
        }
        *self.inner.pending_reward.lock().unwrap() = None;
    }
}

impl std::fmt::Debug for AdOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdOrchestrator")
            .field("mediation", &self.inner.mediation)
            .field("pending_reward", &*self.inner.pending_reward.lock().unwrap())
            .finish_non_exhaustive()
    }
}

impl OrchestratorInner {
    /// Entry point for every load: checks the entitlement and the
    /// in-flight guard, resets retry state, and spawns the load cycle.
    fn request_load(self: Arc<Self>, kind: AdKind) -> bool {
        if self.entitlements.ads_disabled() {
            debug!(%kind, "Ads disabled, skipping load");
            return false;
        }
        if self.shutdown.is_cancelled() {
            return false;
        }

        let cycle = {
            let mut state = self.kinds.get(kind).lock().unwrap();
            if !state.lifecycle.accepts_load() {
                info!(%kind, lifecycle = %state.lifecycle, "Load request ignored");
                return false;
            }
            state.retry.reset();
            state.cycle += 1;
            state.lifecycle = AdLifecycle::Loading;
            state.cycle
        };

        let inner = Arc::clone(&self);
        tokio::spawn(async move {
            inner.run_load_cycle(kind, cycle).await;
        });
        true
    }

    /// One load cycle: waterfall walk under the timeout watchdog, with
    /// bounded fixed-backoff retries on terminal failure.
    async fn run_load_cycle(self: Arc<Self>, kind: AdKind, cycle: u64) {
        loop {
            // The walk runs in its own task: when the watchdog fires the
            // attempt is abandoned without cancelling downstream work.
            let walk = tokio::spawn({
                let mediation = Arc::clone(&self.mediation);
                async move { mediation.load_ad(kind).await }
            });

            let result = tokio::select! {
                _ = self.shutdown.cancelled() => return,
                _ = tokio::time::sleep(self.config.load_timeout) => {
                    warn!(%kind, timeout_ms = self.config.load_timeout.as_millis() as u64,
                        "Load watchdog expired, abandoning attempt");
                    Arc::clone(&self).finish_load(
                        kind,
                        cycle,
                        Err(WaterfallError::LoadTimeout {
                            kind,
                            timeout: self.config.load_timeout,
                        }),
                    );
                    return;
                }
                result = walk => result,
            };

            let result = match result {
                Ok(result) => result,
                Err(join_err) => {
                    error!(%kind, error = %join_err, "Waterfall walk panicked");
                    Err(WaterfallError::AllProvidersExhausted { kind, attempts: 0 })
                }
            };

            match result {
                Ok(loaded) => {
                    Arc::clone(&self).finish_load(kind, cycle, Ok(loaded));
                    return;
                }
                Err(err @ WaterfallError::WalkInFlight { .. }) => {
                    // An abandoned walk still holds the guard. Report the
                    // collision as a terminal failure so the caller is not
                    // left waiting on an accepted load that never settles.
                    debug!(%kind, "Walk guard busy, failing load cycle");
                    Arc::clone(&self).finish_load(kind, cycle, Err(err));
                    return;
                }
                Err(err) => {
                    let retry_again = {
                        let mut state = self.kinds.get(kind).lock().unwrap();
                        if state.cycle != cycle || !state.lifecycle.is_loading() {
                            debug!(%kind, cycle, "Stale load cycle, dropping");
                            return;
                        }
                        state.retry.record_failure(&self.retry_policy)
                    };

                    if !retry_again {
                        Arc::clone(&self).finish_load(kind, cycle, Err(err));
                        return;
                    }

                    debug!(
                        %kind,
                        backoff_ms = self.retry_policy.backoff.as_millis() as u64,
                        "Waterfall failed, scheduling retry"
                    );
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return,
                        _ = tokio::time::sleep(self.retry_policy.backoff) => {}
                    }
                }
            }
        }
    }

    /// Settles a load cycle exactly once. Late results from superseded
    /// cycles are ignored.
    fn finish_load(self: Arc<Self>, kind: AdKind, cycle: u64, result: Result<LoadedAd, WaterfallError>) {
        {
            let mut state = self.kinds.get(kind).lock().unwrap();
            if state.cycle != cycle || !state.lifecycle.is_loading() {
                debug!(%kind, cycle, "Ignoring result for superseded load cycle");
                return;
            }
            match &result {
                Ok(_) => {
                    state.lifecycle = AdLifecycle::Ready;
                    state.retry.reset();
                }
                Err(_) => {
                    state.lifecycle = AdLifecycle::Idle;
                }
            }
        }

        match result {
            Ok(loaded) => {
                self.sink.emit(AdEvent::AdLoaded {
                    kind,
                    provider: loaded.provider,
                });
                if kind == AdKind::Rewarded {
                    self.fulfill_pending_reward();
                }
            }
            Err(error) => {
                self.sink.emit(AdEvent::AdLoadFailed { kind, error });
                if kind == AdKind::Rewarded {
                    self.abandon_pending_reward();
                }
            }
        }
    }

    /// Shows a ready rewarded ad for the pending request, if one is held.
    fn fulfill_pending_reward(self: Arc<Self>) {
        let pending = self.pending_reward.lock().unwrap().take();
        if let Some(request) = pending {
            info!(amount = request.amount, "Rewarded ad ready for pending request");
            self.sink.emit(AdEvent::RewardLoadingSucceeded);
            self.show(AdKind::Rewarded);
        }
    }

    /// Abandons the pending reward request after exhaustion or timeout.
    fn abandon_pending_reward(&self) {
        if self.pending_reward.lock().unwrap().take().is_some() {
            self.sink.emit(AdEvent::RewardLoadingFailed);
        }
    }

    /// Delegates show to the verified-ready provider, if any, and watches
    /// for the close.
    fn show(self: Arc<Self>, kind: AdKind) -> bool {
        {
            let state = self.kinds.get(kind).lock().unwrap();
            if state.lifecycle.is_showing() {
                info!(%kind, "An ad is already showing, ignoring");
                return false;
            }
        }

        let provider = match self.mediation.ready_provider(kind) {
            Some(provider) => provider,
            None => {
                info!(%kind, "Nothing ready to show");
                return false;
            }
        };

        {
            let mut state = self.kinds.get(kind).lock().unwrap();
            state.lifecycle = AdLifecycle::Showing;
        }
        info!(provider = provider.name(), %kind, "Showing ad");

        let inner = Arc::clone(&self);
        tokio::spawn(async move {
            let show = tokio::spawn({
                let provider = Arc::clone(&provider);
                async move { provider.show(kind).await }
            });

            let outcome = tokio::select! {
                _ = inner.shutdown.cancelled() => return,
                outcome = show => outcome,
            };

            match outcome {
                Ok(Ok(outcome)) => {
                    if kind == AdKind::Rewarded {
                        if let Some(reported) = outcome.reward {
                            let granted = inner.config.clamp_reward(reported);
                            info!(reported, granted, "User earned reward");
                            inner.sink.emit(AdEvent::RewardGranted { amount: granted });
                        }
                    }
                    inner.sink.emit(AdEvent::AdClosed { kind });
                    inner.settle_after_show(kind);
                    Arc::clone(&inner).schedule_reload(kind);
                }
                Ok(Err(e)) => {
                    warn!(%kind, code = e.code, error = %e, "Show failed");
                    inner.settle_after_show(kind);
                }
                Err(join_err) => {
                    error!(%kind, error = %join_err, "Show task panicked");
                    inner.settle_after_show(kind);
                }
            }
        });
        true
    }

    /// Returns the kind to Idle once the ad leaves the screen.
    fn settle_after_show(&self, kind: AdKind) {
        let mut state = self.kinds.get(kind).lock().unwrap();
        if state.lifecycle.is_showing() {
            state.lifecycle = AdLifecycle::Idle;
        }
    }

    /// Schedules the close-triggered reload unless ads are disabled.
    fn schedule_reload(self: Arc<Self>, kind: AdKind) {
        if self.entitlements.ads_disabled() {
            debug!(%kind, "Ads disabled, skipping reload after close");
            return;
        }
        let inner = Arc::clone(&self);
        tokio::spawn(async move {
            tokio::select! {
                _ = inner.shutdown.cancelled() => return,
                _ = tokio::time::sleep(inner.config.reload_delay) => {}
            }
            // The entitlement and in-flight guard are re-checked at entry.
            Arc::clone(&inner).request_load(kind);
        });
    }
}
