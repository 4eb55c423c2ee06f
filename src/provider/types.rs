//! Provider types and the AdProvider capability trait.

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Error code a provider reports when asked to load before initialization.
pub const CODE_NOT_INITIALIZED: i32 = -1;

/// Conventional "no fill" error code (network had no ad to serve).
pub const CODE_NO_FILL: i32 = 3;

/// The two ad formats the waterfall mediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdKind {
    /// Full-screen ad shown at a natural transition point.
    Interstitial,
    /// Ad format granting the user an in-app credit on completion.
    Rewarded,
}

impl AdKind {
    /// All ad kinds, in a fixed order.
    pub const ALL: [AdKind; 2] = [AdKind::Interstitial, AdKind::Rewarded];

    /// Stable index for per-kind storage.
    pub fn index(&self) -> usize {
        match self {
            AdKind::Interstitial => 0,
            AdKind::Rewarded => 1,
        }
    }
}

impl std::fmt::Display for AdKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdKind::Interstitial => write!(f, "interstitial"),
            AdKind::Rewarded => write!(f, "rewarded"),
        }
    }
}

/// Two-slot container holding one value per [`AdKind`].
///
/// Used for per-kind cursors, guards, and lifecycle state.
#[derive(Debug, Default, Clone)]
pub struct PerKind<T> {
    slots: [T; 2],
}

impl<T> PerKind<T> {
    /// Builds a container by invoking `f` once per kind.
    pub fn from_fn(mut f: impl FnMut(AdKind) -> T) -> Self {
        Self {
            slots: [f(AdKind::Interstitial), f(AdKind::Rewarded)],
        }
    }

    /// Returns the slot for the given kind.
    pub fn get(&self, kind: AdKind) -> &T {
        &self.slots[kind.index()]
    }

    /// Returns the mutable slot for the given kind.
    pub fn get_mut(&mut self, kind: AdKind) -> &mut T {
        &mut self.slots[kind.index()]
    }
}

/// Opaque error reported by a provider across the mediation boundary.
///
/// Providers never panic across the boundary; every init or load failure
/// is reported as a `(code, message)` pair whose meaning is vendor-specific.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    /// Vendor-specific numeric code.
    pub code: i32,
    /// Human-readable description for logging.
    pub message: String,
}

impl ProviderError {
    /// Creates a provider error from a code and message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Error a provider reports when `load` is called before `initialize`
    /// (or after `release`).
    pub fn not_initialized() -> Self {
        Self::new(CODE_NOT_INITIALIZED, "provider not initialized")
    }

    /// Conventional "no fill" failure.
    pub fn no_fill() -> Self {
        Self::new(CODE_NO_FILL, "no fill")
    }
}

/// Outcome of showing an ad, resolved when the ad is dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShowOutcome {
    /// Network-reported reward amount (rewarded kind only, at most once,
    /// delivered together with the close). `None` when no reward was earned.
    pub reward: Option<u32>,
}

/// Boxed future returned by provider operations.
///
/// Boxing keeps [`AdProvider`] object-safe so providers can be held as
/// `Arc<dyn AdProvider>` and swapped for test doubles.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Capability contract for a single ad-network integration.
///
/// One implementation exists per vendor network; the concrete adapter code
/// (vendor SDK calls) lives outside this crate and is plugged in through
/// the [`ProviderRegistry`](super::ProviderRegistry).
///
/// # Contract
///
/// - `load` resolves exactly once per load cycle: `Ok(())` for loaded,
///   `Err` for failed-to-load. Never both, never twice.
/// - `show` resolves when the ad is dismissed. For the rewarded kind the
///   outcome carries the network-reported reward amount, at most once.
/// - After `release`, `is_loaded` is `false` and `load` fails with
///   [`ProviderError::not_initialized`] until `initialize` is called again.
pub trait AdProvider: Send + Sync {
    /// Unique provider name for logging and readiness tracking.
    fn name(&self) -> &str;

    /// Readies the underlying network. Idempotent-safe; a failure leaves
    /// the provider unavailable until re-initialized.
    fn initialize(&self) -> ProviderFuture<'_, ()>;

    /// Begins one asynchronous load cycle for the given kind.
    fn load(&self, kind: AdKind) -> ProviderFuture<'_, ()>;

    /// Displays a previously loaded ad, resolving on dismissal.
    fn show(&self, kind: AdKind) -> ProviderFuture<'_, ShowOutcome>;

    /// Pure readiness query; `false` once shown or expired.
    fn is_loaded(&self, kind: AdKind) -> bool;

    /// Releases the provider. Idempotent.
    fn release(&self);
}
