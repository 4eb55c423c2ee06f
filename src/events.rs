//! Application-facing event surface.
//!
//! The engine reports load results, close notifications, and the reward
//! flow as structured events through the [`AdEventSink`] trait. The UI
//! layer subscribes (typically via [`ChannelAdEventSink`]); dialog
//! presentation itself is external to this crate.

use crate::error::WaterfallError;
use crate::provider::AdKind;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Event emitted by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdEvent {
    /// An ad of `kind` finished loading from the named provider.
    AdLoaded { kind: AdKind, provider: String },

    /// A load attempt terminally failed (exhaustion or timeout).
    AdLoadFailed { kind: AdKind, error: WaterfallError },

    /// An ad was dismissed.
    AdClosed { kind: AdKind },

    /// A reward request was accepted and a rewarded load began.
    RewardLoadingStarted { amount: u32 },

    /// The rewarded ad for a pending request finished loading.
    RewardLoadingSucceeded,

    /// The pending reward request was abandoned (retries exhausted or
    /// load timed out).
    RewardLoadingFailed,

    /// The user earned a reward; `amount` is already clamped to the
    /// grantable range.
    RewardGranted { amount: u32 },
}

/// Sink for orchestrator events.
///
/// Implementations must be cheap and non-blocking; events are emitted from
/// the orchestrator's background tasks.
pub trait AdEventSink: Send + Sync {
    /// Delivers one event.
    fn emit(&self, event: AdEvent);
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAdEventSink;

impl AdEventSink for NullAdEventSink {
    fn emit(&self, _event: AdEvent) {}
}

/// Sink that logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAdEventSink;

impl AdEventSink for TracingAdEventSink {
    fn emit(&self, event: AdEvent) {
        match &event {
            AdEvent::AdLoaded { kind, provider } => {
                info!(%kind, provider, "Ad loaded");
            }
            AdEvent::AdLoadFailed { kind, error } => {
                warn!(%kind, %error, "Ad load failed");
            }
            AdEvent::AdClosed { kind } => {
                debug!(%kind, "Ad closed");
            }
            AdEvent::RewardLoadingStarted { amount } => {
                info!(amount, "Reward loading started");
            }
            AdEvent::RewardLoadingSucceeded => {
                info!("Reward loading succeeded");
            }
            AdEvent::RewardLoadingFailed => {
                warn!("Reward loading failed");
            }
            AdEvent::RewardGranted { amount } => {
                info!(amount, "Reward granted");
            }
        }
    }
}

/// Sink that forwards events over an unbounded channel for UI consumption.
#[derive(Debug, Clone)]
pub struct ChannelAdEventSink {
    tx: mpsc::UnboundedSender<AdEvent>,
}

impl ChannelAdEventSink {
    /// Creates a channel sink and the receiving half.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AdEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AdEventSink for ChannelAdEventSink {
    fn emit(&self, event: AdEvent) {
        // Receiver gone means the UI stopped listening; drop silently.
        let _ = self.tx.send(event);
    }
}

/// Sink that fans one event out to several sinks.
pub struct MultiplexAdEventSink {
    sinks: Vec<Arc<dyn AdEventSink>>,
}

impl MultiplexAdEventSink {
    /// Creates a multiplexing sink over the given sinks.
    pub fn new(sinks: Vec<Arc<dyn AdEventSink>>) -> Self {
        Self { sinks }
    }
}

impl AdEventSink for MultiplexAdEventSink {
    fn emit(&self, event: AdEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}
