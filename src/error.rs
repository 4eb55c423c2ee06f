//! Error types for the mediation waterfall.

use crate::provider::AdKind;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by a waterfall load attempt.
///
/// Provider-level failures never surface here directly; they advance the
/// walk and are reported through logging. Only attempt-terminal outcomes
/// become errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaterfallError {
    /// Every initialized provider was tried and failed.
    ///
    /// `attempts` counts actual load calls; uninitialized providers are
    /// skipped without attempting.
    #[error("all ad networks failed for {kind} ({attempts} attempted)")]
    AllProvidersExhausted { kind: AdKind, attempts: usize },

    /// Neither success nor failure arrived before the watchdog expired.
    /// Treated like exhaustion for user-facing purposes; the abandoned
    /// walk keeps running but its outcome is ignored.
    #[error("{kind} load timed out after {timeout:?}")]
    LoadTimeout { kind: AdKind, timeout: Duration },

    /// A walk for this kind is already in flight. A second load call is a
    /// logged no-op, not a user-facing failure.
    #[error("a {kind} load is already in flight")]
    WalkInFlight { kind: AdKind },
}

/// Synchronous rejection of a reward request.
///
/// Rejected before any state change or network call; no loading UI is
/// ever shown for these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RewardRequestError {
    /// Requested amount is outside the allowed range.
    #[error("reward amount {0} outside allowed range")]
    AmountOutOfRange(u32),

    /// A pending reward request already exists; at most one may be held.
    #[error("a reward request is already pending")]
    RequestPending,
}
