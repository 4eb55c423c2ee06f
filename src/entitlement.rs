//! Ads-disabled entitlement check.
//!
//! Some users hold a standing entitlement that disables ads entirely. The
//! check is consulted at every load entry point (caller-initiated loads,
//! close-triggered reloads, reward requests) so a mid-session purchase
//! takes effect immediately.

use std::sync::atomic::{AtomicBool, Ordering};

/// Entitlement query consulted before any load is started.
pub trait EntitlementCheck: Send + Sync {
    /// Returns `true` when the user holds the ads-disabled entitlement.
    fn ads_disabled(&self) -> bool;
}

/// Entitlement check for users without an ads-disabled grant.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysEntitled;

impl EntitlementCheck for AlwaysEntitled {
    fn ads_disabled(&self) -> bool {
        false
    }
}

/// Togglable entitlement backed by an atomic flag.
///
/// Hosts flip the flag when the entitlement state changes (e.g. after a
/// purchase restores).
#[derive(Debug, Default)]
pub struct StaticEntitlement {
    disabled: AtomicBool,
}

impl StaticEntitlement {
    /// Creates the entitlement with the given initial state.
    pub fn new(ads_disabled: bool) -> Self {
        Self {
            disabled: AtomicBool::new(ads_disabled),
        }
    }

    /// Updates the ads-disabled state.
    pub fn set_ads_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
    }
}

impl EntitlementCheck for StaticEntitlement {
    fn ads_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }
}
