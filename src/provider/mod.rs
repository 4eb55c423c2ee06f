//! Ad-network provider abstraction.
//!
//! This module provides the capability trait implemented once per ad
//! network, plus the registry that turns a device-class priority order
//! into a concrete provider list.
//!
//! # Factory Pattern
//!
//! Vendor adapters are registered by the host and resolved centrally:
//!
//! ```ignore
//! use adwaterfall::provider::{NetworkId, ProviderRegistry};
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register(NetworkId::AdMob, || Arc::new(admob_adapter()));
//! let providers = registry.build_waterfall(DeviceClass::Phone);
//! ```

#[cfg(test)]
pub(crate) mod mock;
mod registry;
mod types;

pub use registry::{waterfall_order, NetworkId, ProviderRegistry};
pub use types::{
    AdKind, AdProvider, PerKind, ProviderError, ProviderFuture, ShowOutcome,
    CODE_NOT_INITIALIZED, CODE_NO_FILL,
};

#[cfg(test)]
pub(crate) use mock::MockAdProvider;
