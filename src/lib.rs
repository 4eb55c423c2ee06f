//! AdWaterfall - Ad-mediation waterfall engine
//!
//! This library coordinates a prioritized list of independent ad-network
//! providers behind one unified API. Providers are initialized concurrently,
//! and each ad request (interstitial or rewarded) walks the providers in
//! priority order until one succeeds or all are exhausted, with bounded
//! retries, load timeouts, and a reload-after-close policy.
//!
//! # High-Level API
//!
//! For most use cases, the [`orchestrator`] module provides the app-facing
//! surface:
//!
//! ```ignore
//! use adwaterfall::orchestrator::AdOrchestrator;
//! use adwaterfall::provider::{AdKind, ProviderRegistry};
//! use adwaterfall::device::{DeviceClass, FixedDeviceClassifier};
//! use adwaterfall::config::MediationConfig;
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register(NetworkId::AdMob, || Arc::new(my_admob_adapter()));
//!
//! let orchestrator = AdOrchestrator::builder()
//!     .registry(registry)
//!     .classifier(FixedDeviceClassifier::new(DeviceClass::Phone))
//!     .build();
//!
//! orchestrator.initialize();
//! orchestrator.load_interstitial();
//! ```

pub mod config;
pub mod device;
pub mod entitlement;
pub mod error;
pub mod events;
pub mod logging;
pub mod mediation;
pub mod orchestrator;
pub mod provider;
pub mod retry;

/// Version of the AdWaterfall library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
