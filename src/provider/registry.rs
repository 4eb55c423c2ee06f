//! Provider registry for centralized waterfall construction.
//!
//! Vendor-SDK adapter code lives outside this crate. Hosts register one
//! constructor per network, and the registry resolves the device-class
//! priority order into a concrete provider list. Networks without a
//! registered constructor are skipped with a warning rather than failing
//! the whole waterfall.

use super::types::AdProvider;
use crate::device::DeviceClass;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Identifier for a supported ad network.
///
/// New networks are added as new variants; the adapter implementation is
/// supplied by the host through [`ProviderRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkId {
    AdMob,
    UnityAds,
    AppLovin,
    IronSource,
    Vungle,
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkId::AdMob => write!(f, "AdMob"),
            NetworkId::UnityAds => write!(f, "UnityAds"),
            NetworkId::AppLovin => write!(f, "AppLovin"),
            NetworkId::IronSource => write!(f, "IronSource"),
            NetworkId::Vungle => write!(f, "Vungle"),
        }
    }
}

/// Provider priority order for the given device class.
///
/// Decided once at initialization and never re-derived mid-session.
pub fn waterfall_order(class: DeviceClass) -> &'static [NetworkId] {
    match class {
        DeviceClass::Phone => &[
            NetworkId::AdMob,
            NetworkId::UnityAds,
            NetworkId::AppLovin,
            NetworkId::IronSource,
        ],
        DeviceClass::Tablet => &[
            NetworkId::AdMob,
            NetworkId::AppLovin,
            NetworkId::UnityAds,
            NetworkId::Vungle,
        ],
    }
}

type ProviderBuilder = Box<dyn Fn() -> Arc<dyn AdProvider> + Send + Sync>;

/// Registry of host-supplied provider constructors.
///
/// # Example
///
/// ```ignore
/// let mut registry = ProviderRegistry::new();
/// registry.register(NetworkId::AdMob, || Arc::new(AdMobAdapter::new(ctx)));
/// let providers = registry.build_waterfall(DeviceClass::Phone);
/// ```
#[derive(Default)]
pub struct ProviderRegistry {
    builders: HashMap<NetworkId, ProviderBuilder>,
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a constructor for the given network, replacing any
    /// previous registration.
    pub fn register<F>(&mut self, id: NetworkId, builder: F)
    where
        F: Fn() -> Arc<dyn AdProvider> + Send + Sync + 'static,
    {
        self.builders.insert(id, Box::new(builder));
    }

    /// Returns whether a constructor is registered for the given network.
    pub fn is_registered(&self, id: NetworkId) -> bool {
        self.builders.contains_key(&id)
    }

    /// Builds the provider list for the given device class, in priority
    /// order. Unregistered networks are skipped with a warning.
    pub fn build_waterfall(&self, class: DeviceClass) -> Vec<Arc<dyn AdProvider>> {
        let order = waterfall_order(class);
        let mut providers = Vec::with_capacity(order.len());
        for id in order {
            match self.builders.get(id) {
                Some(builder) => providers.push(builder()),
                None => {
                    warn!(network = %id, device_class = %class, "No adapter registered, skipping network");
                }
            }
        }
        providers
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("registered", &self.builders.keys().collect::<Vec<_>>())
            .finish()
    }
}
