//! Device-classification collaborator.
//!
//! The waterfall order depends on the device class. Classification itself
//! is external to this crate; the engine only consumes the result through
//! the [`DeviceClassifier`] trait, exactly once at initialization.

/// Coarse device class that selects the provider priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// Handset form factor.
    Phone,
    /// Tablet form factor.
    Tablet,
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceClass::Phone => write!(f, "phone"),
            DeviceClass::Tablet => write!(f, "tablet"),
        }
    }
}

/// Pure classification query, evaluated once per session.
pub trait DeviceClassifier: Send + Sync {
    /// Returns the device class for this session.
    fn device_class(&self) -> DeviceClass;
}

/// Classifier returning a fixed class. Useful for hosts that classify
/// elsewhere, and for tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedDeviceClassifier {
    class: DeviceClass,
}

impl FixedDeviceClassifier {
    /// Creates a classifier that always returns `class`.
    pub fn new(class: DeviceClass) -> Self {
        Self { class }
    }
}

impl DeviceClassifier for FixedDeviceClassifier {
    fn device_class(&self) -> DeviceClass {
        self.class
    }
}
