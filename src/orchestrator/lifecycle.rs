//! Per-kind ad lifecycle state machine.
//!
//! ```text
//! Uninitialized --initialize()--> Initializing
//! Initializing --providers settled--> Idle
//! Idle --load--> Loading
//! Loading --success--> Ready
//! Loading --failure, retries remain--> Loading (after backoff)
//! Loading --failure, retries exhausted--> Idle (reported)
//! Loading --timeout--> Idle
//! Ready --show--> Showing
//! Showing --reward earned--> Showing
//! Showing --closed--> Idle (+ scheduled reload)
//! ```

/// Lifecycle state of one ad kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AdLifecycle {
    /// No initialization has been requested yet.
    #[default]
    Uninitialized,

    /// Provider initialization tasks are settling.
    Initializing,

    /// No ad loaded and no load in flight.
    Idle,

    /// A waterfall walk (possibly with retries) is in flight.
    Loading,

    /// An ad is loaded and waiting to be shown.
    Ready,

    /// An ad is on screen.
    Showing,
}

impl AdLifecycle {
    /// Whether a new load may start from this state.
    ///
    /// Loads are rejected while one is already in flight or an ad is on
    /// screen; every other state accepts (the walk itself waits for
    /// initialization with a bounded budget).
    pub fn accepts_load(&self) -> bool {
        !matches!(self, Self::Loading | Self::Showing)
    }

    /// Whether an ad is currently on screen.
    pub fn is_showing(&self) -> bool {
        matches!(self, Self::Showing)
    }

    /// Whether a load is in flight.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl std::fmt::Display for AdLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Initializing => write!(f, "Initializing"),
            Self::Idle => write!(f, "Idle"),
            Self::Loading => write!(f, "Loading"),
            Self::Ready => write!(f, "Ready"),
            Self::Showing => write!(f, "Showing"),
        }
    }
}
