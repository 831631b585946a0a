//! Error types for event registration and dispatch

use serde::{Deserialize, Serialize};

/// Failure of the registration API itself; surfaced to the caller immediately.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RegistrationError {
    /// Logical event name is not one of `new`, `open`, `merge`, `save`, `scene_change`
    #[error("Unknown event name: '{name}'")]
    UnknownEvent { name: String },

    /// Name is valid but belongs to the other event category
    #[error("Event '{name}' is not a {expected} event")]
    WrongCategory { name: String, expected: String },
}

/// Failure of a callback during event delivery.
///
/// Never propagates past the dispatch boundary; it is logged and dropped.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DispatchError {
    /// Callback returned an error
    #[error("Callback '{callback}' failed on '{event}': {reason}")]
    Failed {
        callback: String,
        event: String,
        reason: String,
    },

    /// Callback panicked
    #[error("Callback '{callback}' panicked on '{event}': {message}")]
    Panicked {
        callback: String,
        event: String,
        message: String,
    },
}

impl DispatchError {
    /// Name of the callback that failed
    pub fn callback(&self) -> &str {
        match self {
            Self::Failed { callback, .. } | Self::Panicked { callback, .. } => callback,
        }
    }

    /// Label of the event being delivered when the callback failed
    pub fn event(&self) -> &str {
        match self {
            Self::Failed { event, .. } | Self::Panicked { event, .. } => event,
        }
    }
}
