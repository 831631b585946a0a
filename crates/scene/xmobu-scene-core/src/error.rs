//! Error types for the scene layer

use serde::{Deserialize, Serialize};

/// Failure while reading or mutating the scene
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SceneError {
    /// No object with this name exists
    #[error("Object not found: {name}")]
    ObjectNotFound { name: String },

    /// Wildcard pattern could not be compiled
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Scene could not be enumerated
    #[error("Scene unavailable: {reason}")]
    Unavailable { reason: String },
}

/// Invalid monitor configuration
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Invalid value: {reason}")]
    InvalidValue { reason: String },

    /// No file events and no scene changes: the monitor would never update
    #[error("Configuration watches no events")]
    NothingWatched,

    #[error("Failed to parse configuration: {reason}")]
    Parse { reason: String },
}
