//! Configuration for the scene monitor

use crate::ConfigError;
use crate::DEFAULT_SEPARATOR;
use serde::{Deserialize, Serialize};
use xmobu_events::FileEvent;

/// Which events trigger a scene recomputation, and how names are split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// File events that trigger a rescan
    pub file_events: Vec<FileEvent>,
    /// Whether generic scene mutations trigger a rescan
    pub watch_scene_changes: bool,
    /// Ignore scene mutations that cannot change object names (selection etc.)
    pub structural_changes_only: bool,
    /// Separator between namespace and object name
    pub namespace_separator: char,
    /// Scan once during activation
    pub initial_scan: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            file_events: vec![FileEvent::New, FileEvent::Open, FileEvent::Merge],
            watch_scene_changes: true,
            structural_changes_only: false,
            namespace_separator: DEFAULT_SEPARATOR,
            initial_scan: true,
        }
    }
}

impl MonitorConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace_separator.is_whitespace() {
            return Err(ConfigError::InvalidValue {
                reason: "Namespace separator must not be whitespace".to_string(),
            });
        }
        if self.file_events.is_empty() && !self.watch_scene_changes {
            return Err(ConfigError::NothingWatched);
        }
        Ok(())
    }

    #[inline]
    pub fn with_file_events(mut self, events: &[FileEvent]) -> Self {
        self.file_events = events.to_vec();
        self
    }

    #[inline]
    pub fn with_scene_changes(mut self, watch: bool) -> Self {
        self.watch_scene_changes = watch;
        self
    }

    #[inline]
    pub fn with_structural_changes_only(mut self, only: bool) -> Self {
        self.structural_changes_only = only;
        self
    }

    #[inline]
    pub fn with_separator(mut self, separator: char) -> Self {
        self.namespace_separator = separator;
        self
    }

    #[inline]
    pub fn with_initial_scan(mut self, scan: bool) -> Self {
        self.initial_scan = scan;
        self
    }
}
