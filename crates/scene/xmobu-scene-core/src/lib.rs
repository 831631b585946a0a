//! xMobu scene core
//!
//! One authoritative view of "scene shape" (object count and namespace set),
//! recomputed on file-lifecycle and scene-mutation events and broadcast to any
//! number of tool listeners.
//!
//! Tools normally only touch [`scene_monitor`], [`SceneMonitor::add_listener`]
//! and [`SceneMonitor::get_scene_info`]; the native event plumbing lives in
//! `xmobu_events`.

pub mod config;
pub mod error;
pub mod host;
pub mod monitor;
pub mod scene;
pub mod snapshot;

// Re-exports for consumers (tools)
pub use config::MonitorConfig;
pub use error::{ConfigError, SceneError};
pub use host::HostApplication;
pub use monitor::{scene_monitor, MonitorState, SceneListener, SceneMonitor};
pub use scene::{InMemoryScene, SceneSource};
pub use snapshot::{namespace_of, SceneSnapshot, DEFAULT_SEPARATOR};
pub use xmobu_events::{EventCallback, EventKind, FileEvent, SceneChangeType};
