//! xMobu events core
//!
//! Turns the host application's native file-lifecycle and scene-mutation
//! signals into per-consumer subscriptions that can always be torn down.
//!
//! - [`EventHub`]: in-process native event source (one per process via [`EventHub::global`]).
//! - [`EventRegistry`]: per-tool set of subscriptions; releases every attachment it made.
//! - [`guarded_call`]: dispatch boundary that turns callback failures into logged [`DispatchError`]s.

pub mod callback;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod hub;
pub mod registry;

// Re-exports for consumers (tools, scene monitor)
pub use callback::{CallbackId, EventCallback};
pub use dispatch::guarded_call;
pub use error::{DispatchError, RegistrationError};
pub use event::{Caller, EventContext, EventKind, FileEvent, SceneChangeType};
pub use hub::{ConnectionId, EventHub, NativeEventSource, NativeHandler};
pub use registry::{
    register_file_callback, register_scene_callback, EventRegistry, RegistryId, Subscription,
};

/// Result type for registration calls.
pub type Result<T> = core::result::Result<T, RegistrationError>;
