//! Per-consumer event registry.
//!
//! A tool creates one [`EventRegistry`], registers callbacks for the events it
//! cares about and calls [`EventRegistry::unregister_all`] on teardown. Every
//! native attachment goes through a single dispatch shim that isolates callback
//! failures, and the registry is the sole owner of the attachment handles it
//! created, so teardown detaches exactly what this consumer attached.
//!
//! Invariants:
//! - a [`Subscription`] is present iff its callback is attached to the native event;
//! - at most one subscription per (event, callback) pair, so re-registering never double-fires.

use crate::callback::{CallbackId, EventCallback};
use crate::dispatch::guarded_call;
use crate::event::{Caller, EventContext, EventKind, FileEvent};
use crate::hub::{ConnectionId, EventHub, NativeEventSource, NativeHandler};
use crate::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Identity of the registry that owns a subscription.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RegistryId(Uuid);

impl RegistryId {
    #[inline]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[inline]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RegistryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One callback attached to one logical event.
#[derive(Debug, Clone)]
pub struct Subscription {
    pub kind: EventKind,
    pub callback: EventCallback,
    pub connection: ConnectionId,
    pub owner: RegistryId,
}

type SubscriptionKey = (EventKind, CallbackId);

/// Collection of subscriptions owned by one consumer.
pub struct EventRegistry {
    id: RegistryId,
    source: Arc<dyn NativeEventSource>,
    subscriptions: Mutex<IndexMap<SubscriptionKey, Subscription>>,
}

impl EventRegistry {
    /// Create a registry attaching to `source`.
    pub fn new(source: Arc<dyn NativeEventSource>) -> Self {
        Self {
            id: RegistryId::new(),
            source,
            subscriptions: Mutex::new(IndexMap::new()),
        }
    }

    /// Create a registry attaching to the process-wide [`EventHub`].
    pub fn with_global_hub() -> Self {
        Self::new(EventHub::global())
    }

    #[inline]
    pub fn id(&self) -> RegistryId {
        self.id
    }

    fn subscriptions(&self) -> MutexGuard<'_, IndexMap<SubscriptionKey, Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach `callback` to the given file events.
    ///
    /// Events this callback is already subscribed to are skipped. Pass
    /// [`FileEvent::ALL`] for every file event.
    pub fn register_file_events(&self, callback: &EventCallback, events: &[FileEvent]) {
        let added = events
            .iter()
            .filter(|event| self.attach(EventKind::File(**event), callback))
            .count();
        info!(
            registry = %self.id,
            callback = callback.name(),
            events = ?events.iter().map(FileEvent::name).collect::<Vec<_>>(),
            added,
            "registered file event callback"
        );
    }

    /// Attach `callback` to the generic scene-mutation event. Idempotent per callback.
    pub fn register_scene_changes(&self, callback: &EventCallback) {
        if self.attach(EventKind::SceneChange, callback) {
            info!(
                registry = %self.id,
                callback = callback.name(),
                "registered scene change callback"
            );
        }
    }

    /// Attach `callback` to events given by name (`new`, `open`, `merge`, `save`, `scene_change`).
    ///
    /// All names are validated before anything is attached; an unknown name
    /// fails the whole call and leaves the registry unchanged.
    pub fn register_named(&self, callback: &EventCallback, names: &[&str]) -> Result<()> {
        let kinds = names
            .iter()
            .map(|name| name.parse::<EventKind>())
            .collect::<Result<Vec<_>>>()?;
        for kind in kinds {
            self.attach(kind, callback);
        }
        Ok(())
    }

    /// Detach file-event subscriptions.
    ///
    /// `callback = None` matches every callback; `events = None` matches every
    /// file event. Returns the number of subscriptions released; missing
    /// subscriptions are ignored.
    pub fn unregister_file_events(
        &self,
        callback: Option<&EventCallback>,
        events: Option<&[FileEvent]>,
    ) -> usize {
        self.release_where(|sub| {
            let Some(event) = sub.kind.file_event() else {
                return false;
            };
            callback.map_or(true, |cb| sub.callback == *cb)
                && events.map_or(true, |evs| evs.contains(&event))
        })
    }

    /// Detach scene-change subscriptions for `callback`, or all of them when `None`.
    pub fn unregister_scene_changes(&self, callback: Option<&EventCallback>) -> usize {
        self.release_where(|sub| {
            sub.kind == EventKind::SceneChange && callback.map_or(true, |cb| sub.callback == *cb)
        })
    }

    /// Release every subscription this registry owns. Safe to call repeatedly.
    pub fn unregister_all(&self) -> usize {
        let released = self.release_where(|_| true);
        if released > 0 {
            info!(registry = %self.id, released, "unregistered all event callbacks");
        }
        released
    }

    /// Number of active subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions().len()
    }

    /// Whether `callback` is attached to `kind` through this registry.
    pub fn is_subscribed(&self, kind: EventKind, callback: &EventCallback) -> bool {
        self.subscriptions().contains_key(&(kind, callback.id()))
    }

    /// Active subscriptions in registration order.
    pub fn subscriptions_snapshot(&self) -> Vec<Subscription> {
        self.subscriptions().values().cloned().collect()
    }

    fn attach(&self, kind: EventKind, callback: &EventCallback) -> bool {
        let mut subs = self.subscriptions();
        let key = (kind, callback.id());
        if subs.contains_key(&key) {
            debug!(
                registry = %self.id,
                callback = callback.name(),
                event = kind.name(),
                "already subscribed; skipping"
            );
            return false;
        }

        let connection = self.source.connect(kind, dispatch_shim(kind, callback.clone()));
        subs.insert(
            key,
            Subscription {
                kind,
                callback: callback.clone(),
                connection,
                owner: self.id,
            },
        );
        debug!(
            registry = %self.id,
            callback = callback.name(),
            event = kind.name(),
            connection = connection.0,
            "attached"
        );
        true
    }

    fn release_where<P>(&self, pred: P) -> usize
    where
        P: Fn(&Subscription) -> bool,
    {
        let mut released = Vec::new();
        self.subscriptions().retain(|_, sub| {
            if pred(sub) {
                released.push(sub.clone());
                false
            } else {
                true
            }
        });

        for sub in &released {
            if self.source.disconnect(sub.kind, sub.connection) {
                debug!(
                    registry = %self.id,
                    callback = sub.callback.name(),
                    event = sub.kind.name(),
                    "detached"
                );
            } else {
                warn!(
                    registry = %self.id,
                    callback = sub.callback.name(),
                    event = sub.kind.name(),
                    "native connection was already gone"
                );
            }
        }
        released.len()
    }
}

/// The single native-side entry point for a subscription.
fn dispatch_shim(kind: EventKind, callback: EventCallback) -> NativeHandler {
    Arc::new(move |caller: &Caller, ctx: &EventContext| {
        if let Err(err) = guarded_call(callback.name(), kind.name(), || callback.call(caller, ctx))
        {
            error!(
                callback = err.callback(),
                event = err.event(),
                error = %err,
                "event callback failed"
            );
        }
    })
}

impl Drop for EventRegistry {
    fn drop(&mut self) {
        let released = self.unregister_all();
        if released > 0 {
            debug!(registry = %self.id, released, "released subscriptions on drop");
        }
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("id", &self.id)
            .field("subscriptions", &self.subscription_count())
            .finish()
    }
}

/// Create a registry with `callback` attached to `events`. Keep it to unregister later.
pub fn register_file_callback(
    source: Arc<dyn NativeEventSource>,
    callback: &EventCallback,
    events: &[FileEvent],
) -> EventRegistry {
    let registry = EventRegistry::new(source);
    registry.register_file_events(callback, events);
    registry
}

/// Create a registry with `callback` attached to scene changes.
pub fn register_scene_callback(
    source: Arc<dyn NativeEventSource>,
    callback: &EventCallback,
) -> EventRegistry {
    let registry = EventRegistry::new(source);
    registry.register_scene_changes(callback);
    registry
}
