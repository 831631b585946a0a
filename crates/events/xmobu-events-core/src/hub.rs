//! Native event source: the host's process-wide dispatch tables.
//!
//! [`NativeEventSource`] is the seam a real host integration implements.
//! [`EventHub`] is the in-process implementation used by the simulated host
//! and by tests. Each kind keeps an ordered list of independent attachments;
//! any number of consumers can attach to the same kind and detach only what
//! they attached.

use crate::event::{Caller, EventContext, EventKind};
use hashbrown::HashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Handle to one attachment on a native event.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

/// Handler attached to a native event. Must not unwind; see [`crate::guarded_call`].
pub type NativeHandler = Arc<dyn Fn(&Caller, &EventContext) + Send + Sync>;

/// Trait for the host's native event dispatch tables.
pub trait NativeEventSource: Send + Sync {
    /// Attach a handler; returns the handle needed to detach it.
    fn connect(&self, kind: EventKind, handler: NativeHandler) -> ConnectionId;

    /// Detach a handler. Returns false if the connection was not attached.
    fn disconnect(&self, kind: EventKind, connection: ConnectionId) -> bool;

    /// Number of handlers currently attached to `kind`.
    fn connection_count(&self, kind: EventKind) -> usize;
}

static GLOBAL_HUB: Lazy<Arc<EventHub>> = Lazy::new(|| Arc::new(EventHub::new()));

/// In-process native event source.
pub struct EventHub {
    next_connection: AtomicU64,
    slots: Mutex<HashMap<EventKind, Vec<(ConnectionId, NativeHandler)>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            next_connection: AtomicU64::new(0),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide hub.
    pub fn global() -> Arc<EventHub> {
        Arc::clone(&GLOBAL_HUB)
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<(ConnectionId, NativeHandler)>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fire a native event, invoking every handler attached when the firing starts.
    ///
    /// The table lock is released before handlers run, so handlers may attach
    /// or detach; such changes apply from the next firing. Returns the number
    /// of handlers invoked.
    pub fn fire(&self, kind: EventKind, caller: &Caller, ctx: &EventContext) -> usize {
        let handlers: Vec<NativeHandler> = self
            .slots()
            .get(&kind)
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        debug!(
            event = kind.name(),
            caller = %caller.name,
            handlers = handlers.len(),
            "firing native event"
        );
        for handler in &handlers {
            handler(caller, ctx);
        }
        handlers.len()
    }

    /// Total attachments across every kind.
    pub fn total_connections(&self) -> usize {
        self.slots().values().map(Vec::len).sum()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeEventSource for EventHub {
    fn connect(&self, kind: EventKind, handler: NativeHandler) -> ConnectionId {
        let id = ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed));
        self.slots().entry(kind).or_default().push((id, handler));
        id
    }

    fn disconnect(&self, kind: EventKind, connection: ConnectionId) -> bool {
        let mut slots = self.slots();
        let Some(list) = slots.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(id, _)| *id != connection);
        let removed = list.len() != before;
        if list.is_empty() {
            slots.remove(&kind);
        }
        removed
    }

    fn connection_count(&self, kind: EventKind) -> usize {
        self.slots().get(&kind).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("connections", &self.total_connections())
            .finish()
    }
}
