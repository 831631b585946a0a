//! Callback capability for native events.

use crate::event::{Caller, EventContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CALLBACK_ID: AtomicU64 = AtomicU64::new(0);

/// Process-unique identity of a callback.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallbackId(pub u64);

impl CallbackId {
    /// Allocate a fresh id. Monotonic for the lifetime of the process.
    #[inline]
    pub fn next() -> Self {
        Self(NEXT_CALLBACK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type CallbackFn = dyn Fn(&Caller, &EventContext) -> anyhow::Result<()> + Send + Sync;

/// A two-argument callback (caller, event context) with a stable identity.
///
/// Clones share identity; two callbacks built separately never compare equal.
#[derive(Clone)]
pub struct EventCallback {
    id: CallbackId,
    name: Arc<str>,
    func: Arc<CallbackFn>,
}

impl EventCallback {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Caller, &EventContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            id: CallbackId::next(),
            name: Arc::from(name.into()),
            func: Arc::new(func),
        }
    }

    #[inline]
    pub fn id(&self) -> CallbackId {
        self.id
    }

    /// Name used in diagnostics
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the callback directly, without the dispatch guard
    #[inline]
    pub fn call(&self, caller: &Caller, ctx: &EventContext) -> anyhow::Result<()> {
        (self.func)(caller, ctx)
    }
}

impl PartialEq for EventCallback {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventCallback {}

impl fmt::Debug for EventCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCallback")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
