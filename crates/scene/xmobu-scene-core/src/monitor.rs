//! Scene monitor: a process-wide, event-driven view of scene shape.
//!
//! Lifecycle:
//! - `Uninitialized` until activated; activation attaches the monitor's own
//!   registry to the configured file events and scene changes, then scans once.
//! - `Active` for the rest of the monitor's life. Only listeners come and go.
//!
//! Each trigger runs one pass: enumerate → build snapshot → swap it in under
//! the state lock → notify listeners in insertion order. Enumeration and swap
//! sit under the pass lock, so snapshots are installed in scan order even
//! when triggers arrive on several threads. The listener list is copied after
//! the swap, so listeners added or removed while a pass is running take
//! effect from the next pass. A pass whose snapshot has been superseded stops
//! notifying; the newer pass delivers its own.

use crate::config::MonitorConfig;
use crate::host::HostApplication;
use crate::scene::SceneSource;
use crate::snapshot::SceneSnapshot;
use crate::{ConfigError, SceneError};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, error, info, warn};
use xmobu_events::{
    guarded_call, CallbackId, EventCallback, EventKind, EventRegistry, NativeEventSource,
};

static GLOBAL_MONITOR: Lazy<Arc<SceneMonitor>> = Lazy::new(|| {
    let host = HostApplication::global();
    let monitor = Arc::new(SceneMonitor::uninitialized(
        host.events(),
        host.scene(),
        MonitorConfig::default(),
    ));
    monitor.activate();
    monitor
});

/// The process-wide scene monitor, created and activated on first access.
///
/// Every call returns the same instance.
pub fn scene_monitor() -> Arc<SceneMonitor> {
    Arc::clone(&GLOBAL_MONITOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitorState {
    Uninitialized,
    Active,
}

type ListenerFn = dyn Fn(&SceneSnapshot) -> anyhow::Result<()> + Send + Sync;

/// Callback notified with each new snapshot. Identity is the id; clones share it.
#[derive(Clone)]
pub struct SceneListener {
    id: CallbackId,
    name: Arc<str>,
    func: Arc<ListenerFn>,
}

impl SceneListener {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&SceneSnapshot) -> anyhow::Result<()> + Send + Sync + 'static,
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

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the listener directly, without the dispatch guard
    #[inline]
    pub fn notify(&self, snapshot: &SceneSnapshot) -> anyhow::Result<()> {
        (self.func)(snapshot)
    }
}

impl PartialEq for SceneListener {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SceneListener {}

impl fmt::Debug for SceneListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneListener")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

struct MonitorInner {
    state: MonitorState,
    snapshot: Arc<SceneSnapshot>,
    generation: u64,
    listeners: IndexMap<CallbackId, SceneListener>,
}

pub struct SceneMonitor {
    config: MonitorConfig,
    scene: Arc<dyn SceneSource>,
    registry: EventRegistry,
    // scan + swap; never held while listeners run
    pass: Mutex<()>,
    inner: Mutex<MonitorInner>,
}

impl SceneMonitor {
    /// Create and activate a monitor over an explicit event source and scene.
    pub fn start(
        events: Arc<dyn NativeEventSource>,
        scene: Arc<dyn SceneSource>,
        config: MonitorConfig,
    ) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;
        let monitor = Arc::new(Self::uninitialized(events, scene, config));
        monitor.activate();
        Ok(monitor)
    }

    fn uninitialized(
        events: Arc<dyn NativeEventSource>,
        scene: Arc<dyn SceneSource>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            config,
            scene,
            registry: EventRegistry::new(events),
            pass: Mutex::new(()),
            inner: Mutex::new(MonitorInner {
                state: MonitorState::Uninitialized,
                snapshot: Arc::new(SceneSnapshot::empty()),
                generation: 0,
                listeners: IndexMap::new(),
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, MonitorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach to the configured events and run the initial scan. No-op once active.
    fn activate(self: &Arc<Self>) {
        {
            let mut inner = self.inner();
            if inner.state == MonitorState::Active {
                return;
            }
            inner.state = MonitorState::Active;
        }

        let weak = Arc::downgrade(self);
        if !self.config.file_events.is_empty() {
            let file_weak = Weak::clone(&weak);
            let on_file = EventCallback::new("scene_monitor.on_file_event", move |_, ctx| {
                if let Some(monitor) = file_weak.upgrade() {
                    debug!(event = ctx.kind.name(), "file event detected");
                    monitor.recompute(ctx.kind.name());
                }
                Ok(())
            });
            self.registry
                .register_file_events(&on_file, &self.config.file_events);
        }

        if self.config.watch_scene_changes {
            let structural_only = self.config.structural_changes_only;
            let on_change = EventCallback::new("scene_monitor.on_scene_change", move |_, ctx| {
                let relevant = ctx.change.map_or(true, |c| c.is_structural());
                if structural_only && !relevant {
                    return Ok(());
                }
                if let Some(monitor) = weak.upgrade() {
                    monitor.recompute(EventKind::SceneChange.name());
                }
                Ok(())
            });
            self.registry.register_scene_changes(&on_change);
        }

        info!(
            file_events = ?self.config.file_events,
            scene_changes = self.config.watch_scene_changes,
            "scene monitor active"
        );

        if self.config.initial_scan {
            self.recompute("initial_scan");
        }
    }

    /// Force a recomputation pass, as if a watched event had fired.
    pub fn rescan(&self) -> Result<Arc<SceneSnapshot>, SceneError> {
        self.scan_and_notify("rescan")
    }

    fn recompute(&self, trigger: &str) {
        // On failure the previous snapshot stays and listeners are not notified.
        let _ = self.scan_and_notify(trigger);
    }

    fn scan_and_notify(&self, trigger: &str) -> Result<Arc<SceneSnapshot>, SceneError> {
        let (snapshot, listeners) = {
            let _pass = self.pass.lock().unwrap_or_else(PoisonError::into_inner);
            let names = self.scene.object_names().map_err(|err| {
                warn!(trigger, error = %err, "scene scan failed; keeping previous snapshot");
                err
            })?;
            let fresh = SceneSnapshot::from_names(&names, self.config.namespace_separator);

            let mut inner = self.inner();
            inner.generation += 1;
            let snapshot = Arc::new(fresh.with_generation(inner.generation));
            inner.snapshot = Arc::clone(&snapshot);
            let listeners: Vec<SceneListener> = inner.listeners.values().cloned().collect();
            (snapshot, listeners)
        };

        info!(
            trigger,
            generation = snapshot.generation(),
            objects = snapshot.object_count(),
            namespaces = ?snapshot.namespaces(),
            "scene scanned"
        );

        for listener in &listeners {
            if self.inner().generation != snapshot.generation() {
                debug!(
                    trigger,
                    generation = snapshot.generation(),
                    "snapshot superseded; skipping remaining listeners"
                );
                break;
            }
            if let Err(err) = guarded_call(listener.name(), trigger, || listener.notify(&snapshot)) {
                error!(
                    listener = err.callback(),
                    event = err.event(),
                    error = %err,
                    "scene listener failed"
                );
            }
        }
        Ok(snapshot)
    }

    /// The last computed snapshot. Never triggers a scan.
    pub fn get_scene_info(&self) -> Arc<SceneSnapshot> {
        Arc::clone(&self.inner().snapshot)
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.inner().snapshot.has_namespace(name)
    }

    /// Namespaces of the current snapshot, sorted.
    pub fn get_namespaces(&self) -> Vec<String> {
        self.inner().snapshot.namespace_list()
    }

    /// Add a listener unless already present. Returns whether it was added.
    pub fn add_listener(&self, listener: &SceneListener) -> bool {
        let mut inner = self.inner();
        if inner.listeners.contains_key(&listener.id) {
            return false;
        }
        inner.listeners.insert(listener.id, listener.clone());
        debug!(listener = listener.name(), "added scene listener");
        true
    }

    /// Remove a listener. Returns whether it was present.
    pub fn remove_listener(&self, listener: &SceneListener) -> bool {
        let removed = self.inner().listeners.shift_remove(&listener.id).is_some();
        if removed {
            debug!(listener = listener.name(), "removed scene listener");
        }
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.inner().listeners.len()
    }

    pub fn state(&self) -> MonitorState {
        self.inner().state
    }

    /// Completed recomputation passes.
    pub fn generation(&self) -> u64 {
        self.inner().generation
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// The monitor's own subscriptions.
    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }
}

impl fmt::Debug for SceneMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner();
        f.debug_struct("SceneMonitor")
            .field("state", &inner.state)
            .field("generation", &inner.generation)
            .field("snapshot", &inner.snapshot)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}
