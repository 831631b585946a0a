//! Host application facade.
//!
//! Pairs the native event hub with the scene it describes and fires the
//! matching native event after each simulated file operation or scene
//! mutation. Every method returns the number of native handlers invoked.

use crate::scene::InMemoryScene;
use crate::SceneError;
use once_cell::sync::Lazy;
use std::sync::Arc;
use xmobu_events::{Caller, EventContext, EventHub, EventKind, FileEvent, SceneChangeType};

static GLOBAL_HOST: Lazy<HostApplication> =
    Lazy::new(|| HostApplication::with_parts(EventHub::global(), Arc::new(InMemoryScene::new())));

#[derive(Debug)]
pub struct HostApplication {
    events: Arc<EventHub>,
    scene: Arc<InMemoryScene>,
    application: Caller,
    scene_caller: Caller,
}

impl HostApplication {
    /// A standalone host with its own hub and an empty scene.
    pub fn new() -> Self {
        Self::with_parts(Arc::new(EventHub::new()), Arc::new(InMemoryScene::new()))
    }

    pub fn with_parts(events: Arc<EventHub>, scene: Arc<InMemoryScene>) -> Self {
        Self {
            events,
            scene,
            application: Caller::new("Application"),
            scene_caller: Caller::new("Scene"),
        }
    }

    /// The process-wide host, backed by [`EventHub::global`].
    pub fn global() -> &'static HostApplication {
        &GLOBAL_HOST
    }

    pub fn events(&self) -> Arc<EventHub> {
        Arc::clone(&self.events)
    }

    pub fn scene(&self) -> Arc<InMemoryScene> {
        Arc::clone(&self.scene)
    }

    /// File > New: empty the scene.
    pub fn file_new(&self) -> usize {
        self.scene.clear();
        self.fire_file(FileEvent::New, None)
    }

    /// File > Open: replace the scene with `names`.
    pub fn file_open<I, S>(&self, path: &str, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scene.replace(names);
        self.fire_file(FileEvent::Open, Some(path))
    }

    /// File > Merge: append `names` to the scene.
    pub fn file_merge<I, S>(&self, path: &str, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scene.extend(names);
        self.fire_file(FileEvent::Merge, Some(path))
    }

    /// File > Save: scene unchanged.
    pub fn file_save(&self, path: &str) -> usize {
        self.fire_file(FileEvent::Save, Some(path))
    }

    pub fn add_object(&self, name: &str) -> usize {
        self.scene.add(name);
        self.fire_change(SceneChangeType::AddChild, name)
    }

    pub fn remove_object(&self, name: &str) -> Result<usize, SceneError> {
        self.scene.remove(name)?;
        Ok(self.fire_change(SceneChangeType::RemoveChild, name))
    }

    pub fn rename_object(&self, old: &str, new: &str) -> Result<usize, SceneError> {
        self.scene.rename(old, new)?;
        Ok(self.fire_change(SceneChangeType::Renamed, new))
    }

    /// Fire a scene-change event that does not touch the object list.
    pub fn select_object(&self, name: &str) -> usize {
        self.fire_change(SceneChangeType::Select, name)
    }

    fn fire_file(&self, event: FileEvent, path: Option<&str>) -> usize {
        let ctx = EventContext::file(event, path.map(str::to_string));
        self.events
            .fire(EventKind::File(event), &self.application, &ctx)
    }

    fn fire_change(&self, change: SceneChangeType, component: &str) -> usize {
        let ctx = EventContext::scene_change(change, component);
        self.events
            .fire(EventKind::SceneChange, &self.scene_caller, &ctx)
    }
}

impl Default for HostApplication {
    fn default() -> Self {
        Self::new()
    }
}
