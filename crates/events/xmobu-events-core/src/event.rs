//! Logical event names and the context forwarded to callbacks

use crate::RegistrationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File-lifecycle events raised by the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEvent {
    /// File > New completed
    New,
    /// File > Open completed
    Open,
    /// File > Merge
    Merge,
    /// File > Save completed
    Save,
}

impl FileEvent {
    /// Every file event; the default subscription set
    pub const ALL: [FileEvent; 4] = [Self::New, Self::Open, Self::Merge, Self::Save];

    /// Get the name of this event
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Open => "open",
            Self::Merge => "merge",
            Self::Save => "save",
        }
    }
}

impl fmt::Display for FileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FileEvent {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<EventKind>()? {
            EventKind::File(event) => Ok(event),
            EventKind::SceneChange => Err(RegistrationError::WrongCategory {
                name: s.to_string(),
                expected: "file".to_string(),
            }),
        }
    }
}

/// A logical event: one of the file events or the generic scene mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    File(FileEvent),
    SceneChange,
}

impl EventKind {
    /// All logical events
    pub const ALL: [EventKind; 5] = [
        Self::File(FileEvent::New),
        Self::File(FileEvent::Open),
        Self::File(FileEvent::Merge),
        Self::File(FileEvent::Save),
        Self::SceneChange,
    ];

    /// Get the name of this event
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::File(event) => event.name(),
            Self::SceneChange => "scene_change",
        }
    }

    /// Check if this is a file-lifecycle event
    #[inline]
    pub fn is_file_event(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Get the file event, if this is one
    #[inline]
    pub fn file_event(&self) -> Option<FileEvent> {
        match self {
            Self::File(event) => Some(*event),
            Self::SceneChange => None,
        }
    }
}

impl From<FileEvent> for EventKind {
    fn from(event: FileEvent) -> Self {
        Self::File(event)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::File(FileEvent::New)),
            "open" => Ok(Self::File(FileEvent::Open)),
            "merge" => Ok(Self::File(FileEvent::Merge)),
            "save" => Ok(Self::File(FileEvent::Save)),
            "scene_change" => Ok(Self::SceneChange),
            other => Err(RegistrationError::UnknownEvent {
                name: other.to_string(),
            }),
        }
    }
}

/// Kind of scene mutation reported with a scene-change event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum SceneChangeType {
    AddChild,
    RemoveChild,
    Destroy,
    Renamed,
    Attach,
    Detach,
    Select,
    Unselect,
    Other,
}

impl SceneChangeType {
    /// Changes that can alter the set of objects or their names
    #[inline]
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::AddChild | Self::RemoveChild | Self::Destroy | Self::Renamed
        )
    }
}

/// Native component that fired an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub name: String,
}

impl Caller {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Event-specific data from the host, forwarded verbatim to callbacks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventContext {
    /// Event that fired
    pub kind: EventKind,
    /// File involved in a file event
    pub file_path: Option<String>,
    /// Mutation type for scene-change events
    pub change: Option<SceneChangeType>,
    /// Name of the scene component a mutation touched
    pub component: Option<String>,
}

impl EventContext {
    /// Create a bare context for an event
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            file_path: None,
            change: None,
            component: None,
        }
    }

    /// Context for a file event
    pub fn file(event: FileEvent, path: Option<String>) -> Self {
        Self {
            file_path: path,
            ..Self::new(EventKind::File(event))
        }
    }

    /// Context for a scene mutation
    pub fn scene_change(change: SceneChangeType, component: impl Into<String>) -> Self {
        Self {
            change: Some(change),
            component: Some(component.into()),
            ..Self::new(EventKind::SceneChange)
        }
    }
}
