//! Scene access: the enumeration seam and an in-memory scene with lookup helpers.

use crate::snapshot::namespace_of;
use crate::SceneError;
use glob::{MatchOptions, Pattern};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Trait for anything that can enumerate the objects currently in the scene.
pub trait SceneSource: Send + Sync {
    /// Names of all scene objects, in scene order. Names may repeat.
    fn object_names(&self) -> Result<Vec<String>, SceneError>;
}

/// Ordered list of scene object names.
#[derive(Debug, Default)]
pub struct InMemoryScene {
    objects: Mutex<Vec<String>>,
}

impl InMemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            objects: Mutex::new(names.into_iter().map(Into::into).collect()),
        }
    }

    fn objects(&self) -> MutexGuard<'_, Vec<String>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }

    pub fn add(&self, name: impl Into<String>) {
        self.objects().push(name.into());
    }

    pub fn extend<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objects().extend(names.into_iter().map(Into::into));
    }

    /// Replace the whole scene content.
    pub fn replace<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.objects() = names.into_iter().map(Into::into).collect();
    }

    pub fn clear(&self) {
        self.objects().clear();
    }

    /// Remove the first object called `name`.
    pub fn remove(&self, name: &str) -> Result<(), SceneError> {
        let mut objects = self.objects();
        let idx = objects
            .iter()
            .position(|o| o == name)
            .ok_or_else(|| SceneError::ObjectNotFound {
                name: name.to_string(),
            })?;
        objects.remove(idx);
        Ok(())
    }

    /// Rename the first object called `old`.
    pub fn rename(&self, old: &str, new: impl Into<String>) -> Result<(), SceneError> {
        let mut objects = self.objects();
        let slot = objects
            .iter_mut()
            .find(|o| o.as_str() == old)
            .ok_or_else(|| SceneError::ObjectNotFound {
                name: old.to_string(),
            })?;
        *slot = new.into();
        Ok(())
    }

    /// Find an object by exact name.
    pub fn find_by_name(&self, name: &str, case_sensitive: bool) -> Option<String> {
        self.objects()
            .iter()
            .find(|o| {
                if case_sensitive {
                    o.as_str() == name
                } else {
                    o.to_lowercase() == name.to_lowercase()
                }
            })
            .cloned()
    }

    /// Objects matching a shell wildcard (`*_ctrl`, `Char*`, `?oot`, `[AB]*`).
    ///
    /// `*` also matches across the namespace separator, so `*Hips` finds
    /// `Character01:Hips`.
    pub fn find_by_pattern(&self, pattern: &str) -> Result<Vec<String>, SceneError> {
        let compiled = Pattern::new(pattern).map_err(|e| SceneError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.msg.to_string(),
        })?;
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        Ok(self
            .objects()
            .iter()
            .filter(|o| compiled.matches_with(o, options))
            .cloned()
            .collect())
    }

    /// Objects whose namespace prefix, split at `separator`, is exactly `namespace`.
    pub fn objects_in_namespace(&self, namespace: &str, separator: char) -> Vec<String> {
        self.objects()
            .iter()
            .filter(|o| namespace_of(o, separator) == Some(namespace))
            .cloned()
            .collect()
    }
}

impl SceneSource for InMemoryScene {
    fn object_names(&self) -> Result<Vec<String>, SceneError> {
        Ok(self.objects().clone())
    }
}
