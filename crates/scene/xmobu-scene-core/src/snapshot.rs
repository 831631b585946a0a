//! Scene snapshot: object count and namespace set from one scan.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeSet;

/// Separator of the `<namespace>:<objectname>` naming convention.
pub const DEFAULT_SEPARATOR: char = ':';

/// Namespace prefix of `name`, if it follows `<namespace><sep><objectname>`.
///
/// Both parts must be non-empty; only the first separator counts, so
/// `A:B:Hips` yields `A`.
#[inline]
pub fn namespace_of(name: &str, separator: char) -> Option<&str> {
    match name.split_once(separator) {
        Some((ns, rest)) if !ns.is_empty() && !rest.is_empty() => Some(ns),
        _ => None,
    }
}

/// Immutable point-in-time summary of the scene.
///
/// Count and namespaces always come from the same enumeration. `has_objects`
/// is derived from the count; it is written out but never read back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SceneSnapshot {
    object_count: usize,
    namespaces: BTreeSet<String>,
    #[serde(skip)]
    generation: u64,
}

impl SceneSnapshot {
    /// Snapshot of a monitor that has not scanned yet.
    pub fn empty() -> Self {
        Self {
            object_count: 0,
            namespaces: BTreeSet::new(),
            generation: 0,
        }
    }

    /// Count objects and collect namespaces from one enumeration of names.
    pub fn from_names<I, S>(names: I, separator: char) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut object_count = 0;
        let mut namespaces = BTreeSet::new();
        for name in names {
            object_count += 1;
            if let Some(ns) = namespace_of(name.as_ref(), separator) {
                if !namespaces.contains(ns) {
                    namespaces.insert(ns.to_string());
                }
            }
        }
        Self {
            object_count,
            namespaces,
            generation: 0,
        }
    }

    #[inline]
    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    #[inline]
    pub fn object_count(&self) -> usize {
        self.object_count
    }

    #[inline]
    pub fn has_objects(&self) -> bool {
        self.object_count > 0
    }

    #[inline]
    pub fn namespaces(&self) -> &BTreeSet<String> {
        &self.namespaces
    }

    /// Namespaces in lexicographic order, for display.
    pub fn namespace_list(&self) -> Vec<String> {
        self.namespaces.iter().cloned().collect()
    }

    /// Exact, case-sensitive membership test.
    #[inline]
    pub fn has_namespace(&self, name: &str) -> bool {
        self.namespaces.contains(name)
    }

    /// Recomputation pass that produced this snapshot; 0 before the first scan.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Serialize for SceneSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut info = serializer.serialize_struct("SceneSnapshot", 3)?;
        info.serialize_field("object_count", &self.object_count)?;
        info.serialize_field("namespaces", &self.namespaces)?;
        info.serialize_field("has_objects", &self.has_objects())?;
        info.end()
    }
}

impl Default for SceneSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
