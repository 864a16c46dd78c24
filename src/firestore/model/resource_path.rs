use std::fmt::{Display, Formatter};

use crate::firestore::error::{invalid_argument, FirestoreResult};
use crate::firestore::model::base_path::{impl_path_segments, BasePath};

/// A slash-separated location in the document tree, e.g. `rooms/eros/messages`.
///
/// Segments are raw names with no escaping. Clones share the underlying storage.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourcePath {
    base: BasePath,
}

impl_path_segments!(ResourcePath);

impl ResourcePath {
    fn from_base(base: BasePath) -> Self {
        Self { base }
    }

    pub fn new(segments: Vec<String>) -> Self {
        Self::from_base(BasePath::new(segments))
    }

    pub fn root() -> Self {
        Self::from_base(BasePath::empty())
    }

    /// Parses a `/`-separated path. Leading and trailing slashes are ignored; empty
    /// segments in the middle of the path are rejected.
    pub fn from_string(path: &str) -> FirestoreResult<Self> {
        if path.trim().is_empty() {
            return Ok(Self::root());
        }

        if path.contains("//") {
            return Err(invalid_argument(format!(
                "Invalid path ({path}). Paths must not contain // in them."
            )));
        }

        Ok(Self::from_segments(
            path.split('/').filter(|segment| !segment.is_empty()),
        ))
    }

    pub fn canonical_string(&self) -> String {
        self.segments().join("/")
    }
}

impl Default for ResourcePath {
    fn default() -> Self {
        Self::root()
    }
}

impl Display for ResourcePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}
