use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use crate::firestore::error::{invalid_argument, FirestoreResult};
use crate::firestore::model::ResourcePath;
use crate::util::assert::hard_assert;

static EMPTY_KEY: LazyLock<DocumentKey> = LazyLock::new(|| DocumentKey {
    path: ResourcePath::root(),
});

/// The location of a single document: alternating collection and document ids.
///
/// The default value is the blank key, which has an empty path and refers to no
/// document. Cloning a key only bumps the reference count of its path storage.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey {
    path: ResourcePath,
}

impl DocumentKey {
    /// Takes ownership of `path`. Panics when it does not name a document.
    pub fn new(path: ResourcePath) -> Self {
        hard_assert!(
            Self::is_document_key(&path),
            "invalid document key path: {}",
            path.canonical_string()
        );
        Self { path }
    }

    /// Checked variant of [`DocumentKey::new`] for paths supplied by users.
    pub fn from_path(path: ResourcePath) -> FirestoreResult<Self> {
        if !Self::is_document_key(&path) {
            return Err(invalid_argument(format!(
                "Invalid document reference. Document references must have an even number of segments, but {} has {}",
                path.canonical_string(),
                path.len()
            )));
        }
        Ok(Self { path })
    }

    pub fn from_string(path: &str) -> FirestoreResult<Self> {
        let resource = ResourcePath::from_string(path)?;
        Self::from_path(resource)
    }

    /// Splits `path` on `/`. Panics when the result does not name a document.
    pub fn from_path_string(path: &str) -> Self {
        match ResourcePath::from_string(path) {
            Ok(resource) => Self::new(resource),
            Err(err) => crate::util::assert::fail(err.message()),
        }
    }

    /// Panics when the segments do not name a document.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(ResourcePath::from_segments(segments))
    }

    /// The shared blank key.
    pub fn empty() -> &'static DocumentKey {
        &EMPTY_KEY
    }

    /// Returns true iff `path` has an even, non-zero number of segments.
    pub fn is_document_key(path: &ResourcePath) -> bool {
        !path.is_empty() && path.len() % 2 == 0
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn collection_path(&self) -> ResourcePath {
        self.path.without_last()
    }

    pub fn has_collection_id(&self, collection_id: &str) -> bool {
        self.path.len() >= 2 && self.path.segment(self.path.len() - 2) == collection_id
    }

    /// The document id. Panics on the blank key.
    pub fn id(&self) -> &str {
        self.path.last_segment()
    }
}

impl Default for DocumentKey {
    fn default() -> Self {
        EMPTY_KEY.clone()
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl std::fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DocumentKey({})", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_even_segments() {
        let err = DocumentKey::from_string("cities").unwrap_err();
        assert_eq!(err.code_str(), "firestore/invalid-argument");
        assert!(DocumentKey::from_path(ResourcePath::root()).is_err());
    }

    #[test]
    fn parses_valid_path() {
        let key = DocumentKey::from_string("cities/sf").unwrap();
        assert_eq!(key.id(), "sf");
        assert_eq!(key.collection_path().canonical_string(), "cities");
        assert!(key.has_collection_id("cities"));
        assert!(!key.has_collection_id("sf"));
    }

    #[test]
    #[should_panic(expected = "invalid document key path: rooms")]
    fn new_rejects_collection_paths() {
        DocumentKey::new(ResourcePath::from_segments(["rooms"]));
    }

    #[test]
    fn default_is_blank() {
        let key = DocumentKey::default();
        assert!(key.is_empty());
        assert_eq!(&key, DocumentKey::empty());
        assert!(key < DocumentKey::from_segments(["a", "b"]));
    }
}
