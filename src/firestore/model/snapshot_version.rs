use std::fmt::{Display, Formatter};

use crate::firestore::model::Timestamp;

/// A version of the remote data set, as reported by the backend in watch responses.
///
/// `SnapshotVersion::none()` (the zero timestamp) means "never synchronized".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotVersion {
    timestamp: Timestamp,
}

impl SnapshotVersion {
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }
}

impl From<Timestamp> for SnapshotVersion {
    fn from(timestamp: Timestamp) -> Self {
        Self::new(timestamp)
    }
}

impl Display for SnapshotVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SnapshotVersion({})", self.timestamp)
    }
}
