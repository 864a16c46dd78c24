use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, LazyLock};

use crate::util::assert::hard_assert;

static EMPTY_SEGMENTS: LazyLock<Arc<[String]>> = LazyLock::new(|| Arc::from(Vec::new()));

/// Immutable segment storage shared by [`ResourcePath`](super::ResourcePath) and
/// [`FieldPath`](super::FieldPath).
///
/// The segments live behind an `Arc`, and a path is a `start..end` window over them.
/// Cloning, `drop_first` and `drop_last` never copy segment data; only `append` and
/// `concat` allocate new storage.
#[derive(Clone, Debug)]
pub(crate) struct BasePath {
    segments: Arc<[String]>,
    start: usize,
    end: usize,
}

impl BasePath {
    pub(crate) fn new(segments: Vec<String>) -> Self {
        if segments.is_empty() {
            return Self::empty();
        }
        let end = segments.len();
        Self {
            segments: Arc::from(segments),
            start: 0,
            end,
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            segments: Arc::clone(&EMPTY_SEGMENTS),
            start: 0,
            end: 0,
        }
    }

    pub(crate) fn segments(&self) -> &[String] {
        &self.segments[self.start..self.end]
    }

    pub(crate) fn len(&self) -> usize {
        self.end - self.start
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub(crate) fn get(&self, index: usize) -> Option<&str> {
        self.segments().get(index).map(String::as_str)
    }

    pub(crate) fn segment(&self, index: usize) -> &str {
        hard_assert!(
            index < self.len(),
            "Segment index {} out of range for path of length {}",
            index,
            self.len()
        );
        &self.segments[self.start + index]
    }

    pub(crate) fn first_segment(&self) -> &str {
        hard_assert!(!self.is_empty(), "Cannot call first_segment on an empty path");
        self.segment(0)
    }

    pub(crate) fn last_segment(&self) -> &str {
        hard_assert!(!self.is_empty(), "Cannot call last_segment on an empty path");
        self.segment(self.len() - 1)
    }

    pub(crate) fn drop_first(&self, count: usize) -> Self {
        hard_assert!(
            count <= self.len(),
            "Cannot drop {} segments from a path of length {}",
            count,
            self.len()
        );
        Self {
            segments: Arc::clone(&self.segments),
            start: self.start + count,
            end: self.end,
        }
    }

    pub(crate) fn drop_last(&self, count: usize) -> Self {
        hard_assert!(
            count <= self.len(),
            "Cannot drop {} segments from a path of length {}",
            count,
            self.len()
        );
        Self {
            segments: Arc::clone(&self.segments),
            start: self.start,
            end: self.end - count,
        }
    }

    pub(crate) fn append(&self, segment: String) -> Self {
        let mut segments = Vec::with_capacity(self.len() + 1);
        segments.extend_from_slice(self.segments());
        segments.push(segment);
        Self::new(segments)
    }

    pub(crate) fn concat(&self, other: &[String]) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        let mut segments = Vec::with_capacity(self.len() + other.len());
        segments.extend_from_slice(self.segments());
        segments.extend_from_slice(other);
        Self::new(segments)
    }

    pub(crate) fn is_prefix_of(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.segments() == &other.segments()[..self.len()]
    }
}

impl PartialEq for BasePath {
    fn eq(&self, other: &Self) -> bool {
        self.segments() == other.segments()
    }
}

impl Eq for BasePath {}

impl Hash for BasePath {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.segments().hash(state);
    }
}

impl PartialOrd for BasePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BasePath {
    fn cmp(&self, other: &Self) -> Ordering {
        // Slice ordering is segment-by-segment with the shorter prefix first.
        self.segments().cmp(other.segments())
    }
}

/// Generates the segment-sequence API shared by the path newtypes around [`BasePath`].
macro_rules! impl_path_segments {
    ($path:ident) => {
        impl $path {
            /// Builds a path from an explicit list of segments.
            pub fn from_segments<I, S>(segments: I) -> Self
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                Self::from_base($crate::firestore::model::base_path::BasePath::new(
                    segments.into_iter().map(Into::into).collect(),
                ))
            }

            pub fn len(&self) -> usize {
                self.base.len()
            }

            pub fn is_empty(&self) -> bool {
                self.base.is_empty()
            }

            pub fn segments(&self) -> &[String] {
                self.base.segments()
            }

            pub fn iter(&self) -> std::slice::Iter<'_, String> {
                self.base.segments().iter()
            }

            /// Returns the segment at `index`, or `None` when out of range.
            pub fn get(&self, index: usize) -> Option<&str> {
                self.base.get(index)
            }

            /// Returns the segment at `index`. Panics when out of range.
            pub fn segment(&self, index: usize) -> &str {
                self.base.segment(index)
            }

            /// Panics when the path is empty.
            pub fn first_segment(&self) -> &str {
                self.base.first_segment()
            }

            /// Panics when the path is empty.
            pub fn last_segment(&self) -> &str {
                self.base.last_segment()
            }

            /// Returns a new path without the first `count` segments.
            /// Panics when `count` exceeds the length.
            pub fn drop_first(&self, count: usize) -> Self {
                Self::from_base(self.base.drop_first(count))
            }

            /// Returns a new path without the last `count` segments.
            /// Panics when `count` exceeds the length.
            pub fn drop_last(&self, count: usize) -> Self {
                Self::from_base(self.base.drop_last(count))
            }

            pub fn pop_first(&self) -> Self {
                self.drop_first(1)
            }

            pub fn without_last(&self) -> Self {
                self.drop_last(1)
            }

            pub fn append(&self, segment: impl Into<String>) -> Self {
                Self::from_base(self.base.append(segment.into()))
            }

            pub fn concat(&self, other: &Self) -> Self {
                Self::from_base(self.base.concat(other.segments()))
            }

            pub fn is_prefix_of(&self, other: &Self) -> bool {
                self.base.is_prefix_of(&other.base)
            }

            pub fn comparator(left: &Self, right: &Self) -> std::cmp::Ordering {
                left.base.cmp(&right.base)
            }
        }

        impl std::ops::Index<usize> for $path {
            type Output = str;

            fn index(&self, index: usize) -> &str {
                self.base.segment(index)
            }
        }

        impl<'a> IntoIterator for &'a $path {
            type Item = &'a String;
            type IntoIter = std::slice::Iter<'a, String>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }

        impl std::fmt::Debug for $path {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($path))
                    .field(&self.segments())
                    .finish()
            }
        }
    };
}

pub(crate) use impl_path_segments;
