use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use crate::firestore::error::{invalid_argument, FirestoreResult};
use crate::firestore::model::base_path::{impl_path_segments, BasePath};
use crate::util::assert::fail;

const KEY_FIELD_NAME: &str = "__name__";
const RESERVED_CHARACTERS: &[char] = &['~', '*', '/', '[', ']'];

static KEY_FIELD_PATH: LazyLock<FieldPath> =
    LazyLock::new(|| FieldPath::from_segments([KEY_FIELD_NAME]));

/// A (possibly nested) field reference inside a document.
///
/// The canonical form is the server format: segments joined by `.`, with any segment
/// that is not a simple identifier wrapped in backticks.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    base: BasePath,
}

impl_path_segments!(FieldPath);

impl FieldPath {
    fn from_base(base: BasePath) -> Self {
        Self { base }
    }

    /// Builds a field path from user-supplied segments. Each segment must be non-empty
    /// and at least one segment is required.
    pub fn new<S, I>(segments: I) -> FirestoreResult<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(invalid_argument(
                "FieldPath must contain at least one segment",
            ));
        }
        if segments.iter().any(String::is_empty) {
            return Err(invalid_argument(
                "Invalid field name. Field names must not be empty",
            ));
        }
        Ok(Self::from_base(BasePath::new(segments)))
    }

    pub fn empty() -> Self {
        Self::from_base(BasePath::empty())
    }

    /// Splits a user-facing dotted path such as `address.city`. No escaping is
    /// recognised.
    pub fn from_dot_separated(path: &str) -> FirestoreResult<Self> {
        if path.trim().is_empty() {
            return Err(invalid_argument("FieldPath string cannot be empty"));
        }
        if path.contains(RESERVED_CHARACTERS) {
            return Err(invalid_argument(format!(
                "Invalid field path ({path}). Paths must not contain '~', '*', '/', '[', or ']'"
            )));
        }
        FieldPath::new(path.split('.')).map_err(|_| {
            invalid_argument(format!(
                "Invalid field path ({path}). Paths must not be empty, begin with '.', end with '.', or contain '..'"
            ))
        })
    }

    /// Parses a server-format path, aborting on malformed input.
    ///
    /// Use this for strings that come from trusted sources (the backend or the local
    /// cache). Externally sourced strings should go through
    /// [`FieldPath::parse_server_format`].
    pub fn from_server_format(path: &str) -> Self {
        match Self::parse_server_format(path) {
            Ok(field_path) => field_path,
            Err(err) => fail(err.message()),
        }
    }

    /// Parses a server-format path such as ``a.`b.c`.d``.
    ///
    /// A backtick toggles quoting, a backslash escapes the next character, and an
    /// unquoted `.` ends the current segment. Parsing stops at the first NUL.
    pub fn parse_server_format(path: &str) -> FirestoreResult<Self> {
        let invalid_path = || {
            invalid_argument(format!(
                "Invalid field path ({path}). Paths must not be empty, begin with '.', end with '.', or contain '..'"
            ))
        };

        let mut segments = Vec::new();
        let mut segment = String::new();
        let mut inside_backticks = false;
        let mut chars = path.chars();

        while let Some(c) = chars.next() {
            match c {
                '\0' => break,
                '.' if !inside_backticks => {
                    if segment.is_empty() {
                        return Err(invalid_path());
                    }
                    segments.push(std::mem::take(&mut segment));
                }
                '`' => inside_backticks = !inside_backticks,
                '\\' => match chars.next() {
                    Some(escaped) => segment.push(escaped),
                    None => {
                        return Err(invalid_argument(format!(
                            "Trailing escape characters not allowed in {path}"
                        )))
                    }
                },
                other => segment.push(other),
            }
        }

        if segment.is_empty() {
            return Err(invalid_path());
        }
        segments.push(segment);

        if inside_backticks {
            return Err(invalid_argument(format!("Unterminated ` in path {path}")));
        }

        Ok(Self::from_base(BasePath::new(segments)))
    }

    /// The pseudo-field that refers to the document's own key.
    pub fn key_field_path() -> Self {
        KEY_FIELD_PATH.clone()
    }

    pub fn is_key_field_path(&self) -> bool {
        *self == *KEY_FIELD_PATH
    }

    pub fn canonical_string(&self) -> String {
        self.iter()
            .map(|segment| escaped_segment(segment))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Default for FieldPath {
    fn default() -> Self {
        Self::empty()
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_string())
    }
}

fn is_valid_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn escaped_segment(segment: &str) -> String {
    if is_valid_identifier(segment) {
        return segment.to_string();
    }
    let mut escaped = String::with_capacity(segment.len() + 2);
    escaped.push('`');
    for c in segment.chars() {
        if c == '\\' || c == '`' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('`');
    escaped
}
