use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use bytes::Bytes;

use crate::firestore::model::{DocumentKey, ResourcePath};

/// A query target: the parent path plus the query, already encoded as a
/// `StructuredQuery` message by the query layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QueryTarget {
    parent: ResourcePath,
    structured_query: Bytes,
}

impl QueryTarget {
    pub fn new(parent: ResourcePath, structured_query: impl Into<Bytes>) -> Self {
        Self {
            parent,
            structured_query: structured_query.into(),
        }
    }

    pub fn parent(&self) -> &ResourcePath {
        &self.parent
    }

    pub fn structured_query(&self) -> &Bytes {
        &self.structured_query
    }
}

/// A target listening to an explicit set of documents.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentsTarget {
    documents: Vec<DocumentKey>,
}

impl DocumentsTarget {
    pub fn new(documents: Vec<DocumentKey>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[DocumentKey] {
        &self.documents
    }
}

/// What a target listens to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetDefinition {
    Query(QueryTarget),
    Documents(DocumentsTarget),
}

impl TargetDefinition {
    pub fn query(parent: ResourcePath, structured_query: impl Into<Bytes>) -> Self {
        TargetDefinition::Query(QueryTarget::new(parent, structured_query))
    }

    pub fn documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = DocumentKey>,
    {
        TargetDefinition::Documents(DocumentsTarget::new(documents.into_iter().collect()))
    }

    /// Stable identifier used to look targets up by definition. Equal definitions
    /// always share a canonical id.
    pub fn canonical_id(&self) -> String {
        match self {
            TargetDefinition::Query(query) => format!(
                "{}|q:{}",
                query.parent.canonical_string(),
                BASE64_STANDARD.encode(&query.structured_query)
            ),
            TargetDefinition::Documents(target) => {
                let documents: Vec<String> = target
                    .documents
                    .iter()
                    .map(|key| key.path().canonical_string())
                    .collect();
                format!("docs:{}", documents.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ids_follow_equality() {
        let rooms = TargetDefinition::query(
            ResourcePath::from_segments(["rooms"]),
            Bytes::from_static(b"\x12\x02\x08\x01"),
        );
        let same = TargetDefinition::query(
            ResourcePath::from_segments(["rooms"]),
            vec![0x12u8, 0x02, 0x08, 0x01],
        );
        assert_eq!(rooms, same);
        assert_eq!(rooms.canonical_id(), same.canonical_id());
        assert_eq!(rooms.canonical_id(), "rooms|q:EgIIAQ==");
    }

    #[test]
    fn documents_canonical_id() {
        let target = TargetDefinition::documents([
            DocumentKey::from_path_string("rooms/eros"),
            DocumentKey::from_path_string("rooms/other"),
        ]);
        assert_eq!(target.canonical_id(), "docs:rooms/eros,rooms/other");
    }
}
