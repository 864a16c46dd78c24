use std::collections::BTreeSet;

use firestore_local::firestore::model::{DocumentKey, ResourcePath};

#[test]
fn constructs_from_even_paths() {
    let key = DocumentKey::from_path_string("rooms/eros/messages/1");
    assert_eq!(key.id(), "1");
    assert_eq!(key.collection_path(), ResourcePath::from_segments(["rooms", "eros", "messages"]));
    assert!(key.has_collection_id("messages"));
    assert!(!key.has_collection_id("rooms"));
    assert_eq!(key.to_string(), "rooms/eros/messages/1");
    assert_eq!(format!("{key:?}"), "DocumentKey(rooms/eros/messages/1)");
}

#[test]
fn owns_its_path() {
    let path = ResourcePath::from_segments(["a", "b"]);
    let key = DocumentKey::new(path.clone());
    assert_eq!(key.path(), &path);
    assert_eq!(key, DocumentKey::from_segments(["a", "b"]));
}

#[test]
fn checked_constructors_reject_collection_paths() {
    let err = DocumentKey::from_string("rooms").unwrap_err();
    assert_eq!(err.code_str(), "firestore/invalid-argument");
    assert!(DocumentKey::from_path(ResourcePath::root()).is_err());
    assert!(DocumentKey::from_string("rooms/eros").is_ok());
}

#[test]
#[should_panic(expected = "invalid document key path: rooms")]
fn odd_paths_are_fatal() {
    DocumentKey::new(ResourcePath::from_segments(["rooms"]));
}

#[test]
fn blank_key_is_shared() {
    let empty = DocumentKey::empty();
    assert!(empty.is_empty());
    assert!(std::ptr::eq(empty, DocumentKey::empty()));
    assert_eq!(&DocumentKey::default(), empty);
    assert_ne!(DocumentKey::from_path_string("a/b"), *empty);
}

#[test]
fn orders_by_path() {
    let keys: BTreeSet<DocumentKey> = ["b/1", "a/2", "a/1", "a/1/c/1"]
        .into_iter()
        .map(DocumentKey::from_path_string)
        .collect();
    let ordered: Vec<String> = keys.iter().map(ToString::to_string).collect();
    assert_eq!(ordered, vec!["a/1", "a/1/c/1", "a/2", "b/1"]);
}
