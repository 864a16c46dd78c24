use std::cmp::Ordering;

use firestore_local::firestore::model::ResourcePath;

fn resource_path(path: &str) -> ResourcePath {
    ResourcePath::from_string(path).unwrap()
}

#[test]
fn can_be_constructed() {
    ResourcePath::from_segments(["rooms", "Eros", "messages"]);
}

#[test]
fn indexes_into_segments() {
    let path = ResourcePath::from_segments(["rooms", "Eros", "messages"]);
    assert_eq!(path.get(0), Some("rooms"));
    assert_eq!(&path[1], "Eros");
    assert_eq!(path.segment(2), "messages");
    assert_eq!(path.get(3), None);
}

#[test]
fn pop_first_repeatedly() {
    let path = ResourcePath::from_segments(["rooms", "Eros", "messages"]);

    assert_eq!(path.pop_first(), ResourcePath::from_segments(["Eros", "messages"]));
    assert_eq!(
        path.pop_first().pop_first(),
        ResourcePath::from_segments(["messages"])
    );
    assert!(path.pop_first().pop_first().pop_first().is_empty());
    assert_eq!(path.drop_first(0), path);
    assert_eq!(path.drop_first(1), ResourcePath::from_segments(["Eros", "messages"]));
    assert_eq!(path.drop_first(2), ResourcePath::from_segments(["messages"]));
    assert!(path.drop_first(3).is_empty());
    assert_eq!(path, ResourcePath::from_segments(["rooms", "Eros", "messages"]));
}

#[test]
fn yields_first_and_last_segment() {
    let path = ResourcePath::from_segments(["rooms", "Eros", "messages"]);
    assert_eq!(path.first_segment(), "rooms");
    assert_eq!(path.pop_first().first_segment(), "Eros");
    assert_eq!(path.last_segment(), "messages");
    assert_eq!(path.without_last().last_segment(), "Eros");
    assert_eq!(path.without_last().without_last().last_segment(), "rooms");
}

#[test]
#[should_panic(expected = "INTERNAL ASSERT FAILED")]
fn last_segment_of_root_is_fatal() {
    ResourcePath::root().last_segment();
}

#[test]
#[should_panic(expected = "Cannot drop 4 segments")]
fn dropping_too_many_is_fatal() {
    resource_path("a/b/c").drop_last(4);
}

#[test]
fn creates_child_path() {
    let base = resource_path("rooms");
    assert_eq!(base.append("eros"), resource_path("rooms/eros"));
    assert_eq!(base.append("eros").append("1"), resource_path("rooms/eros/1"));
    assert_eq!(base.concat(&resource_path("eros/1")), resource_path("rooms/eros/1"));
    assert_eq!(base, resource_path("rooms"));
}

#[test]
fn pop_last_repeatedly() {
    let path = ResourcePath::from_segments(["rooms", "Eros", "messages"]);
    assert_eq!(path.without_last(), ResourcePath::from_segments(["rooms", "Eros"]));
    assert_eq!(
        path.without_last().without_last(),
        ResourcePath::from_segments(["rooms"])
    );
    assert!(path.without_last().without_last().without_last().is_empty());
    assert_eq!(path, ResourcePath::from_segments(["rooms", "Eros", "messages"]));
}

#[test]
fn views_share_equality_with_fresh_paths() {
    let path = resource_path("a/b/c/d");
    let middle = path.drop_first(1).drop_last(1);
    assert_eq!(middle, resource_path("b/c"));
    assert_eq!(middle.len(), 2);
    assert_eq!(middle.canonical_string(), "b/c");
    assert_eq!(
        middle.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["b", "c"]
    );
}

#[test]
fn compares_correctly() {
    fn compare(a: &[&str], b: &[&str]) -> Ordering {
        ResourcePath::comparator(
            &ResourcePath::from_segments(a.iter().copied()),
            &ResourcePath::from_segments(b.iter().copied()),
        )
    }

    fn expect_less(a: &[&str], b: &[&str]) {
        assert_eq!(compare(a, b), Ordering::Less);
        assert_eq!(compare(b, a), Ordering::Greater);
    }

    assert_eq!(compare(&[], &[]), Ordering::Equal);
    assert_eq!(compare(&["a"], &["a"]), Ordering::Equal);
    assert_eq!(compare(&["a", "b", "c"], &["a", "b", "c"]), Ordering::Equal);

    expect_less(&[], &["a"]);
    expect_less(&["a"], &["b"]);
    expect_less(&["a"], &["a", "b"]);
    expect_less(&["a", "b"], &["b"]);
}

#[test]
fn determines_prefix() {
    let empty = ResourcePath::root();
    let a = ResourcePath::from_segments(["a"]);
    let ab = ResourcePath::from_segments(["a", "b"]);
    let abc = ResourcePath::from_segments(["a", "b", "c"]);
    let b = ResourcePath::from_segments(["b"]);
    let ba = ResourcePath::from_segments(["b", "a"]);

    assert!(empty.is_prefix_of(&a));
    assert!(empty.is_prefix_of(&ab));
    assert!(empty.is_prefix_of(&abc));
    assert!(empty.is_prefix_of(&empty));
    assert!(empty.is_prefix_of(&b));
    assert!(empty.is_prefix_of(&ba));

    assert!(a.is_prefix_of(&a));
    assert!(a.is_prefix_of(&ab));
    assert!(a.is_prefix_of(&abc));
    assert!(!a.is_prefix_of(&empty));
    assert!(!a.is_prefix_of(&b));
    assert!(!a.is_prefix_of(&ba));

    assert!(!ab.is_prefix_of(&a));
    assert!(ab.is_prefix_of(&ab));
    assert!(ab.is_prefix_of(&abc));
    assert!(!ab.is_prefix_of(&empty));
    assert!(!ab.is_prefix_of(&b));
    assert!(!ab.is_prefix_of(&ba));

    assert!(!abc.is_prefix_of(&a));
    assert!(!abc.is_prefix_of(&ab));
    assert!(abc.is_prefix_of(&abc));
    assert!(!abc.is_prefix_of(&empty));
    assert!(!abc.is_prefix_of(&b));
    assert!(!abc.is_prefix_of(&ba));
}

#[test]
fn parses_slash_separated_strings() {
    assert_eq!(resource_path("/rooms/eros/"), resource_path("rooms/eros"));
    assert!(resource_path("").is_empty());
    assert_eq!(
        ResourcePath::from_string("rooms//eros").unwrap_err().code_str(),
        "firestore/invalid-argument"
    );
}
