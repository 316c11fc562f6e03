//! Integration tests for field keys and value kinds

use std::collections::HashSet;

use vigil_foundation::{EntryKey, FieldKey, ObjectId, ValueKind};

#[test]
fn field_key_conversions() {
    assert_eq!(FieldKey::from("name"), FieldKey::name("name"));
    assert_eq!(FieldKey::from(3usize), FieldKey::Index(3));
    assert_eq!(
        FieldKey::from(EntryKey::Int(1)),
        FieldKey::Entry(EntryKey::Int(1))
    );
    assert_eq!(FieldKey::name("x").as_name(), Some("x"));
    assert_eq!(FieldKey::Length.as_name(), None);
}

#[test]
fn field_key_display() {
    assert_eq!(FieldKey::name("x").to_string(), ".x");
    assert_eq!(FieldKey::Index(3).to_string(), "[3]");
    assert_eq!(FieldKey::Length.to_string(), ".length");
}

#[test]
fn field_keys_hash_by_value() {
    let mut set = HashSet::new();
    set.insert(FieldKey::name("a"));
    set.insert(FieldKey::name("a"));
    set.insert(FieldKey::Index(0));
    set.insert(FieldKey::Entry(EntryKey::Object(ObjectId::new(1, 1))));
    set.insert(FieldKey::Entry(EntryKey::Object(ObjectId::new(1, 3))));
    set.insert(FieldKey::Length);
    assert_eq!(set.len(), 5);
}

#[test]
fn value_kinds() {
    assert!(ValueKind::Sequence.is_container());
    assert!(ValueKind::Instance.is_container());
    assert!(!ValueKind::Int.is_container());
    assert_eq!(ValueKind::Map.to_string(), "map");
    assert_eq!(ValueKind::Tracked.to_string(), "tracked");
}
