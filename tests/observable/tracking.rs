//! Integration tests for dependency tracking

use vigil_foundation::FieldKey;
use vigil_notify::NotifierKey;
use vigil_observable::{Value, is_tracking, track, transform, untracked, use_observe};

#[test]
fn reads_outside_tracking_are_inert() {
    assert!(!is_tracking());
    let view = transform(&Value::record([("a", 1)]));
    assert_eq!(view.as_tracked().unwrap().get("a"), Value::Int(1));
}

#[test]
fn nested_reads_register_each_level() {
    let raw = Value::record([(
        "outputs",
        Value::sequence([Value::record([("text", "hi")])]),
    )]);
    let view = use_observe(&raw);
    let cell = view.as_tracked().unwrap().clone();

    let (text, deps) = track(|| {
        let outputs = cell.get("outputs");
        let first = outputs.as_tracked().unwrap().at(0);
        first.as_tracked().unwrap().get("text")
    });

    assert_eq!(text, Value::from("hi"));
    assert_eq!(deps.len(), 3);
    assert!(deps.contains(&NotifierKey::field(cell.id(), "outputs")));
    let outputs_id = raw
        .as_object()
        .unwrap()
        .field("outputs")
        .unwrap()
        .object_id()
        .unwrap();
    assert!(deps.contains(&NotifierKey::field(outputs_id, FieldKey::Index(0))));
}

#[test]
fn untracked_reads_are_not_recorded() {
    let view = transform(&Value::record([("a", 1), ("b", 2)]));
    let t = view.as_tracked().unwrap().clone();
    let ((), deps) = track(|| {
        let _ = t.get("a");
        untracked(|| {
            let _ = t.get("b");
        });
    });
    assert_eq!(deps.len(), 1);
    assert!(deps.contains(&NotifierKey::field(t.id(), "a")));
}

#[test]
fn whole_container_reads_depend_on_container() {
    let view = transform(&Value::map([("a", 1)]));
    let t = view.as_tracked().unwrap().clone();
    let (entries, deps) = track(|| t.entries());
    assert_eq!(entries.len(), 1);
    assert!(deps.contains(&NotifierKey::container(t.id())));
}

#[test]
fn use_observe_handles_nil() {
    assert!(use_observe(&Value::Nil).is_nil());
    let ((), deps) = track(|| {
        let _ = use_observe(&Value::Nil);
    });
    assert!(deps.is_empty());
}
