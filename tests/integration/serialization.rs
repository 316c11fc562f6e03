//! Handing tracked values to a non-reactive consumer (serialization).

use vigil::observable::{Class, ObjectRef, Value, get_origin, transform};

#[test]
fn tracked_graph_serializes_like_origin() {
    let model = Class::builder("Notebook")
        .observable("cells", Value::sequence(Vec::<Value>::new()))
        .field("path", "a.ipynb")
        .build();
    let raw = Value::from(model.instantiate());
    let view = transform(&raw);
    let cells = view.as_tracked().unwrap().get("cells");
    cells
        .as_tracked()
        .unwrap()
        .push(Value::record([("source", "print(1)")]))
        .unwrap();

    let from_view = serde_json::to_value(&view).unwrap();
    let from_origin = serde_json::to_value(get_origin(&view)).unwrap();
    assert_eq!(from_view, from_origin);
    assert_eq!(
        from_view,
        serde_json::json!({"cells": [{"source": "print(1)"}], "path": "a.ipynb"})
    );
}

#[test]
fn cyclic_graph_is_an_error() {
    let a = ObjectRef::record(Vec::<(&str, Value)>::new());
    a.set_field("me", &a).unwrap();
    assert!(serde_json::to_string(&Value::from(&a)).is_err());
    a.set_field("me", Value::Nil).unwrap();
}
