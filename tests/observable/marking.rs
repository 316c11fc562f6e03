//! Integration tests for the marking registry

use vigil_observable::{Class, Value, get_marked, is_marked, mark, transform};

fn names(value: &impl vigil_observable::Markable) -> Vec<String> {
    get_marked(value).iter().map(ToString::to_string).collect()
}

#[test]
fn inheritance_accumulates_marks() {
    let basic = Class::builder("ClassBasic").observable("name", "").build();
    let basic1 = Class::builder("ClassBasic1")
        .extends(&basic)
        .observable("name1", "")
        .build();
    let basic2 = Class::builder("ClassBasic2")
        .extends(&basic1)
        .observable("name2", "")
        .build();

    let instance = basic2.instantiate();
    let marked = names(&instance);
    assert_eq!(marked.len(), 3);
    assert_eq!(marked, vec!["name", "name1", "name2"]);
}

#[test]
fn redeclaring_without_marking_adds_no_duplicate() {
    let basic = Class::builder("ClassBasic").observable("name", "").build();
    let basic1 = Class::builder("ClassBasic1")
        .extends(&basic)
        .observable("name1", "")
        .build();
    let basic2 = Class::builder("ClassBasic2")
        .extends(&basic1)
        .observable("name2", "")
        .field("name1", "override")
        .build();

    let instance = basic2.instantiate();
    assert_eq!(names(&instance), vec!["name", "name1", "name2"]);
    assert_eq!(instance.field("name1"), Some(Value::from("override")));
}

#[test]
fn mark_after_definition() {
    let class = Class::builder("Late").field("title", "").build();
    let instance = Value::from(class.instantiate());
    assert!(!is_marked(&instance, None));
    assert!(!transform(&instance).is_tracked());

    mark(&class, "title");
    mark(&class, "title");
    assert!(is_marked(&instance, Some("title")));
    assert_eq!(names(&class), vec!["title"]);
    assert!(transform(&instance).is_tracked());
}

#[test]
fn wrappers_answer_marking_queries() {
    let class = Class::builder("Cell").observable("source", "").build();
    let view = transform(&Value::from(class.instantiate()));
    assert!(is_marked(&view, Some("source")));
    assert!(is_marked(view.as_tracked().unwrap(), Some("source")));
    assert!(!is_marked(&view, Some("missing")));
}
