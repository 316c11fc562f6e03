//! End-to-end scenarios: models declared with marked fields, observed by
//! consumers, mutated by writers.

use std::cell::Cell;
use std::rc::Rc;

use vigil::notify::registry;
use vigil::observable::{
    BatchScheduler, Class, Reaction, Value, get_origin, notifier_for, observable, watch,
};

#[test]
fn marked_field_listener_fires() {
    let foo = Class::builder("Foo").observable("name", "").build();
    let raw = Value::from(foo.instantiate());
    let f = observable(&raw);

    let fired = Rc::new(Cell::new(false));
    let flag = Rc::clone(&fired);
    let _sub = notifier_for(&f, "name")
        .unwrap()
        .on_change(move |_| flag.set(true));

    let view = f.as_tracked().unwrap();
    view.set("name", "a").unwrap();
    view.set("name", "b").unwrap();

    assert!(fired.get());
    assert_eq!(view.get("name"), Value::from("b"));
    assert_eq!(get_origin(&f), raw);
}

#[test]
fn notebook_cell_rerenders_on_execution_state() {
    let output = Class::builder("Output").observable("text", "").build();
    let cell = Class::builder("Cell")
        .observable("source", "")
        .observable("execution_count", Value::Nil)
        .observable("outputs", Value::sequence(Vec::<Value>::new()))
        .field("editor_handle", 0)
        .build();

    let raw = Value::from(cell.instantiate());
    let model = observable(&raw).as_tracked().unwrap().clone();
    let scheduler = BatchScheduler::new();
    let rendered = Rc::new(std::cell::RefCell::new(String::new()));

    let (reader, out) = (model.clone(), Rc::clone(&rendered));
    let render = Reaction::new("cell_view", scheduler.clone(), move || {
        let count = reader.get("execution_count");
        let outputs = reader.get("outputs");
        let texts: Vec<String> = outputs
            .as_tracked()
            .unwrap()
            .values()
            .iter()
            .map(|o| o.as_tracked().unwrap().get("text").to_string())
            .collect();
        *out.borrow_mut() = format!("[{count}] {}", texts.join("|"));
    });
    render.run();
    assert_eq!(*rendered.borrow(), "[nil] ");

    scheduler
        .batch(|| {
            model.set("execution_count", 1).unwrap();
            let outputs = model.get("outputs");
            let first = output.instantiate_with([("text", "hello")]);
            outputs.as_tracked().unwrap().push(first).unwrap();
        })
        .unwrap();
    assert_eq!(*rendered.borrow(), "[1] hello");
    assert_eq!(render.run_count(), 2);

    // Editing an output's text reaches the view through the nested read.
    let first = model.get("outputs").as_tracked().unwrap().at(0);
    first.as_tracked().unwrap().set("text", "world").unwrap();
    scheduler.flush().unwrap();
    assert_eq!(*rendered.borrow(), "[1] world");

    // Unmarked fields never trigger a re-render.
    let runs = render.run_count();
    model.set("editor_handle", 42).unwrap();
    scheduler.flush().unwrap();
    assert_eq!(render.run_count(), runs);
}

#[test]
fn manual_watchers_and_reactions_coexist() {
    let raw = Value::map(Vec::<(Value, Value)>::new());
    let kernels = observable(&raw);
    let scheduler = BatchScheduler::new();

    let watched = Rc::new(Cell::new(0));
    let w = Rc::clone(&watched);
    let sub = watch(&kernels, None, move |_| w.set(w.get() + 1)).unwrap();

    let sizes = Rc::new(Cell::new(0usize));
    let (reader, s) = (kernels.as_tracked().unwrap().clone(), Rc::clone(&sizes));
    let reaction = Reaction::new("kernel_count", scheduler.clone(), move || {
        s.set(reader.len());
    });
    reaction.run();

    let map = kernels.as_tracked().unwrap();
    map.set_entry("python3", "idle").unwrap();
    map.set_entry("julia", "busy").unwrap();
    scheduler.flush().unwrap();
    assert_eq!(watched.get(), 2);
    assert_eq!(sizes.get(), 2);

    sub.dispose();
    map.delete_entry("julia").unwrap();
    scheduler.flush().unwrap();
    assert_eq!(watched.get(), 2);
    assert_eq!(sizes.get(), 1);
}

#[test]
fn dropped_objects_release_their_notifiers() {
    let id = {
        let view = observable(&Value::record([("a", 1)]));
        let _ = notifier_for(&view, "a").unwrap();
        view.object_id().unwrap()
    };
    assert!(registry::find(id, Some("a".into())).is_some());
    registry::sweep();
    assert!(registry::find(id, Some("a".into())).is_none());
}
