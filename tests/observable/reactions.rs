//! Integration tests for reactions and the batch scheduler

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vigil_foundation::{ErrorKind, ObserveConfig, SemanticLimit};
use vigil_notify::NotifierKey;
use vigil_observable::{BatchScheduler, Reaction, Tracked, Value, transform};

fn record(fields: &[(&str, i64)]) -> Tracked {
    let raw = Value::record(fields.iter().map(|(k, v)| (*k, Value::Int(*v))));
    transform(&raw).as_tracked().unwrap().clone()
}

#[test]
fn reaction_reruns_once_per_flush() {
    let scheduler = BatchScheduler::new();
    let model = record(&[("count", 0)]);
    let renders = Rc::new(RefCell::new(Vec::new()));

    let (reader, r) = (model.clone(), Rc::clone(&renders));
    let view = Reaction::new("counter_view", scheduler.clone(), move || {
        r.borrow_mut().push(reader.get("count").as_int().unwrap_or(-1));
    });
    view.run();

    model.set("count", 1).unwrap();
    model.set("count", 2).unwrap();
    model.set("count", 3).unwrap();
    assert_eq!(scheduler.flush().unwrap(), 1);
    assert_eq!(*renders.borrow(), vec![0, 3]);
}

#[test]
fn independent_consumers_share_notifiers() {
    let scheduler = BatchScheduler::new();
    let raw = Value::record([("status", "idle")]);
    let first = transform(&raw).as_tracked().unwrap().clone();
    let second = transform(&raw).as_tracked().unwrap().clone();
    assert!(first.ptr_eq(&second));

    let hits = Rc::new(Cell::new(0));
    let reactions: Vec<Reaction> = [first.clone(), second.clone()]
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            let h = Rc::clone(&hits);
            let r = Reaction::new(format!("consumer{i}"), scheduler.clone(), move || {
                let _ = t.get("status");
                h.set(h.get() + 1);
            });
            r.run();
            r
        })
        .collect();

    first.set("status", "busy").unwrap();
    scheduler.flush().unwrap();
    assert_eq!(hits.get(), 4);
    for r in &reactions {
        assert!(r.is_subscribed(&NotifierKey::field(second.id(), "status")));
    }
}

#[test]
fn dependency_set_follows_the_last_run() {
    let scheduler = BatchScheduler::new();
    let model = record(&[("mode", 0), ("left", 0), ("right", 0)]);
    let reader = model.clone();
    let reaction = Reaction::new("switch", scheduler.clone(), move || {
        let field = if reader.get("mode").as_int() == Some(0) {
            "left"
        } else {
            "right"
        };
        let _ = reader.get(field);
    });
    reaction.run();
    assert_eq!(reaction.dependency_count(), 2);

    model.set("mode", 1).unwrap();
    scheduler.flush().unwrap();
    assert!(!reaction.is_subscribed(&NotifierKey::field(model.id(), "left")));
    assert!(reaction.is_subscribed(&NotifierKey::field(model.id(), "right")));

    let runs = reaction.run_count();
    model.set("left", 9).unwrap();
    scheduler.flush().unwrap();
    assert_eq!(reaction.run_count(), runs);
}

#[test]
fn self_writing_reaction_settles() {
    let scheduler = BatchScheduler::new();
    let model = record(&[("value", 0), ("doubled", 0)]);
    let rw = model.clone();
    let reaction = Reaction::new("derive", scheduler.clone(), move || {
        let v = rw.get("value").as_int().unwrap_or(0);
        rw.set("doubled", v * 2).unwrap();
    });
    reaction.run();

    model.set("value", 21).unwrap();
    assert_eq!(scheduler.flush().unwrap(), 1);
    assert_eq!(model.get("doubled"), Value::Int(42));
}

#[test]
fn runaway_reaction_is_stopped_by_config() {
    ObserveConfig::strict().install();
    let scheduler = BatchScheduler::new();
    let model = record(&[("ticks", 0)]);
    let rw = model.clone();
    let reaction = Reaction::new("ticker", scheduler.clone(), move || {
        let n = rw.get("ticks").as_int().unwrap_or(0);
        rw.set("ticks", n + 1).unwrap();
    });
    reaction.run();
    model.set("ticks", 100).unwrap();

    let err = scheduler.flush().unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::LimitExceeded(SemanticLimit::MaxFlushRounds { limit: 8, .. })
    ));
    ObserveConfig::default().install();
}

#[test]
fn batch_defers_until_outermost_exit() {
    let scheduler = BatchScheduler::new();
    let model = record(&[("a", 0), ("b", 0)]);
    let runs = Rc::new(Cell::new(0));
    let (reader, r) = (model.clone(), Rc::clone(&runs));
    let reaction = Reaction::new("sum", scheduler.clone(), move || {
        let _ = reader.get("a");
        let _ = reader.get("b");
        r.set(r.get() + 1);
    });
    reaction.run();

    scheduler
        .batch(|| {
            model.set("a", 1).unwrap();
            model.set("b", 1).unwrap();
        })
        .unwrap();
    assert_eq!(runs.get(), 2);
    assert_eq!(scheduler.pending_len(), 0);
}
