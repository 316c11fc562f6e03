//! Integration tests for one-shot and deferred listeners

use std::cell::Cell;
use std::rc::Rc;

use vigil_foundation::{ObjectId, ObserveConfig};
use vigil_notify::{NotifierKey, deferred, registry};

fn counter() -> (Rc<Cell<u32>>, impl Fn(&NotifierKey) + 'static) {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    (count, move |_: &NotifierKey| c.set(c.get() + 1))
}

#[test]
fn three_fires_reach_a_deferred_listener_once() {
    let id = ObjectId::new(40, 1);
    let notifier = registry::get_or_create(id, None);
    let (count, listener) = counter();
    let _sub = ObserveConfig::default()
        .with_deferred_listeners(true)
        .scope(|| notifier.on_change(listener));

    notifier.fire();
    notifier.fire();
    notifier.fire();
    assert_eq!(count.get(), 0);
    assert_eq!(deferred::pending_len(), 1);

    assert_eq!(deferred::flush(), 1);
    assert_eq!(count.get(), 1);

    notifier.fire();
    deferred::flush();
    assert_eq!(count.get(), 2);
}

#[test]
fn sync_listeners_ignore_the_deferred_setting() {
    let notifier = registry::get_or_create(ObjectId::new(41, 1), None);
    let (count, listener) = counter();
    let _sub = ObserveConfig::default()
        .with_deferred_listeners(true)
        .scope(|| notifier.on_change_sync(listener));

    notifier.fire();
    assert_eq!(count.get(), 1);
    assert_eq!(deferred::pending_len(), 0);
}

#[test]
fn once_listener_detaches_itself() {
    let notifier = registry::get_or_create(ObjectId::new(42, 1), None);
    let (count, listener) = counter();
    let _once = notifier.once(move |key| listener(key));
    let (steady, steady_listener) = counter();
    let _steady = notifier.on_change(steady_listener);

    notifier.fire();
    notifier.fire();
    assert_eq!((count.get(), steady.get()), (1, 2));
    assert_eq!(notifier.listener_count(), 1);
}

#[test]
fn disposing_the_notifier_drops_queued_work() {
    let notifier = registry::get_or_create(ObjectId::new(43, 1), None);
    let (count, listener) = counter();
    let _sub = notifier.on_change_deferred(listener);

    notifier.fire();
    notifier.dispose();
    assert_eq!(deferred::flush(), 0);
    assert_eq!(count.get(), 0);
}
