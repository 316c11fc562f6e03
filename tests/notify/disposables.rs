//! Integration tests for Disposable and DisposableCollection

use std::cell::Cell;
use std::rc::Rc;

use vigil_notify::{Disposable, DisposableCollection};

fn counting() -> (Rc<Cell<u32>>, Disposable) {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    (count, Disposable::new(move || c.set(c.get() + 1)))
}

#[test]
fn dispose_runs_once() {
    let (count, d) = counting();
    assert!(!d.is_disposed());
    d.dispose();
    d.dispose();
    assert_eq!(count.get(), 1);
    assert!(d.is_disposed());
}

#[test]
fn drop_does_not_dispose() {
    let (count, d) = counting();
    drop(d);
    assert_eq!(count.get(), 0);
}

#[test]
fn noop_is_harmless() {
    let d = Disposable::noop();
    d.dispose();
    d.dispose();
}

#[test]
fn collection_disposes_everything_once() {
    let bag = DisposableCollection::new();
    let (a, da) = counting();
    let (b, db) = counting();
    bag.push(da);
    bag.push(db);
    assert_eq!(bag.len(), 2);

    bag.dispose();
    bag.dispose();
    assert_eq!((a.get(), b.get()), (1, 1));
    assert!(bag.is_empty());
}
