//! Integration tests for Notifier
//!
//! Tests listener snapshots, disposal, and reentrancy.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use vigil_foundation::{FieldKey, ObjectId};
use vigil_notify::{Disposable, Notifier, NotifierKey};

fn notifier() -> Notifier {
    Notifier::new(NotifierKey::field(ObjectId::new(1, 1), "name"))
}

fn counter() -> (Rc<Cell<u32>>, impl Fn(&NotifierKey) + 'static) {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    (count, move |_: &NotifierKey| c.set(c.get() + 1))
}

// =============================================================================
// Firing
// =============================================================================

#[test]
fn fire_invokes_every_listener() {
    let n = notifier();
    let (a, la) = counter();
    let (b, lb) = counter();
    let _da = n.on_change(la);
    let _db = n.on_change(lb);

    n.fire();
    n.fire();
    assert_eq!((a.get(), b.get()), (2, 2));
    assert_eq!(n.fire_count(), 2);
    assert_eq!(n.listener_count(), 2);
}

#[test]
fn listeners_receive_the_key() {
    let n = notifier();
    let seen = Rc::new(RefCell::new(None));
    let s = Rc::clone(&seen);
    let _d = n.on_change(move |key| *s.borrow_mut() = Some(key.clone()));
    n.fire();
    let key = seen.borrow().clone().unwrap();
    assert_eq!(key.field, Some(FieldKey::name("name")));
}

#[test]
fn listeners_added_during_fire_wait_for_next_fire() {
    let n = notifier();
    let late = Rc::new(Cell::new(0));
    let held: Rc<RefCell<Vec<Disposable>>> = Rc::new(RefCell::new(Vec::new()));

    let (n2, late2, held2) = (n.clone(), Rc::clone(&late), Rc::clone(&held));
    let _d = n.on_change(move |_| {
        let l = Rc::clone(&late2);
        held2
            .borrow_mut()
            .push(n2.on_change(move |_| l.set(l.get() + 1)));
    });

    n.fire();
    assert_eq!(late.get(), 0);
    n.fire();
    assert_eq!(late.get(), 1);
}

#[test]
fn listener_refiring_its_notifier_does_not_loop() {
    let n = notifier();
    let depth = Rc::new(Cell::new(0));
    let (n2, d2) = (n.clone(), Rc::clone(&depth));
    let _d = n.on_change(move |_| {
        d2.set(d2.get() + 1);
        if d2.get() < 3 {
            n2.fire();
        }
    });
    n.fire();
    assert_eq!(depth.get(), 3);
}

// =============================================================================
// Disposal
// =============================================================================

#[test]
fn disposing_a_listener_is_idempotent() {
    let n = notifier();
    let (count, listener) = counter();
    let d = n.on_change(listener);
    d.dispose();
    d.dispose();
    assert!(d.is_disposed());
    n.fire();
    assert_eq!(count.get(), 0);
    assert_eq!(n.listener_count(), 0);
}

#[test]
fn disposing_the_notifier_clears_listeners() {
    let n = notifier();
    let (count, listener) = counter();
    let d = n.on_change(listener);
    n.dispose();
    n.dispose();
    assert!(n.is_disposed());
    n.fire();
    assert_eq!(count.get(), 0);
    d.dispose();
}

#[test]
fn listener_disposed_mid_fire_is_skipped() {
    let n = notifier();
    let (count, listener) = counter();
    let victim: Rc<RefCell<Option<Disposable>>> = Rc::new(RefCell::new(None));
    let v = Rc::clone(&victim);
    let _killer = n.on_change(move |_| {
        if let Some(d) = v.borrow().as_ref() {
            d.dispose();
        }
    });
    *victim.borrow_mut() = Some(n.on_change(listener));

    n.fire();
    assert_eq!(count.get(), 0);
}

#[test]
fn clones_share_state() {
    let n = notifier();
    let m = n.clone();
    assert!(n.ptr_eq(&m));
    let (count, listener) = counter();
    let _d = m.on_change(listener);
    n.fire();
    assert_eq!(count.get(), 1);
}
