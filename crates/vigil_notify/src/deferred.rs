//! The queue behind deferred listeners.
//!
//! A deferred listener does not run while its notifier fires. The fire only
//! queues it, once, and [`flush`] later invokes every queued listener. The
//! host drains the queue at its own scheduling boundary (end of an event
//! loop turn, before a frame), so a burst of writes costs each deferred
//! listener a single call.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use vigil_foundation::ObserveConfig;

use crate::notifier::NotifierKey;

pub(crate) struct Deferred {
    active: Rc<Cell<bool>>,
    queued: Cell<bool>,
    callback: Box<dyn Fn(&NotifierKey)>,
}

impl Deferred {
    pub(crate) fn new(active: Rc<Cell<bool>>, callback: impl Fn(&NotifierKey) + 'static) -> Self {
        Self {
            active,
            queued: Cell::new(false),
            callback: Box::new(callback),
        }
    }
}

thread_local! {
    static QUEUE: RefCell<VecDeque<(Rc<Deferred>, NotifierKey)>> = RefCell::new(VecDeque::new());
}

pub(crate) fn enqueue(entry: &Rc<Deferred>, key: &NotifierKey) {
    if !entry.active.get() || entry.queued.replace(true) {
        return;
    }
    QUEUE.with(|q| q.borrow_mut().push_back((Rc::clone(entry), key.clone())));
}

/// Runs every queued deferred listener once. Returns how many ran.
///
/// Listeners queued by a listener running here run in the same flush, in
/// later rounds. After [`ObserveConfig::max_flush_rounds`] rounds the rest
/// stays queued for the next flush.
pub fn flush() -> usize {
    let limit = ObserveConfig::current().max_flush_rounds;
    let mut ran = 0;
    for _ in 0..limit {
        let round = QUEUE.with(|q| std::mem::take(&mut *q.borrow_mut()));
        if round.is_empty() {
            return ran;
        }
        for (entry, key) in round {
            entry.queued.set(false);
            if entry.active.get() {
                (entry.callback)(&key);
                ran += 1;
            }
        }
    }
    let left = pending_len();
    if left > 0 {
        tracing::warn!(limit, left, "deferred listeners still queued after flush");
    }
    ran
}

/// Number of deferred listeners waiting for [`flush`].
#[must_use]
pub fn pending_len() -> usize {
    QUEUE.with(|q| q.borrow().len())
}
