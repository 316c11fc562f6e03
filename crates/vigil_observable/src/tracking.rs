//! Invocation-scoped dependency tracking.
//!
//! A tracking context is pushed for the synchronous duration of one consumer
//! invocation. Every tracked read consults the top of the stack and records
//! its `(target, field)` pair there. Reads with no active context are inert.

use std::cell::RefCell;

use indexmap::IndexSet;
use vigil_foundation::{FieldKey, ObjectId};
use vigil_notify::NotifierKey;

use crate::transform::transform;
use crate::value::Value;

/// The `(target, field)` pairs read during one tracked invocation, in
/// first-read order.
pub type Dependencies = IndexSet<NotifierKey>;

thread_local! {
    // `None` frames suppress recording (see `untracked`).
    static STACK: RefCell<Vec<Option<Dependencies>>> = const { RefCell::new(Vec::new()) };
}

/// Pops the frame pushed by `enter` even if the body panics.
struct Frame;

impl Frame {
    fn enter(frame: Option<Dependencies>) -> Self {
        STACK.with(|stack| stack.borrow_mut().push(frame));
        Self
    }

    fn take(self) -> Dependencies {
        let deps = STACK.with(|stack| stack.borrow_mut().pop().flatten());
        std::mem::forget(self);
        deps.unwrap_or_default()
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Runs `f` inside a fresh tracking context and returns what it read.
///
/// Contexts nest: reads inside an inner `track` are recorded only there.
pub fn track<R>(f: impl FnOnce() -> R) -> (R, Dependencies) {
    let frame = Frame::enter(Some(Dependencies::new()));
    let result = f();
    (result, frame.take())
}

/// Runs `f` with dependency recording suspended.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _frame = Frame::enter(None);
    f()
}

/// Returns true if reads are currently being recorded.
#[must_use]
pub fn is_tracking() -> bool {
    STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
}

/// Records a read of `(target, field)` in the active context, if any.
pub(crate) fn record_read(target: ObjectId, field: Option<FieldKey>) {
    STACK.with(|stack| {
        if let Some(Some(deps)) = stack.borrow_mut().last_mut() {
            let key = NotifierKey::new(target, field);
            tracing::trace!(?key, "recorded dependency");
            deps.insert(key);
        }
    });
}

/// Produces the tracking view a consumer should read through.
///
/// Nil, primitives and other non-wrappable values come back unchanged, and
/// no tracking happens on them.
#[must_use]
pub fn use_observe(value: &Value) -> Value {
    if value.is_nil() {
        return Value::Nil;
    }
    transform(value)
}
