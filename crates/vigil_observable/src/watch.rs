//! Direct notifier access for manual integrations.
//!
//! These helpers subscribe to, or trigger, the notifiers of a value without
//! going through a [`Reaction`](crate::Reaction).

use vigil_foundation::{Error, ErrorContext, FieldKey, Result};
use vigil_notify::{Disposable, NotifierKey, registry};

use crate::change;
use crate::object::ObjectRef;
use crate::transform::transform;
use crate::value::Value;

fn wrapped_target(value: &Value, operation: &str) -> Result<ObjectRef> {
    match transform(value) {
        Value::Tracked(tracked) => Ok(tracked.target().clone()),
        _ => Err(Error::not_observable(value.kind())
            .with_context(ErrorContext::new().with_operation(operation))),
    }
}

/// Subscribes `handler` to one field of `value`, or to the whole container
/// when `field` is `None`.
///
/// # Errors
///
/// Returns [`ErrorKind::NotObservable`](vigil_foundation::ErrorKind) if
/// `value` cannot be wrapped.
pub fn watch(
    value: &Value,
    field: Option<FieldKey>,
    handler: impl Fn(&NotifierKey) + 'static,
) -> Result<Disposable> {
    let target = wrapped_target(value, "watch")?;
    Ok(registry::get_or_create(target.id(), field).on_change(handler))
}

/// Fires the notifiers of `value` as if `field` had changed: the field
/// notifier (if any), the container notifier, and the relays of every
/// instance holding `value` in an observable field.
///
/// # Errors
///
/// Returns [`ErrorKind::NotObservable`](vigil_foundation::ErrorKind) if
/// `value` cannot be wrapped.
pub fn trigger(value: &Value, field: Option<FieldKey>) -> Result<()> {
    let target = wrapped_target(value, "trigger")?;
    change::emit(&target, field.as_slice());
    Ok(())
}
