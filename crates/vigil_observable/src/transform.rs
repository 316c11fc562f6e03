//! The transform engine: deciding what gets a tracking wrapper.

use vigil_foundation::{Error, ErrorContext, FieldKey, Result, ValueKind};
use vigil_notify::{Notifier, registry};

use crate::marking;
use crate::object::ObjectRef;
use crate::tracked::Tracked;
use crate::value::Value;

/// Returns the tracking view of `value`.
///
/// - nil and primitives come back unchanged;
/// - frozen objects come back unchanged and are never recursed into;
/// - tracking wrappers come back unchanged;
/// - sequences, maps, records and instances of classes with at least one
///   marked field get their cached wrapper, created on first use;
/// - instances of classes with no marked field come back unchanged.
///
/// ```
/// use vigil_observable::{Value, get_origin, transform};
///
/// let raw = Value::sequence([1, 2, 3]);
/// let view = transform(&raw);
/// assert_eq!(transform(&view), view);
/// assert_eq!(get_origin(&view), raw);
/// ```
#[must_use]
pub fn transform(value: &Value) -> Value {
    match value {
        Value::Object(obj) if is_wrappable(obj) => Value::Tracked(Tracked::wrap(obj)),
        other => other.clone(),
    }
}

/// Alias of [`transform`].
#[must_use]
pub fn observable(value: &Value) -> Value {
    transform(value)
}

fn is_wrappable(obj: &ObjectRef) -> bool {
    if obj.is_frozen() {
        return false;
    }
    match obj.kind() {
        ValueKind::Sequence | ValueKind::Map | ValueKind::Record => true,
        ValueKind::Instance => marking::is_marked(obj, None),
        _ => false,
    }
}

/// Returns true if `value` is, or can become, a tracking wrapper.
#[must_use]
pub fn can_be_notifiable(value: &Value) -> bool {
    match value {
        Value::Tracked(_) => true,
        Value::Object(obj) => is_wrappable(obj),
        _ => false,
    }
}

/// Returns the whole-container notifier of a tracking wrapper.
///
/// # Errors
///
/// Returns [`ErrorKind::NotObservable`](vigil_foundation::ErrorKind) if
/// `value` is not a tracking wrapper.
pub fn get_notifier(value: &Value) -> Result<Notifier> {
    try_get_notifier(value).ok_or_else(|| {
        Error::not_observable(value.kind())
            .with_context(ErrorContext::new().with_operation("get_notifier"))
    })
}

/// Like [`get_notifier`], returning `None` for non-wrappers.
#[must_use]
pub fn try_get_notifier(value: &Value) -> Option<Notifier> {
    let tracked = value.as_tracked()?;
    Some(registry::get_or_create(tracked.id(), None))
}

/// Returns the notifier for one field of a tracking wrapper.
///
/// # Errors
///
/// Returns [`ErrorKind::NotObservable`](vigil_foundation::ErrorKind) if
/// `value` is not a tracking wrapper.
pub fn notifier_for(value: &Value, field: impl Into<FieldKey>) -> Result<Notifier> {
    let Some(tracked) = value.as_tracked() else {
        return Err(Error::not_observable(value.kind())
            .with_context(ErrorContext::new().with_operation("notifier_for")));
    };
    Ok(registry::get_or_create(tracked.id(), Some(field.into())))
}
