//! Change events: firing notifiers after a tracked write.

use vigil_foundation::{FieldKey, ObjectId, ObserveConfig, ValueKind};
use vigil_notify::registry;

use crate::object::ObjectRef;

/// Fires the notifiers for one change event on `target`.
///
/// Each key's notifier fires, then the container notifier fires once. The
/// change is then relayed to every instance still holding `target` in an
/// observable field, as a change of that field. Relays stop there: plain
/// containers never relay, and instances are never relayed.
///
/// While [`ObserveConfig::paused`] is set, instance changes and relays are
/// dropped.
pub(crate) fn emit(target: &ObjectRef, keys: &[FieldKey]) {
    let paused = ObserveConfig::current().paused;
    if paused && target.kind() == ValueKind::Instance {
        return;
    }
    fire(target.id(), keys);
    if paused {
        return;
    }
    for (parent, field) in target.live_parents() {
        fire(parent.id(), &[FieldKey::Name(field)]);
    }
}

fn fire(id: ObjectId, keys: &[FieldKey]) {
    for key in keys {
        registry::notify(id, Some(key.clone()));
    }
    registry::notify(id, None);
}
