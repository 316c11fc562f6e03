//! Tracking wrappers.
//!
//! A [`Tracked`] is the transparent view over one heap object. Reads record
//! `(target, field)` dependencies in the active tracking context and hand
//! back nested containers already wrapped. Writes update the target, then
//! fire the notifiers for the affected keys.
//!
//! # Invariants
//!
//! 1. At most one wrapper exists per target at a time: wrapping a target
//!    while any handle to its wrapper is alive returns that same wrapper.
//! 2. Targets never contain wrappers; every write stores the origin.
//! 3. Each write produces change events whose container-notifier counts
//!    are: `push` 2, `set`/`set_at`/`set_entry`/`delete`/`delete_entry`/
//!    `pop`/`insert`/`remove`/`extend`/`clear` 1. A write that changes
//!    nothing fires nothing.
//! 4. A change inside a container also fires the field and container
//!    notifiers of each instance holding it in an observable field. Plain
//!    sequences, maps and records only report their own changes.

use std::fmt;
use std::rc::Rc;

use vigil_foundation::{FieldKey, ObjectId, ObserveConfig, Result, ValueKind};

use crate::change;
use crate::marking;
use crate::object::{ObjectRef, WriteOutcome};
use crate::tracking::record_read;
use crate::transform::transform;
use crate::value::Value;

pub(crate) struct TrackedInner {
    target: ObjectRef,
}

/// Transparent tracking view over a heap object.
///
/// Obtained from [`transform`](crate::transform()). Cloning shares the
/// same wrapper.
#[derive(Clone)]
pub struct Tracked {
    inner: Rc<TrackedInner>,
}

impl Tracked {
    /// Returns the wrapper for `target`, creating and caching it if needed.
    pub(crate) fn wrap(target: &ObjectRef) -> Self {
        let existing = target.0.wrapper.borrow().upgrade();
        if let Some(inner) = existing {
            return Self { inner };
        }
        let inner = Rc::new(TrackedInner {
            target: target.clone(),
        });
        *target.0.wrapper.borrow_mut() = Rc::downgrade(&inner);
        tracing::trace!(target = ?target.id(), kind = %target.kind(), "created tracking wrapper");
        Self { inner }
    }

    /// Returns the wrapped object.
    #[must_use]
    pub fn target(&self) -> &ObjectRef {
        &self.inner.target
    }

    /// Returns the id of the wrapped object.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.inner.target.id()
    }

    /// Returns the kind of the wrapped object.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.inner.target.kind()
    }

    /// Returns true if both handles are the same wrapper.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Whether reads and writes of `name` participate in tracking.
    fn observes(&self, name: &str) -> bool {
        match self.kind() {
            ValueKind::Record => true,
            ValueKind::Instance => marking::is_marked(self.target(), Some(name)),
            _ => false,
        }
    }

    fn read(&self, field: Option<FieldKey>) {
        record_read(self.id(), field);
    }

    fn keeps_origin(&self, name: &str) -> bool {
        self.target().class().is_some_and(|class| class.keeps_origin(name))
    }

    /// Prepares a value read from field `name` for the caller.
    fn lift_field(&self, name: &str, value: Value) -> Value {
        if self.keeps_origin(name) {
            return value;
        }
        self.target().link_child(name, &value);
        transform(&value)
    }

    fn emit(&self, keys: &[FieldKey]) {
        change::emit(self.target(), keys);
    }

    // =========================================================================
    // Shared
    // =========================================================================

    /// Number of elements, entries, or fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read(Some(FieldKey::Length));
        self.target().len()
    }

    /// Returns true if the container is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every element, entry, or record field. Fires once, and not at
    /// all when already empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is frozen or is a class instance.
    pub fn clear(&self) -> Result<()> {
        let mut keys = self.target().clear_all()?;
        if keys.is_empty() {
            return Ok(());
        }
        keys.push(FieldKey::Length);
        self.emit(&keys);
        Ok(())
    }

    // =========================================================================
    // Fields (records and instances)
    // =========================================================================

    /// Reads a field. Missing fields read as nil.
    ///
    /// Origin fields come back exactly as stored and record nothing.
    /// Unmarked instance fields are wrapped but record nothing.
    #[must_use]
    pub fn get(&self, name: &str) -> Value {
        let value = self.target().field(name).unwrap_or(Value::Nil);
        if self.observes(name) && !self.keeps_origin(name) {
            self.read(Some(FieldKey::name(name)));
        }
        self.lift_field(name, value)
    }

    /// Returns true if the field exists.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        if self.observes(name) {
            self.read(Some(FieldKey::name(name)));
        }
        self.target().field(name).is_some()
    }

    /// Returns the container's keys: field names, map keys, or indices.
    #[must_use]
    pub fn keys(&self) -> Vec<Value> {
        self.read(Some(FieldKey::Length));
        let target = self.target();
        match target.kind() {
            ValueKind::Sequence => (0..target.len())
                .map(|i| Value::Int(i64::try_from(i).unwrap_or(i64::MAX)))
                .collect(),
            ValueKind::Map => target
                .entries()
                .into_iter()
                .map(|(k, _)| transform(&k))
                .collect(),
            _ => target.field_names().into_iter().map(Value::String).collect(),
        }
    }

    /// Writes a field. Writes to unmarked instance fields do not notify.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is frozen, or is not a record or
    /// instance.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        let skip = ObserveConfig::current().skip_unchanged_writes;
        let outcome = self.target().write_field(name, value.into(), skip)?;
        if outcome == WriteOutcome::Unchanged || !self.observes(name) {
            return Ok(());
        }
        let mut keys = vec![FieldKey::name(name)];
        if outcome == WriteOutcome::Added {
            keys.push(FieldKey::Length);
        }
        self.emit(&keys);
        Ok(())
    }

    /// Deletes a field, returning its last value.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is frozen, or is not a record or
    /// instance.
    pub fn delete(&self, name: &str) -> Result<Option<Value>> {
        let removed = self.target().delete_field(name)?;
        if removed.is_some() && self.observes(name) {
            self.emit(&[FieldKey::name(name), FieldKey::Length]);
        }
        Ok(removed.map(|v| transform(&v)))
    }

    // =========================================================================
    // Sequences
    // =========================================================================

    /// Reads an element. Out-of-range reads return nil.
    #[must_use]
    pub fn at(&self, index: usize) -> Value {
        self.read(Some(FieldKey::Index(index)));
        self.target()
            .element(index)
            .map_or(Value::Nil, |value| transform(&value))
    }

    /// Returns every element (or value, for maps and records), wrapped.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.read(None);
        let target = self.target();
        match target.kind() {
            ValueKind::Sequence | ValueKind::Map => {
                target.values().iter().map(transform).collect()
            }
            _ => target
                .field_names()
                .into_iter()
                .zip(target.values())
                .map(|(name, v)| self.lift_field(&name, v))
                .collect(),
        }
    }

    /// Overwrites an element.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is frozen, is not a sequence, or
    /// `index` is out of bounds.
    pub fn set_at(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        let skip = ObserveConfig::current().skip_unchanged_writes;
        if self.target().seq_set(index, value.into(), skip)? {
            self.emit(&[FieldKey::Index(index)]);
        }
        Ok(())
    }

    /// Appends an element and returns the new length.
    ///
    /// Fires twice: once for the new element, once for the length change.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is frozen or is not a sequence.
    pub fn push(&self, value: impl Into<Value>) -> Result<usize> {
        let index = self.target().seq_push(value.into())?;
        self.emit(&[FieldKey::Index(index)]);
        self.emit(&[FieldKey::Length]);
        Ok(index + 1)
    }

    /// Removes and returns the last element.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is frozen or is not a sequence.
    pub fn pop(&self) -> Result<Option<Value>> {
        let Some((index, value)) = self.target().seq_pop()? else {
            return Ok(None);
        };
        self.emit(&[FieldKey::Index(index), FieldKey::Length]);
        Ok(Some(transform(&value)))
    }

    /// Inserts an element, shifting later elements up.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is frozen, is not a sequence, or
    /// `index` is past the end.
    pub fn insert(&self, index: usize, value: impl Into<Value>) -> Result<()> {
        let new_len = self.target().seq_insert(index, value.into())?;
        self.emit(&shifted(index, new_len));
        Ok(())
    }

    /// Removes and returns an element, shifting later elements down.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is frozen, is not a sequence, or
    /// `index` is out of bounds.
    pub fn remove(&self, index: usize) -> Result<Value> {
        let (value, old_len) = self.target().seq_remove(index)?;
        self.emit(&shifted(index, old_len));
        Ok(transform(&value))
    }

    /// Appends every value as one change event.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is frozen or is not a sequence.
    pub fn extend<I, V>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        let (start, end) = self.target().seq_extend(values)?;
        if start < end {
            self.emit(&shifted(start, end));
        }
        Ok(())
    }

    // =========================================================================
    // Maps
    // =========================================================================

    /// Reads a map entry. Missing entries read as nil.
    #[must_use]
    pub fn get_entry(&self, key: impl Into<Value>) -> Value {
        let key = key.into();
        self.read(Some(FieldKey::Entry(key.entry_key())));
        self.target()
            .entry(&key)
            .map_or(Value::Nil, |value| transform(&value))
    }

    /// Returns true if the map has an entry for `key`.
    #[must_use]
    pub fn contains_key(&self, key: impl Into<Value>) -> bool {
        let key = key.into();
        self.read(Some(FieldKey::Entry(key.entry_key())));
        self.target().entry(&key).is_some()
    }

    /// Returns the map's entries, keys and values wrapped.
    #[must_use]
    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.read(None);
        self.target()
            .entries()
            .into_iter()
            .map(|(k, v)| (transform(&k), transform(&v)))
            .collect()
    }

    /// Writes a map entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is frozen or is not a map.
    pub fn set_entry(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let skip = ObserveConfig::current().skip_unchanged_writes;
        let outcome = self.target().map_set(key.clone(), value.into(), skip)?;
        let field = FieldKey::Entry(key.entry_key());
        match outcome {
            WriteOutcome::Unchanged => {}
            WriteOutcome::Replaced => self.emit(&[field]),
            WriteOutcome::Added => self.emit(&[field, FieldKey::Length]),
        }
        Ok(())
    }

    /// Deletes a map entry, returning its last value.
    ///
    /// # Errors
    ///
    /// Returns an error if the target is frozen or is not a map.
    pub fn delete_entry(&self, key: impl Into<Value>) -> Result<Option<Value>> {
        let key = key.into();
        let removed = self.target().map_delete(&key)?;
        if removed.is_some() {
            self.emit(&[FieldKey::Entry(key.entry_key()), FieldKey::Length]);
        }
        Ok(removed.map(|v| transform(&v)))
    }
}

/// Keys touched when elements from `start` up to `end` move or appear.
fn shifted(start: usize, end: usize) -> Vec<FieldKey> {
    (start..end)
        .map(FieldKey::Index)
        .chain(std::iter::once(FieldKey::Length))
        .collect()
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Tracked {}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tracked({:?})", self.inner.target)
    }
}

impl From<&Tracked> for Value {
    fn from(t: &Tracked) -> Self {
        Value::Tracked(t.clone())
    }
}
