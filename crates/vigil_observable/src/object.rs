//! Heap objects: the targets that tracking wrappers observe.
//!
//! An [`ObjectRef`] is a reference-counted handle to one heap object. Its
//! accessors and mutators are *raw*: they neither record dependencies nor
//! fire notifiers, which makes them the right tool for non-reactive
//! consumers (serialization, protocol layers) and for building fixtures.
//! Reactive access goes through [`Tracked`](crate::Tracked).
//!
//! Every object owns an [`ObjectId`] for as long as it lives; registries key
//! on that id instead of holding the object.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use indexmap::IndexMap;
use vigil_foundation::{Error, FieldKey, ObjectId, Result, ValueKind, ids};

use crate::class::Class;
use crate::marking;
use crate::tracked::TrackedInner;
use crate::value::Value;

/// The contents of a heap object.
#[derive(Clone, Debug)]
pub enum ObjectData {
    /// Ordered sequence of values.
    Sequence(Vec<Value>),
    /// Insertion-ordered map; object keys compare by identity.
    Map(IndexMap<Value, Value>),
    /// Plain record with insertion-ordered named fields.
    Record(IndexMap<Arc<str>, Value>),
    /// Instance of a [`Class`].
    Instance(Instance),
}

impl ObjectData {
    /// Returns the kind of container this is.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Sequence(_) => ValueKind::Sequence,
            Self::Map(_) => ValueKind::Map,
            Self::Record(_) => ValueKind::Record,
            Self::Instance(_) => ValueKind::Instance,
        }
    }

    /// Number of elements, entries, or fields.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Sequence(items) => items.len(),
            Self::Map(entries) => entries.len(),
            Self::Record(fields) => fields.len(),
            Self::Instance(instance) => instance.fields.len(),
        }
    }

    /// Returns true if there are no elements, entries, or fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fields(&self) -> Option<&IndexMap<Arc<str>, Value>> {
        match self {
            Self::Record(fields) => Some(fields),
            Self::Instance(instance) => Some(&instance.fields),
            _ => None,
        }
    }

    fn fields_mut(&mut self) -> Option<&mut IndexMap<Arc<str>, Value>> {
        match self {
            Self::Record(fields) => Some(fields),
            Self::Instance(instance) => Some(&mut instance.fields),
            _ => None,
        }
    }
}

/// Field storage of a class instance.
#[derive(Clone, Debug)]
pub struct Instance {
    /// The class this object was instantiated from.
    pub class: Class,
    /// Field values, in lineage declaration order.
    pub fields: IndexMap<Arc<str>, Value>,
}

/// Converts a value for storage inside a target: wrappers are unwrapped.
fn stored(value: impl Into<Value>) -> Value {
    let value: Value = value.into();
    value.origin()
}

/// Relay back-reference: the observable instance field `parent[field]`
/// held this object when recorded.
struct ParentEdge {
    parent: Weak<ObjectCell>,
    field: Arc<str>,
}

pub(crate) struct ObjectCell {
    id: ObjectId,
    data: RefCell<ObjectData>,
    frozen: Cell<bool>,
    /// The live tracking wrapper for this object, if any.
    pub(crate) wrapper: RefCell<Weak<TrackedInner>>,
    parents: RefCell<Vec<ParentEdge>>,
}

impl Drop for ObjectCell {
    fn drop(&mut self) {
        ids::release(self.id);
    }
}

/// Reference-counted handle to a heap object.
///
/// Cloning an `ObjectRef` creates a new handle to the **same** object.
#[derive(Clone)]
pub struct ObjectRef(pub(crate) Rc<ObjectCell>);

/// Outcome of a field or entry write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WriteOutcome {
    /// The stored value was already identical; nothing changed.
    Unchanged,
    /// An existing slot was overwritten.
    Replaced,
    /// A new field or entry was added.
    Added,
}

impl ObjectRef {
    /// Allocates a new heap object.
    #[must_use]
    pub fn new(data: ObjectData) -> Self {
        Self(Rc::new(ObjectCell {
            id: ids::allocate(),
            data: RefCell::new(data),
            frozen: Cell::new(false),
            wrapper: RefCell::new(Weak::new()),
            parents: RefCell::new(Vec::new()),
        }))
    }

    /// Creates a sequence object.
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(ObjectData::Sequence(
            items.into_iter().map(stored).collect(),
        ))
    }

    /// Creates a map object.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Self::new(ObjectData::Map(
            entries
                .into_iter()
                .map(|(k, v)| (stored(k), stored(v)))
                .collect(),
        ))
    }

    /// Creates a record object.
    pub fn record<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arc<str>>,
        V: Into<Value>,
    {
        Self::new(ObjectData::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), stored(v)))
                .collect(),
        ))
    }

    /// Returns the identity of this object.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    /// Returns the kind of container this is.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.0.data.borrow().kind()
    }

    /// Returns the class of an instance object.
    #[must_use]
    pub fn class(&self) -> Option<Class> {
        match &*self.0.data.borrow() {
            ObjectData::Instance(instance) => Some(instance.class.clone()),
            _ => None,
        }
    }

    /// Returns true if both handles refer to the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Marks this object immutable. Freezing is permanent.
    pub fn freeze(&self) {
        self.0.frozen.set(true);
    }

    /// Returns true if this object has been frozen.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.0.frozen.get()
    }

    /// Runs `f` with a shared borrow of the object's contents.
    ///
    /// # Panics
    ///
    /// Panics if `f` mutates this same object.
    pub fn with_data<R>(&self, f: impl FnOnce(&ObjectData) -> R) -> R {
        f(&self.0.data.borrow())
    }

    /// Number of elements, entries, or fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.data.borrow().len()
    }

    /// Returns true if there are no elements, entries, or fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads a named field of a record or instance.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<Value> {
        self.0.data.borrow().fields()?.get(name).cloned()
    }

    /// Returns the field names of a record or instance, in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<Arc<str>> {
        self.0
            .data
            .borrow()
            .fields()
            .map(|fields| fields.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Reads an element of a sequence.
    #[must_use]
    pub fn element(&self, index: usize) -> Option<Value> {
        match &*self.0.data.borrow() {
            ObjectData::Sequence(items) => items.get(index).cloned(),
            _ => None,
        }
    }

    /// Reads an entry of a map.
    #[must_use]
    pub fn entry(&self, key: &Value) -> Option<Value> {
        match &*self.0.data.borrow() {
            ObjectData::Map(entries) => entries.get(&key.origin()).cloned(),
            _ => None,
        }
    }

    /// Returns a snapshot of a sequence's elements or a container's values.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        match &*self.0.data.borrow() {
            ObjectData::Sequence(items) => items.clone(),
            ObjectData::Map(entries) => entries.values().cloned().collect(),
            ObjectData::Record(fields) => fields.values().cloned().collect(),
            ObjectData::Instance(instance) => instance.fields.values().cloned().collect(),
        }
    }

    /// Returns a snapshot of a map's entries.
    #[must_use]
    pub fn entries(&self) -> Vec<(Value, Value)> {
        match &*self.0.data.borrow() {
            ObjectData::Map(entries) => entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Writes a named field without notifying.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is frozen or is not a record or instance.
    pub fn set_field(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.write_field(name, value.into(), false).map(|_| ())
    }

    /// Appends to a sequence without notifying.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is frozen or is not a sequence.
    pub fn push(&self, value: impl Into<Value>) -> Result<()> {
        self.seq_push(value.into()).map(|_| ())
    }

    /// Writes a map entry without notifying.
    ///
    /// # Errors
    ///
    /// Returns an error if the object is frozen or is not a map.
    pub fn set_entry(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        self.map_set(key.into(), value.into(), false).map(|_| ())
    }

    // =========================================================================
    // Mutation primitives shared by the raw and tracked paths
    // =========================================================================

    fn check_writable(&self) -> Result<()> {
        if self.is_frozen() {
            return Err(Error::frozen(self.id()));
        }
        Ok(())
    }

    fn mismatch(&self, expected: ValueKind) -> Error {
        Error::kind_mismatch(expected, self.kind())
    }

    pub(crate) fn write_field(
        &self,
        name: &str,
        value: Value,
        skip_unchanged: bool,
    ) -> Result<WriteOutcome> {
        self.check_writable()?;
        let value = value.origin();
        let outcome = {
            let mut data = self.0.data.borrow_mut();
            let Some(fields) = data.fields_mut() else {
                drop(data);
                return Err(self.mismatch(ValueKind::Record));
            };
            match fields.get_mut(name) {
                Some(slot) if skip_unchanged && *slot == value => WriteOutcome::Unchanged,
                Some(slot) => {
                    *slot = value.clone();
                    WriteOutcome::Replaced
                }
                None => {
                    fields.insert(name.into(), value.clone());
                    WriteOutcome::Added
                }
            }
        };
        self.link_child(name, &value);
        Ok(outcome)
    }

    pub(crate) fn delete_field(&self, name: &str) -> Result<Option<Value>> {
        self.check_writable()?;
        let mut data = self.0.data.borrow_mut();
        let Some(fields) = data.fields_mut() else {
            drop(data);
            return Err(self.mismatch(ValueKind::Record));
        };
        Ok(fields.shift_remove(name))
    }

    fn with_sequence<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> Result<R>) -> Result<R> {
        self.check_writable()?;
        let mut data = self.0.data.borrow_mut();
        match &mut *data {
            ObjectData::Sequence(items) => f(items),
            _ => {
                drop(data);
                Err(self.mismatch(ValueKind::Sequence))
            }
        }
    }

    pub(crate) fn seq_set(&self, index: usize, value: Value, skip_unchanged: bool) -> Result<bool> {
        let value = value.origin();
        self.with_sequence(|items| {
            let length = items.len();
            let slot = items
                .get_mut(index)
                .ok_or_else(|| Error::index_out_of_bounds(index, length))?;
            if skip_unchanged && *slot == value {
                return Ok(false);
            }
            *slot = value;
            Ok(true)
        })
    }

    pub(crate) fn seq_push(&self, value: Value) -> Result<usize> {
        let value = value.origin();
        self.with_sequence(|items| {
            items.push(value);
            Ok(items.len() - 1)
        })
    }

    pub(crate) fn seq_pop(&self) -> Result<Option<(usize, Value)>> {
        self.with_sequence(|items| Ok(items.pop().map(|v| (items.len(), v))))
    }

    pub(crate) fn seq_insert(&self, index: usize, value: Value) -> Result<usize> {
        let value = value.origin();
        self.with_sequence(|items| {
            if index > items.len() {
                return Err(Error::index_out_of_bounds(index, items.len()));
            }
            items.insert(index, value);
            Ok(items.len())
        })
    }

    pub(crate) fn seq_remove(&self, index: usize) -> Result<(Value, usize)> {
        self.with_sequence(|items| {
            if index >= items.len() {
                return Err(Error::index_out_of_bounds(index, items.len()));
            }
            let old_len = items.len();
            Ok((items.remove(index), old_len))
        })
    }

    pub(crate) fn seq_extend(&self, values: Vec<Value>) -> Result<(usize, usize)> {
        self.with_sequence(|items| {
            let start = items.len();
            items.extend(values.into_iter().map(|v| v.origin()));
            Ok((start, items.len()))
        })
    }

    pub(crate) fn map_set(
        &self,
        key: Value,
        value: Value,
        skip_unchanged: bool,
    ) -> Result<WriteOutcome> {
        self.check_writable()?;
        let (key, value) = (key.origin(), value.origin());
        let mut data = self.0.data.borrow_mut();
        let ObjectData::Map(entries) = &mut *data else {
            drop(data);
            return Err(self.mismatch(ValueKind::Map));
        };
        match entries.get_mut(&key) {
            Some(slot) if skip_unchanged && *slot == value => Ok(WriteOutcome::Unchanged),
            Some(slot) => {
                *slot = value;
                Ok(WriteOutcome::Replaced)
            }
            None => {
                entries.insert(key, value);
                Ok(WriteOutcome::Added)
            }
        }
    }

    pub(crate) fn map_delete(&self, key: &Value) -> Result<Option<Value>> {
        self.check_writable()?;
        let mut data = self.0.data.borrow_mut();
        let ObjectData::Map(entries) = &mut *data else {
            drop(data);
            return Err(self.mismatch(ValueKind::Map));
        };
        Ok(entries.shift_remove(&key.origin()))
    }

    /// Empties the container, returning the keys that were removed.
    pub(crate) fn clear_all(&self) -> Result<Vec<FieldKey>> {
        self.check_writable()?;
        let mut data = self.0.data.borrow_mut();
        let removed = match &mut *data {
            ObjectData::Sequence(items) => {
                let keys = (0..items.len()).map(FieldKey::Index).collect();
                items.clear();
                keys
            }
            ObjectData::Map(entries) => {
                let keys = entries
                    .keys()
                    .map(|k| FieldKey::Entry(k.entry_key()))
                    .collect();
                entries.clear();
                keys
            }
            ObjectData::Record(fields) => {
                let keys = fields.keys().map(|k| FieldKey::Name(Arc::clone(k))).collect();
                fields.clear();
                keys
            }
            ObjectData::Instance(_) => {
                drop(data);
                return Err(self.mismatch(ValueKind::Record));
            }
        };
        Ok(removed)
    }

    // =========================================================================
    // Relays from observable instance fields
    // =========================================================================

    /// Records that `self[name]` holds `value`, if that makes `self` relay
    /// `value`'s changes: `self` is an instance, `name` is observable, and
    /// `value` is a mutable container.
    pub(crate) fn link_child(&self, name: &str, value: &Value) {
        let Value::Object(child) = value else {
            return;
        };
        if child.is_frozen() || child.ptr_eq(self) || child.kind() == ValueKind::Instance {
            return;
        }
        if self.kind() != ValueKind::Instance || !marking::is_marked(self, Some(name)) {
            return;
        }
        child.add_parent(self, name);
    }

    fn add_parent(&self, parent: &ObjectRef, name: &str) {
        let mut parents = self.0.parents.borrow_mut();
        parents.retain(|edge| self.still_held(edge).is_some());
        let exists = parents.iter().any(|edge| {
            &*edge.field == name && std::ptr::eq(edge.parent.as_ptr(), Rc::as_ptr(&parent.0))
        });
        if !exists {
            parents.push(ParentEdge {
                parent: Rc::downgrade(&parent.0),
                field: name.into(),
            });
        }
    }

    /// Returns the instances that still hold this object in an observable
    /// field, pruning stale edges.
    pub(crate) fn live_parents(&self) -> Vec<(ObjectRef, Arc<str>)> {
        let mut live = Vec::new();
        self.0.parents.borrow_mut().retain(|edge| match self.still_held(edge) {
            Some(parent) => {
                live.push((parent, Arc::clone(&edge.field)));
                true
            }
            None => false,
        });
        live
    }

    fn still_held(&self, edge: &ParentEdge) -> Option<ObjectRef> {
        let parent = edge.parent.upgrade().map(ObjectRef)?;
        parent.holds(&edge.field, self).then_some(parent)
    }

    /// Returns true if `self[name]` is `child`.
    fn holds(&self, name: &str, child: &ObjectRef) -> bool {
        // A parent mid-write is still settling; keep its edge.
        let Ok(data) = self.0.data.try_borrow() else {
            return true;
        };
        data.fields()
            .and_then(|fields| fields.get(name))
            .is_some_and(|v| matches!(v, Value::Object(obj) if obj.ptr_eq(child)))
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shallow: object graphs may be cyclic.
        let data = self.0.data.borrow();
        match &*data {
            ObjectData::Instance(instance) => {
                write!(f, "{}#{:?}", instance.class.name(), self.0.id)?;
            }
            other => write!(f, "{}#{:?}", other.kind(), self.0.id)?,
        }
        write!(f, "(len {})", data.len())?;
        if self.is_frozen() {
            write!(f, " frozen")?;
        }
        Ok(())
    }
}
