//! Core value type for observed data.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use vigil_foundation::{EntryKey, ObjectId, ValueKind};

use crate::object::ObjectRef;
use crate::tracked::Tracked;

/// A value that can live in a field of an observed object.
///
/// Scalars are compared by value (floats by bit pattern). `Object` and
/// `Tracked` are compared by identity: two values are equal only if they
/// refer to the same heap object, or the same tracking wrapper.
#[derive(Clone)]
pub enum Value {
    /// The nil value (null or undefined).
    Nil,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(Arc<str>),
    /// A raw heap object: reads and writes are neither tracked nor notified.
    Object(ObjectRef),
    /// A tracking wrapper over a heap object.
    Tracked(Tracked),
}

impl Value {
    /// Creates a raw sequence object.
    pub fn sequence<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Object(ObjectRef::sequence(items))
    }

    /// Creates a raw map object.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Value>,
        V: Into<Value>,
    {
        Self::Object(ObjectRef::map(entries))
    }

    /// Creates a raw record object.
    pub fn record<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Arc<str>>,
        V: Into<Value>,
    {
        Self::Object(ObjectRef::record(fields))
    }

    /// Returns the kind of this value.
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Nil => ValueKind::Nil,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Object(obj) => obj.kind(),
            Self::Tracked(_) => ValueKind::Tracked,
        }
    }

    /// Returns true if this value is nil.
    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns true if this value is a tracking wrapper.
    #[must_use]
    pub const fn is_tracked(&self) -> bool {
        matches!(self, Self::Tracked(_))
    }

    /// Attempts to extract a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to extract an integer value.
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a float value.
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to extract a string reference.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a raw object reference.
    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Attempts to extract a tracking wrapper.
    #[must_use]
    pub const fn as_tracked(&self) -> Option<&Tracked> {
        match self {
            Self::Tracked(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the heap object behind this value, looking through wrappers.
    #[must_use]
    pub fn target(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            Self::Tracked(t) => Some(t.target()),
            _ => None,
        }
    }

    /// Returns the id of the heap object behind this value, if any.
    #[must_use]
    pub fn object_id(&self) -> Option<ObjectId> {
        self.target().map(ObjectRef::id)
    }

    /// Returns this value with any tracking wrapper removed.
    ///
    /// Wrappers never nest, so one unwrap reaches the original target.
    #[must_use]
    pub fn origin(&self) -> Self {
        match self {
            Self::Tracked(t) => Self::Object(t.target().clone()),
            other => other.clone(),
        }
    }

    /// Returns the identity this value has as a map key.
    #[must_use]
    pub fn entry_key(&self) -> EntryKey {
        match self {
            Self::Nil => EntryKey::Nil,
            Self::Bool(b) => EntryKey::Bool(*b),
            Self::Int(n) => EntryKey::Int(*n),
            Self::Float(n) => EntryKey::Float(n.to_bits()),
            Self::String(s) => EntryKey::String(Arc::clone(s)),
            Self::Object(obj) => EntryKey::Object(obj.id()),
            Self::Tracked(t) => EntryKey::Object(t.id()),
        }
    }
}

// Identity semantics for heap values, bit equality for floats
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Tracked(a), Self::Tracked(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Nil => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(n) => n.hash(state),
            Self::Float(n) => n.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::Object(obj) => obj.id().hash(state),
            Self::Tracked(t) => t.id().hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Object(obj) => write!(f, "{obj:?}"),
            Self::Tracked(t) => write!(f, "{t:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Object(obj) => write!(f, "<{} {}>", obj.kind(), obj.id()),
            Self::Tracked(t) => write!(f, "<tracked {} {}>", t.kind(), t.id()),
        }
    }
}

// Convenience From implementations

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s.into())
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Self::String(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }
}

impl From<&ObjectRef> for Value {
    fn from(obj: &ObjectRef) -> Self {
        Self::Object(obj.clone())
    }
}

impl From<Tracked> for Value {
    fn from(t: Tracked) -> Self {
        Self::Tracked(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Nil, Into::into)
    }
}

#[cfg(feature = "serde")]
mod serde_support {
    use std::cell::RefCell;

    use serde::ser::{Error as _, SerializeMap, SerializeSeq};
    use serde::{Serialize, Serializer};
    use vigil_foundation::ObjectId;

    use super::Value;
    use crate::object::ObjectData;

    /// Serializes the origin graph; wrappers serialize as their targets.
    impl Serialize for Value {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let path = RefCell::new(Vec::new());
            Node { value: self, path: &path }.serialize(serializer)
        }
    }

    /// A value plus the objects currently being serialized above it.
    struct Node<'a> {
        value: &'a Value,
        path: &'a RefCell<Vec<ObjectId>>,
    }

    impl<'a> Node<'a> {
        fn child<'b>(&self, value: &'b Value) -> Node<'b>
        where
            'a: 'b,
        {
            Node {
                value,
                path: self.path,
            }
        }
    }

    impl Serialize for Node<'_> {
        fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let obj = match self.value {
                Value::Nil => return serializer.serialize_unit(),
                Value::Bool(b) => return serializer.serialize_bool(*b),
                Value::Int(n) => return serializer.serialize_i64(*n),
                Value::Float(n) => return serializer.serialize_f64(*n),
                Value::String(s) => return serializer.serialize_str(s),
                Value::Object(obj) => obj,
                Value::Tracked(t) => t.target(),
            };

            let id = obj.id();
            if self.path.borrow().contains(&id) {
                return Err(S::Error::custom(format!(
                    "cycle detected at {id}: value graph cannot be serialized"
                )));
            }
            self.path.borrow_mut().push(id);
            let data = obj.with_data(Clone::clone);
            let result = match &data {
                ObjectData::Sequence(items) => {
                    let mut seq = serializer.serialize_seq(Some(items.len()))?;
                    for item in items {
                        seq.serialize_element(&self.child(item))?;
                    }
                    seq.end()
                }
                ObjectData::Map(entries) => {
                    let mut map = serializer.serialize_map(Some(entries.len()))?;
                    for (k, v) in entries {
                        map.serialize_entry(&self.child(k), &self.child(v))?;
                    }
                    map.end()
                }
                ObjectData::Record(fields) => serialize_fields(serializer, fields, self),
                ObjectData::Instance(instance) => {
                    serialize_fields(serializer, &instance.fields, self)
                }
            };
            self.path.borrow_mut().pop();
            result
        }
    }

    fn serialize_fields<S: Serializer>(
        serializer: S,
        fields: &indexmap::IndexMap<std::sync::Arc<str>, Value>,
        node: &Node<'_>,
    ) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for (name, value) in fields {
            map.serialize_entry(name.as_ref(), &node.child(value))?;
        }
        map.end()
    }

}
