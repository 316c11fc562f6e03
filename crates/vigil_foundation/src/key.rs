//! Field keys: the field half of a notifier identity.
//!
//! A notifier is identified by `(target, field)`. The target is an
//! [`ObjectId`]; the field is a [`FieldKey`] naming what was read or written
//! on that target. `None` in place of a field key designates the target as a
//! whole.

use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::id::ObjectId;

/// What was read from or written to a target.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FieldKey {
    /// A named field of a record or class instance.
    Name(Arc<str>),
    /// An element of a sequence.
    Index(usize),
    /// An entry of a keyed map.
    Entry(EntryKey),
    /// The length of a sequence, the size of a map, or the shape of a record.
    Length,
}

impl FieldKey {
    /// Creates a named field key.
    #[must_use]
    pub fn name(name: impl Into<Arc<str>>) -> Self {
        Self::Name(name.into())
    }

    /// Returns the field name if this is a named key.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }
}

impl From<&str> for FieldKey {
    fn from(name: &str) -> Self {
        Self::Name(name.into())
    }
}

impl From<usize> for FieldKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<EntryKey> for FieldKey {
    fn from(key: EntryKey) -> Self {
        Self::Entry(key)
    }
}

impl fmt::Debug for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, ".{name}"),
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Entry(key) => write!(f, "{{{key}}}"),
            Self::Length => write!(f, ".length"),
        }
    }
}

/// Hashable identity of a map key.
///
/// Scalars key by value (floats by bit pattern); objects key by identity.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EntryKey {
    /// The nil key.
    Nil,
    /// A boolean key.
    Bool(bool),
    /// An integer key.
    Int(i64),
    /// A float key, stored as its bit pattern.
    Float(u64),
    /// A string key.
    String(Arc<str>),
    /// An object key, by identity.
    Object(ObjectId),
}

impl fmt::Debug for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Object(id) => write!(f, "{id}"),
        }
    }
}
