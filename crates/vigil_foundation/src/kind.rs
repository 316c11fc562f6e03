//! Kind descriptors for diagnostics.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The kind of a value, used to describe what an operation expected or got.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ValueKind {
    /// The nil value (null or undefined).
    Nil,
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// String.
    String,
    /// Ordered sequence container.
    Sequence,
    /// Keyed map container.
    Map,
    /// Plain record with named fields.
    Record,
    /// Class instance.
    Instance,
    /// Tracking wrapper over another container.
    Tracked,
}

impl ValueKind {
    /// Returns true for kinds that are heap containers.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(
            self,
            Self::Sequence | Self::Map | Self::Record | Self::Instance
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Map => "map",
            Self::Record => "record",
            Self::Instance => "instance",
            Self::Tracked => "tracked",
        };
        write!(f, "{name}")
    }
}
