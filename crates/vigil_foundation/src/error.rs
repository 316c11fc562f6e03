//! Error types for the Vigil system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Reads never fail; every error here comes from a write, a lookup that
//! demands an observable value, or a scheduling limit.

use std::fmt;

use thiserror::Error;

use crate::id::ObjectId;
use crate::kind::ValueKind;

/// The main error type for Vigil operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

/// Result alias used throughout Vigil.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates a "value is not observable" error.
    #[must_use]
    pub fn not_observable(kind: ValueKind) -> Self {
        Self::new(ErrorKind::NotObservable(kind))
    }

    /// Creates a write-to-frozen-object error.
    #[must_use]
    pub fn frozen(id: ObjectId) -> Self {
        Self::new(ErrorKind::Frozen(id))
    }

    /// Creates a kind mismatch error.
    #[must_use]
    pub fn kind_mismatch(expected: ValueKind, actual: ValueKind) -> Self {
        Self::new(ErrorKind::KindMismatch { expected, actual })
    }

    /// Creates an index out of bounds error.
    #[must_use]
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        Self::new(ErrorKind::IndexOutOfBounds { index, length })
    }

    /// Creates an object not found error.
    #[must_use]
    pub fn object_not_found(id: ObjectId) -> Self {
        Self::new(ErrorKind::ObjectNotFound(id))
    }

    /// Creates a stale object reference error.
    #[must_use]
    pub fn stale_object(id: ObjectId) -> Self {
        Self::new(ErrorKind::StaleObject(id))
    }

    /// Creates a semantic limit exceeded error.
    #[must_use]
    pub fn limit_exceeded(limit: SemanticLimit) -> Self {
        Self::new(ErrorKind::LimitExceeded(limit))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A notifier was requested for a value that is not a tracking wrapper.
    #[error("value is not observable: {0}")]
    NotObservable(ValueKind),

    /// A write targeted a frozen object.
    #[error("cannot mutate frozen object {0}")]
    Frozen(ObjectId),

    /// The operation does not apply to this kind of container.
    #[error("kind mismatch: expected {expected}, got {actual}")]
    KindMismatch {
        /// The expected kind.
        expected: ValueKind,
        /// The actual kind encountered.
        actual: ValueKind,
    },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds {
        /// The index that was accessed.
        index: usize,
        /// The actual length of the sequence.
        length: usize,
    },

    /// Object id was never allocated or has been released.
    #[error("object not found: {0:?}")]
    ObjectNotFound(ObjectId),

    /// Object id is stale (generation mismatch).
    #[error("stale object reference: {0:?}")]
    StaleObject(ObjectId),

    /// Semantic limit exceeded (kill switch triggered).
    #[error("limit exceeded: {0}")]
    LimitExceeded(SemanticLimit),
}

/// Semantic limits (kill switches) that can be exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticLimit {
    /// A scheduler flush kept producing new work past its round limit.
    MaxFlushRounds {
        /// The configured limit.
        limit: usize,
        /// The reaction that was still pending, if known.
        reaction: Option<String>,
    },
}

impl fmt::Display for SemanticLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MaxFlushRounds { limit, reaction } => {
                write!(f, "max flush rounds ({limit}) exceeded")?;
                if let Some(name) = reaction {
                    write!(f, ": reaction {name} keeps rescheduling itself")?;
                }
                Ok(())
            }
        }
    }
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that failed (e.g. `set`, `flush`).
    pub operation: Option<String>,
    /// Chain of reactions or fields involved, outermost first.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the failing operation.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(op) = &self.operation {
            write!(f, "during {op}")?;
        }
        if !self.stack.is_empty() {
            writeln!(f)?;
            for frame in &self.stack {
                writeln!(f, "  in {frame}")?;
            }
        }
        Ok(())
    }
}
