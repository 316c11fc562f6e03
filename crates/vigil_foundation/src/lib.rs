//! Object identities, field keys, errors, and configuration for Vigil.
//!
//! This crate provides:
//! - [`ObjectId`] - Generational identifiers for heap objects
//! - [`IdAllocator`] - Generational id allocation with stale detection
//! - [`FieldKey`] - The field half of a `(target, field)` notifier identity
//! - [`ValueKind`] - Kind descriptors used in diagnostics
//! - [`Error`] - Rich error types with context
//! - [`ObserveConfig`] - Tunables for the observation engine

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod allocator;
pub mod config;
pub mod error;
pub mod id;
pub mod key;
pub mod kind;

pub use allocator::{IdAllocator, ids};
pub use config::ObserveConfig;
pub use error::{Error, ErrorContext, ErrorKind, Result, SemanticLimit};
pub use id::ObjectId;
pub use key::{EntryKey, FieldKey};
pub use kind::ValueKind;
