//! Vigil - Fine-grained reactive observation engine
//!
//! This crate re-exports all layers of the Vigil system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: vigil_observable  — Values, classes, marking, tracking wrappers,
//!                              reactions, batch scheduling
//! Layer 1: vigil_notify      — Notifiers, notifier registry, disposables
//! Layer 0: vigil_foundation  — Core types (ObjectId, FieldKey, Error, config)
//! ```

pub use vigil_foundation as foundation;
pub use vigil_notify as notify;
pub use vigil_observable as observable;
