//! Integration tests for Layer 1: Notify
//!
//! Tests for notifiers, the per-thread registry, disposables, and deferred
//! listeners.

mod deferred;
mod disposables;
mod notifiers;
