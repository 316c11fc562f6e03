//! Notifiers, the notifier registry, and disposables for Vigil.
//!
//! This crate provides:
//! - [`Notifier`] - A broadcast channel for one `(target, field)` pair
//! - [`NotifierKey`] - The identity of a notifier
//! - [`registry`] - Per-thread lookup of notifiers, created lazily
//! - [`deferred`] - The queue that runs deferred listeners, once per flush
//! - [`Disposable`] / [`DisposableCollection`] - Idempotent teardown handles

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod deferred;
pub mod disposable;
pub mod notifier;
pub mod registry;

pub use disposable::{Disposable, DisposableCollection};
pub use notifier::{Notifier, NotifierKey};
pub use registry::NotifierRegistry;
