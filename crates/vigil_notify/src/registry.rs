//! Identity-keyed lookup of notifiers.
//!
//! The registry maps a [`NotifierKey`] to its shared [`Notifier`], creating
//! notifiers lazily on first request. It knows targets only by [`ObjectId`],
//! so it never keeps a target alive; entries whose target has been dropped
//! are swept periodically (every [`ObserveConfig::sweep_interval`] creations)
//! or on demand via [`sweep`].
//!
//! The free functions operate on the calling thread's registry.

use std::cell::RefCell;
use std::collections::HashMap;

use vigil_foundation::{FieldKey, ObjectId, ObserveConfig, ids};

use crate::notifier::{Notifier, NotifierKey};

/// Maps notifier keys to their shared notifiers.
#[derive(Debug, Default)]
pub struct NotifierRegistry {
    notifiers: HashMap<NotifierKey, Notifier>,
    created_since_sweep: usize,
}

impl NotifierRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the notifier for `key`, creating it on first request.
    ///
    /// A notifier that has been disposed is replaced by a fresh one.
    pub fn get_or_create(&mut self, key: NotifierKey, sweep_interval: usize) -> Notifier {
        if let Some(existing) = self.notifiers.get(&key) {
            if !existing.is_disposed() {
                return existing.clone();
            }
        }

        self.created_since_sweep += 1;
        if self.created_since_sweep >= sweep_interval.max(1) {
            self.sweep_with(ids::is_live);
        }

        let notifier = Notifier::new(key.clone());
        self.notifiers.insert(key, notifier.clone());
        notifier
    }

    /// Returns the notifier for `key` without creating one.
    #[must_use]
    pub fn find(&self, key: &NotifierKey) -> Option<Notifier> {
        self.notifiers
            .get(key)
            .filter(|n| !n.is_disposed())
            .cloned()
    }

    /// Drops (and disposes) every notifier whose target fails `is_live`,
    /// along with any notifier disposed by its owner.
    /// Returns the number of entries removed.
    pub fn sweep_with(&mut self, is_live: impl Fn(ObjectId) -> bool) -> usize {
        let before = self.notifiers.len();
        self.notifiers.retain(|key, notifier| {
            let keep = !notifier.is_disposed() && is_live(key.target);
            if !keep {
                notifier.dispose();
            }
            keep
        });
        self.created_since_sweep = 0;
        let removed = before - self.notifiers.len();
        if removed > 0 {
            tracing::debug!(removed, remaining = self.notifiers.len(), "notifier registry sweep");
        }
        removed
    }

    /// Returns the number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Returns true if no notifiers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

thread_local! {
    static REGISTRY: RefCell<NotifierRegistry> = RefCell::new(NotifierRegistry::new());
}

/// Returns the shared notifier for `(target, field)`, creating it on first call.
#[must_use]
pub fn get_or_create(target: ObjectId, field: Option<FieldKey>) -> Notifier {
    let sweep_interval = ObserveConfig::current().sweep_interval;
    REGISTRY.with(|r| {
        r.borrow_mut()
            .get_or_create(NotifierKey::new(target, field), sweep_interval)
    })
}

/// Returns the notifier for `(target, field)` if tracking has created one.
#[must_use]
pub fn find(target: ObjectId, field: Option<FieldKey>) -> Option<Notifier> {
    find_key(&NotifierKey::new(target, field))
}

/// Returns the notifier for `key` if one exists.
#[must_use]
pub fn find_key(key: &NotifierKey) -> Option<Notifier> {
    REGISTRY.with(|r| r.borrow().find(key))
}

/// Fires the notifier for `(target, field)` if one exists.
///
/// Never allocates a notifier. Returns true if a notifier fired.
pub fn notify(target: ObjectId, field: Option<FieldKey>) -> bool {
    // Release the registry borrow before running listeners; they may
    // look up or create notifiers themselves.
    match find(target, field) {
        Some(notifier) => {
            notifier.fire();
            true
        }
        None => false,
    }
}

/// Removes notifiers whose targets are no longer alive.
pub fn sweep() -> usize {
    REGISTRY.with(|r| r.borrow_mut().sweep_with(ids::is_live))
}

/// Returns the number of notifiers registered on this thread.
#[must_use]
pub fn len() -> usize {
    REGISTRY.with(|r| r.borrow().len())
}
