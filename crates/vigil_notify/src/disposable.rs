//! Idempotent teardown handles.

use std::cell::RefCell;
use std::fmt;

/// A handle that runs its teardown action at most once.
///
/// Returned by [`Notifier::on_change`](crate::Notifier::on_change) and by
/// every helper that registers a listener. Dropping a `Disposable` does not
/// dispose it; call [`dispose`](Self::dispose) explicitly.
#[must_use = "a listener stays registered until its disposable is disposed"]
pub struct Disposable {
    action: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Disposable {
    /// Creates a disposable that runs `action` on first dispose.
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            action: RefCell::new(Some(Box::new(action))),
        }
    }

    /// Creates a disposable with nothing to tear down.
    pub fn noop() -> Self {
        Self {
            action: RefCell::new(None),
        }
    }

    /// Runs the teardown action. Later calls are no-ops.
    pub fn dispose(&self) {
        // Take before running so a re-entrant dispose from inside the action
        // finds nothing left to do.
        let action = self.action.borrow_mut().take();
        if let Some(action) = action {
            action();
        }
    }

    /// Returns true once the teardown action has run (or if there was none).
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.action.borrow().is_none()
    }
}

impl fmt::Debug for Disposable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposable")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A group of disposables torn down together.
#[derive(Debug, Default)]
pub struct DisposableCollection {
    items: RefCell<Vec<Disposable>>,
}

impl DisposableCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a disposable to the collection.
    pub fn push(&self, disposable: Disposable) {
        self.items.borrow_mut().push(disposable);
    }

    /// Disposes every member, in insertion order, and empties the collection.
    pub fn dispose(&self) {
        let items = std::mem::take(&mut *self.items.borrow_mut());
        for item in &items {
            item.dispose();
        }
    }

    /// Returns the number of members not yet disposed through the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Returns true if the collection holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}
