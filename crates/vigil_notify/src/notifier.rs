//! Broadcast channels for `(target, field)` pairs.
//!
//! # Invariants
//!
//! 1. `fire()` invokes a snapshot of the listener list taken when the fire
//!    starts. Listeners added during a fire are first invoked by the next
//!    fire, so a listener that writes the field it listens to cannot loop.
//! 2. A listener disposed during a fire is not invoked for the remainder of
//!    that fire.
//! 3. Disposing a notifier, or a listener's [`Disposable`], twice is a no-op.
//! 4. A notifier never holds a strong reference to its target; it knows the
//!    target only by [`ObjectId`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use vigil_foundation::{FieldKey, ObjectId, ObserveConfig};

use crate::deferred::{self, Deferred};
use crate::disposable::Disposable;

/// Identity of a notifier: a target and, optionally, one of its fields.
///
/// `field == None` designates the notifier for the target as a whole, which
/// fires once per change event on that target.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotifierKey {
    /// The object whose changes this notifier reports.
    pub target: ObjectId,
    /// The field, or `None` for the whole container.
    pub field: Option<FieldKey>,
}

impl NotifierKey {
    /// Creates a key for `(target, field)`.
    #[must_use]
    pub fn new(target: ObjectId, field: Option<FieldKey>) -> Self {
        Self { target, field }
    }

    /// Creates a key for the whole-container notifier of `target`.
    #[must_use]
    pub fn container(target: ObjectId) -> Self {
        Self {
            target,
            field: None,
        }
    }

    /// Creates a key for one field of `target`.
    #[must_use]
    pub fn field(target: ObjectId, field: impl Into<FieldKey>) -> Self {
        Self {
            target,
            field: Some(field.into()),
        }
    }
}

impl fmt::Debug for NotifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}{field}", self.target),
            None => write!(f, "{}", self.target),
        }
    }
}

type Callback = Rc<dyn Fn(&NotifierKey)>;

#[derive(Clone)]
struct Listener {
    id: u64,
    active: Rc<Cell<bool>>,
    callback: Callback,
}

struct NotifierInner {
    key: NotifierKey,
    // im::Vector so the fire-time snapshot is an O(1) clone.
    listeners: RefCell<im::Vector<Listener>>,
    next_listener: Cell<u64>,
    fire_count: Cell<u64>,
    disposed: Cell<bool>,
}

/// A broadcast channel for one `(target, field)` pair.
///
/// Cloning a `Notifier` creates a new handle to the **same** channel.
#[derive(Clone)]
pub struct Notifier {
    inner: Rc<NotifierInner>,
}

impl Notifier {
    /// Creates a detached notifier.
    ///
    /// Most callers want [`registry::get_or_create`](crate::registry::get_or_create),
    /// which returns the shared notifier for a key.
    #[must_use]
    pub fn new(key: NotifierKey) -> Self {
        Self {
            inner: Rc::new(NotifierInner {
                key,
                listeners: RefCell::new(im::Vector::new()),
                next_listener: Cell::new(0),
                fire_count: Cell::new(0),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Returns the identity of this notifier.
    #[must_use]
    pub fn key(&self) -> &NotifierKey {
        &self.inner.key
    }

    /// Registers a listener, invoked on every subsequent fire.
    ///
    /// With [`ObserveConfig::deferred_listeners`] set this registers a
    /// deferred listener instead; see [`on_change_deferred`].
    ///
    /// Registering on a disposed notifier returns an already-disposed handle
    /// and the listener is never invoked.
    ///
    /// [`on_change_deferred`]: Self::on_change_deferred
    pub fn on_change(&self, listener: impl Fn(&NotifierKey) + 'static) -> Disposable {
        if ObserveConfig::current().deferred_listeners {
            self.on_change_deferred(listener)
        } else {
            self.on_change_sync(listener)
        }
    }

    /// Registers a listener invoked synchronously on every subsequent fire.
    pub fn on_change_sync(&self, listener: impl Fn(&NotifierKey) + 'static) -> Disposable {
        self.register(Rc::new(listener), Rc::new(Cell::new(true)))
    }

    /// Registers a listener that runs from [`deferred::flush`] instead of
    /// during the fire. Any number of fires before the next flush queue it
    /// once.
    pub fn on_change_deferred(&self, listener: impl Fn(&NotifierKey) + 'static) -> Disposable {
        let active = Rc::new(Cell::new(true));
        let entry = Rc::new(Deferred::new(Rc::clone(&active), listener));
        self.register(Rc::new(move |key: &NotifierKey| deferred::enqueue(&entry, key)), active)
    }

    /// Registers a listener for the next fire only.
    ///
    /// The listener unregisters itself before it runs. Disposing the
    /// returned handle first cancels it.
    pub fn once(&self, listener: impl FnOnce(&NotifierKey) + 'static) -> Disposable {
        let listener = RefCell::new(Some(listener));
        let slot: Rc<RefCell<Option<Disposable>>> = Rc::default();
        let own = Rc::clone(&slot);
        let subscription = self.on_change(move |key| {
            let Some(listener) = listener.borrow_mut().take() else {
                return;
            };
            if let Some(subscription) = own.borrow_mut().take() {
                subscription.dispose();
            }
            listener(key);
        });
        *slot.borrow_mut() = Some(subscription);
        Disposable::new(move || {
            if let Some(subscription) = slot.borrow_mut().take() {
                subscription.dispose();
            }
        })
    }

    fn register(&self, callback: Callback, active: Rc<Cell<bool>>) -> Disposable {
        if self.inner.disposed.get() {
            return Disposable::noop();
        }

        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner.listeners.borrow_mut().push_back(Listener {
            id,
            active: Rc::clone(&active),
            callback,
        });

        let weak: Weak<NotifierInner> = Rc::downgrade(&self.inner);
        Disposable::new(move || {
            active.set(false);
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|l| l.id != id);
            }
        })
    }

    /// Invokes every listener registered when the fire starts.
    pub fn fire(&self) {
        if self.inner.disposed.get() {
            return;
        }
        self.inner.fire_count.set(self.inner.fire_count.get() + 1);

        let snapshot = self.inner.listeners.borrow().clone();
        tracing::trace!(key = ?self.inner.key, listeners = snapshot.len(), "notifier fire");
        for listener in &snapshot {
            if listener.active.get() {
                (listener.callback)(&self.inner.key);
            }
        }
    }

    /// Removes every listener. Later fires are no-ops.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let listeners = std::mem::take(&mut *self.inner.listeners.borrow_mut());
        for listener in &listeners {
            listener.active.set(false);
        }
    }

    /// Returns true once [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Returns the number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Returns how many times this notifier has fired.
    #[must_use]
    pub fn fire_count(&self) -> u64 {
        self.inner.fire_count.get()
    }

    /// Returns true if both handles refer to the same channel.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("key", &self.inner.key)
            .field("listeners", &self.listener_count())
            .field("fire_count", &self.fire_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
