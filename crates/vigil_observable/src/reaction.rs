//! Reactions: consumers that re-run when what they read changes.
//!
//! A [`Reaction`] owns a body and a [`Scheduler`]. Each [`run`] executes
//! the body inside a tracking context, then diffs the recorded dependencies
//! against the previous run: new notifiers are subscribed, notifiers that
//! were not read this time are released. When a subscribed notifier fires,
//! the reaction asks its scheduler for a re-run.
//!
//! [`run`]: Reaction::run

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use vigil_notify::{Disposable, Notifier, NotifierKey, registry};

use crate::scheduler::Scheduler;
use crate::tracking::{self, Dependencies};

/// Identity of a reaction, used to dedupe pending re-runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactionId(u64);

impl ReactionId {
    fn next() -> Self {
        thread_local! {
            static NEXT: Cell<u64> = const { Cell::new(0) };
        }
        NEXT.with(|next| {
            let id = next.get();
            next.set(id + 1);
            Self(id)
        })
    }
}

struct Subscription {
    notifier: Notifier,
    listener: Disposable,
}

struct ReactionInner {
    id: ReactionId,
    name: String,
    body: RefCell<Box<dyn FnMut()>>,
    scheduler: Rc<dyn Scheduler>,
    subscriptions: RefCell<IndexMap<NotifierKey, Subscription>>,
    running: Cell<bool>,
    disposed: Cell<bool>,
    run_count: Cell<u64>,
}

impl Drop for ReactionInner {
    fn drop(&mut self) {
        for (_, subscription) in self.subscriptions.get_mut().drain(..) {
            subscription.listener.dispose();
        }
    }
}

/// A tracked consumer. Cloning shares the same reaction.
#[derive(Clone)]
pub struct Reaction {
    inner: Rc<ReactionInner>,
}

/// Non-owning handle to a [`Reaction`].
#[derive(Clone)]
pub struct WeakReaction(Weak<ReactionInner>);

impl WeakReaction {
    /// Returns the reaction if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Reaction> {
        self.0.upgrade().map(|inner| Reaction { inner })
    }
}

/// Resets the running flag even if the body panics.
struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Reaction {
    /// Creates a reaction. The body does not run until [`run`](Self::run).
    pub fn new(
        name: impl Into<String>,
        scheduler: impl Scheduler + 'static,
        body: impl FnMut() + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(ReactionInner {
                id: ReactionId::next(),
                name: name.into(),
                body: RefCell::new(Box::new(body)),
                scheduler: Rc::new(scheduler),
                subscriptions: RefCell::new(IndexMap::new()),
                running: Cell::new(false),
                disposed: Cell::new(false),
                run_count: Cell::new(0),
            }),
        }
    }

    /// Returns the reaction's identity.
    #[must_use]
    pub fn id(&self) -> ReactionId {
        self.inner.id
    }

    /// Returns the reaction's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns a non-owning handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakReaction {
        WeakReaction(Rc::downgrade(&self.inner))
    }

    /// Runs the body now, tracking what it reads.
    ///
    /// Calling `run` from inside the reaction's own body schedules a re-run
    /// instead of recursing. Disposed reactions do nothing.
    pub fn run(&self) {
        let inner = &self.inner;
        if inner.disposed.get() {
            return;
        }
        if inner.running.get() {
            self.schedule();
            return;
        }

        let deps = {
            inner.running.set(true);
            let _guard = RunningGuard(&inner.running);
            let ((), deps) = tracking::track(|| {
                let mut body = inner.body.borrow_mut();
                (&mut **body)();
            });
            deps
        };
        inner.run_count.set(inner.run_count.get() + 1);
        tracing::debug!(reaction = %inner.name, run = inner.run_count.get(), "reaction ran");

        // The body may have disposed us.
        if !inner.disposed.get() {
            self.resubscribe(deps);
        }
    }

    /// Brings subscriptions in line with the latest dependency set.
    fn resubscribe(&self, deps: Dependencies) {
        let mut subscriptions = self.inner.subscriptions.borrow_mut();

        let stale: Vec<NotifierKey> = subscriptions
            .keys()
            .filter(|key| !deps.contains(*key))
            .cloned()
            .collect();
        for key in &stale {
            if let Some(subscription) = subscriptions.shift_remove(key) {
                subscription.listener.dispose();
            }
        }

        let mut added = 0usize;
        for key in deps {
            // A disposed notifier has been replaced in the registry.
            if subscriptions
                .get(&key)
                .is_some_and(|s| !s.notifier.is_disposed())
            {
                continue;
            }
            let notifier = registry::get_or_create(key.target, key.field.clone());
            let weak = self.downgrade();
            let listener = notifier.on_change_sync(move |_| {
                if let Some(reaction) = weak.upgrade() {
                    reaction.schedule();
                }
            });
            if let Some(old) = subscriptions.insert(key, Subscription { notifier, listener }) {
                old.listener.dispose();
            }
            added += 1;
        }

        if added > 0 || !stale.is_empty() {
            tracing::debug!(
                reaction = %self.inner.name,
                added,
                removed = stale.len(),
                total = subscriptions.len(),
                "dependencies changed"
            );
        }
    }

    /// Asks the scheduler for a re-run.
    pub fn schedule(&self) {
        if self.inner.disposed.get() {
            return;
        }
        self.inner.scheduler.schedule(self);
    }

    /// Stops the reaction and releases every subscription. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let drained: Vec<Subscription> = self
            .inner
            .subscriptions
            .borrow_mut()
            .drain(..)
            .map(|(_, s)| s)
            .collect();
        for subscription in drained {
            subscription.listener.dispose();
        }
    }

    /// Returns true once [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Number of notifiers currently subscribed.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.inner.subscriptions.borrow().len()
    }

    /// Returns true if the reaction is subscribed to `key`.
    #[must_use]
    pub fn is_subscribed(&self, key: &NotifierKey) -> bool {
        self.inner.subscriptions.borrow().contains_key(key)
    }

    /// Number of completed runs.
    #[must_use]
    pub fn run_count(&self) -> u64 {
        self.inner.run_count.get()
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("dependencies", &self.dependency_count())
            .field("runs", &self.run_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
