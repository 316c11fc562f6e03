//! Re-invocation scheduling for reactions.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use vigil_foundation::{Error, ErrorContext, ObserveConfig, Result, SemanticLimit};

use crate::reaction::{Reaction, ReactionId, WeakReaction};

/// The re-invocation primitive a reaction uses when a dependency changes.
///
/// Implementations must tolerate the same reaction being scheduled many
/// times before it runs, and should run it at least once afterwards.
pub trait Scheduler {
    /// Requests a future [`Reaction::run`].
    fn schedule(&self, reaction: &Reaction);
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
    fn schedule(&self, reaction: &Reaction) {
        (**self).schedule(reaction);
    }
}

#[derive(Default)]
struct BatchState {
    pending: RefCell<IndexMap<ReactionId, WeakReaction>>,
    depth: Cell<usize>,
    flushing: Cell<bool>,
    max_rounds: Cell<Option<usize>>,
}

/// Collects scheduled reactions and runs each once per flush round.
///
/// Scheduling only records the reaction; nothing runs until [`flush`] is
/// called or the outermost [`batch`] returns. The pending set is keyed by
/// reaction identity, so any number of fires between two flushes coalesce
/// into one run. Cloning shares the same queue.
///
/// [`flush`]: BatchScheduler::flush
/// [`batch`]: BatchScheduler::batch
#[derive(Clone, Default)]
pub struct BatchScheduler {
    state: Rc<BatchState>,
}

struct DepthGuard<'a>(&'a Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

struct FlushGuard<'a>(&'a Cell<bool>);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl BatchScheduler {
    /// Creates an empty scheduler using the thread's [`ObserveConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the configured flush round limit for this scheduler.
    #[must_use]
    pub fn with_max_flush_rounds(self, rounds: usize) -> Self {
        self.state.max_rounds.set(Some(rounds));
        self
    }

    /// Number of reactions waiting to run.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.state.pending.borrow().len()
    }

    /// Returns true if `reaction` is waiting to run.
    #[must_use]
    pub fn is_pending(&self, reaction: &Reaction) -> bool {
        self.state.pending.borrow().contains_key(&reaction.id())
    }

    /// Runs pending reactions until none remain. Returns the number of
    /// rounds executed.
    ///
    /// Reactions scheduled while a round runs go into the next round. A
    /// flush requested from inside a running flush returns `Ok(0)` and
    /// leaves the work to the outer one.
    ///
    /// # Errors
    ///
    /// Returns [`SemanticLimit::MaxFlushRounds`] if reactions keep
    /// rescheduling each other past the round limit. The remaining pending
    /// reactions are dropped.
    pub fn flush(&self) -> Result<usize> {
        let state = &self.state;
        if state.flushing.replace(true) {
            return Ok(0);
        }
        let _guard = FlushGuard(&state.flushing);
        let limit = state
            .max_rounds
            .get()
            .unwrap_or_else(|| ObserveConfig::current().max_flush_rounds);

        let mut rounds = 0;
        loop {
            let round: Vec<Reaction> = state
                .pending
                .borrow_mut()
                .drain(..)
                .filter_map(|(_, weak)| weak.upgrade())
                .collect();
            if round.is_empty() {
                return Ok(rounds);
            }
            if rounds == limit {
                let culprit = round.first().map(|r| r.name().to_string());
                tracing::warn!(
                    limit,
                    reaction = culprit.as_deref().unwrap_or("<unknown>"),
                    "flush round limit exceeded"
                );
                let mut context = ErrorContext::new().with_operation("flush");
                if let Some(name) = &culprit {
                    context = context.with_frame(name.clone());
                }
                return Err(Error::limit_exceeded(SemanticLimit::MaxFlushRounds {
                    limit,
                    reaction: culprit,
                })
                .with_context(context));
            }
            rounds += 1;
            for reaction in round {
                reaction.run();
            }
        }
    }

    /// Runs `f`, deferring every flush until the outermost batch exits.
    ///
    /// # Errors
    ///
    /// Returns the error of the final [`flush`](Self::flush).
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> Result<R> {
        let depth = &self.state.depth;
        depth.set(depth.get() + 1);
        let result = {
            let _guard = DepthGuard(depth);
            f()
        };
        if depth.get() == 0 {
            self.flush()?;
        }
        Ok(result)
    }

    /// Returns true while inside [`batch`](Self::batch).
    #[must_use]
    pub fn in_batch(&self) -> bool {
        self.state.depth.get() > 0
    }
}

impl Scheduler for BatchScheduler {
    fn schedule(&self, reaction: &Reaction) {
        self.state
            .pending
            .borrow_mut()
            .entry(reaction.id())
            .or_insert_with(|| reaction.downgrade());
    }
}
