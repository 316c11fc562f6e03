//! Configuration for the observation engine.

use std::cell::RefCell;

/// Tunables for notifier bookkeeping and reaction scheduling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObserveConfig {
    /// Maximum number of rounds a scheduler flush may run before giving up.
    ///
    /// A round re-runs every pending reaction once; reactions that write to
    /// their own dependencies schedule another round.
    pub max_flush_rounds: usize,

    /// Number of notifier creations between registry sweeps of dead targets.
    pub sweep_interval: usize,

    /// Skip notification when a write stores a value identical to the old one.
    pub skip_unchanged_writes: bool,

    /// Suppress notifications for observable instance fields, both direct
    /// writes and changes relayed from the containers they hold.
    pub paused: bool,

    /// Make `Notifier::on_change` register deferred listeners, which run
    /// once per queue flush no matter how often their notifier fired.
    pub deferred_listeners: bool,
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self {
            max_flush_rounds: 100,
            sweep_interval: 1024,
            skip_unchanged_writes: true,
            paused: false,
            deferred_listeners: false,
        }
    }
}

thread_local! {
    static CURRENT: RefCell<ObserveConfig> = RefCell::new(ObserveConfig::default());
}

impl ObserveConfig {
    /// Creates a configuration for development: sweeps often so leaks of
    /// notifier entries show up early.
    #[must_use]
    pub fn development() -> Self {
        Self {
            sweep_interval: 64,
            ..Self::default()
        }
    }

    /// Creates a strict configuration: a low flush limit surfaces
    /// self-triggering reactions quickly.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            max_flush_rounds: 8,
            sweep_interval: 64,
            ..Self::default()
        }
    }

    /// Builder method to set the flush round limit.
    #[must_use]
    pub fn with_max_flush_rounds(mut self, rounds: usize) -> Self {
        self.max_flush_rounds = rounds;
        self
    }

    /// Builder method to set the registry sweep interval.
    #[must_use]
    pub fn with_sweep_interval(mut self, interval: usize) -> Self {
        self.sweep_interval = interval.max(1);
        self
    }

    /// Builder method to enable/disable unchanged-write skipping.
    #[must_use]
    pub fn with_skip_unchanged_writes(mut self, skip: bool) -> Self {
        self.skip_unchanged_writes = skip;
        self
    }

    /// Builder method to pause instance field notifications.
    #[must_use]
    pub fn with_paused(mut self, paused: bool) -> Self {
        self.paused = paused;
        self
    }

    /// Builder method to choose deferred listeners for `on_change`.
    #[must_use]
    pub fn with_deferred_listeners(mut self, deferred: bool) -> Self {
        self.deferred_listeners = deferred;
        self
    }

    /// Installs this configuration for the current thread.
    pub fn install(self) {
        CURRENT.with(|c| *c.borrow_mut() = self);
    }

    /// Returns the configuration installed on the current thread.
    #[must_use]
    pub fn current() -> Self {
        CURRENT.with(|c| c.borrow().clone())
    }

    /// Runs `f` with this configuration installed, then restores the
    /// previous one (also on unwind).
    pub fn scope<R>(self, f: impl FnOnce() -> R) -> R {
        struct Restore(Option<ObserveConfig>);

        impl Drop for Restore {
            fn drop(&mut self) {
                if let Some(previous) = self.0.take() {
                    previous.install();
                }
            }
        }

        let _restore = Restore(Some(CURRENT.with(|c| c.replace(self))));
        f()
    }
}
