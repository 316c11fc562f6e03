//! Object id allocation with generational indices.
//!
//! The `IdAllocator` hands out identities for heap objects and tracks
//! generations so that registries keyed by [`ObjectId`] can tell a live
//! target from one that has been dropped (and whose slot may be reused).

// Allow u64 to usize casts - we target 64-bit systems
#![allow(clippy::cast_possible_truncation)]

use crate::error::{Error, Result};
use crate::id::ObjectId;

/// Manages object id lifecycle and generation tracking.
///
/// Ids are allocated from a free list when available, otherwise new
/// indices are allocated. When an id is released, its index is added to
/// the free list and its generation is incremented.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    /// Generation counter for each index.
    /// Even generations are free, odd generations are live.
    generations: Vec<u32>,
    /// Free list of indices available for reuse.
    free_list: Vec<u64>,
    /// Count of live ids.
    live_count: usize,
}

impl IdAllocator {
    /// Creates a new empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh id.
    ///
    /// Reuses indices from the free list when available.
    pub fn allocate(&mut self) -> ObjectId {
        self.live_count += 1;

        if let Some(index) = self.free_list.pop() {
            let idx = index as usize;
            // Was even/free, now odd/live
            self.generations[idx] += 1;
            ObjectId::new(index, self.generations[idx])
        } else {
            let index = self.generations.len() as u64;
            // New ids start at generation 1 (odd = live)
            self.generations.push(1);
            ObjectId::new(index, 1)
        }
    }

    /// Releases an id.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is stale or was already released.
    pub fn release(&mut self, id: ObjectId) -> Result<()> {
        self.validate(id)?;

        let idx = id.index as usize;
        // Was odd/live, now even/free
        self.generations[idx] += 1;
        self.free_list.push(id.index);
        self.live_count -= 1;

        Ok(())
    }

    /// Checks if an id is live and not stale.
    #[must_use]
    pub fn exists(&self, id: ObjectId) -> bool {
        let idx = id.index as usize;
        if idx >= self.generations.len() {
            return false;
        }
        self.generations[idx] == id.generation && id.generation % 2 == 1
    }

    /// Validates that an id is live.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is stale or never existed.
    pub fn validate(&self, id: ObjectId) -> Result<()> {
        let idx = id.index as usize;

        if idx >= self.generations.len() {
            return Err(Error::object_not_found(id));
        }

        let current_gen = self.generations[idx];

        if current_gen != id.generation {
            // Generation mismatch - the slot was released and possibly reused
            return Err(Error::stale_object(id));
        }

        if current_gen % 2 == 0 {
            return Err(Error::object_not_found(id));
        }

        Ok(())
    }

    /// Returns the number of live ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Returns true if there are no live ids.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }
}

/// The per-thread allocator shared by every heap object on this thread.
pub mod ids {
    use std::cell::RefCell;

    use super::IdAllocator;
    use crate::id::ObjectId;

    thread_local! {
        static ALLOCATOR: RefCell<IdAllocator> = RefCell::new(IdAllocator::new());
    }

    /// Allocates an id from the thread's allocator.
    #[must_use]
    pub fn allocate() -> ObjectId {
        ALLOCATOR.with(|a| a.borrow_mut().allocate())
    }

    /// Releases an id back to the thread's allocator.
    ///
    /// Called from object destructors, so it tolerates the allocator having
    /// already been torn down at thread exit.
    pub fn release(id: ObjectId) {
        let released = ALLOCATOR.try_with(|a| a.borrow_mut().release(id));
        if let Ok(Err(err)) = released {
            tracing::warn!(%id, %err, "object id released twice");
        }
    }

    /// Returns true if the id still belongs to a live object.
    #[must_use]
    pub fn is_live(id: ObjectId) -> bool {
        ALLOCATOR
            .try_with(|a| a.borrow().exists(id))
            .unwrap_or(false)
    }

    /// Returns the number of live objects on this thread.
    #[must_use]
    pub fn live_count() -> usize {
        ALLOCATOR.with(|a| a.borrow().len())
    }
}
