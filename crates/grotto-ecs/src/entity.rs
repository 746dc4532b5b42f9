//! Entity identifiers and allocation.
//!
//! An [`EntityId`] is a plain 32-bit index handed out by a monotonically
//! increasing counter. Entities in a dungeon are never destroyed (dead actors
//! stay behind as corpses, picked-up items move into an inventory), so an
//! index is never recycled and no generation tag is needed.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A unique, never-reused entity identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Construct an `EntityId` from its raw index.
    #[inline]
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// The raw index.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Hands out [`EntityId`]s in increasing order, starting at zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAllocator {
    next: u32,
}

impl EntityAllocator {
    /// Create a new allocator whose first id is `0`.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate a fresh [`EntityId`].
    ///
    /// # Panics
    ///
    /// Panics if all `u32::MAX` identifiers have been handed out.
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self
            .next
            .checked_add(1)
            .expect("entity id space exhausted");
        id
    }

    /// The id the next call to [`allocate`](Self::allocate) will return.
    pub fn peek_next(&self) -> EntityId {
        EntityId(self.next)
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u32 {
        self.next
    }

    /// Returns `true` if `id` has been handed out by this allocator.
    pub fn was_allocated(&self, id: EntityId) -> bool {
        id.0 < self.next
    }

    /// Rebuild an allocator that continues after `next - 1`.
    pub fn resume_from(next: u32) -> Self {
        Self { next }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
