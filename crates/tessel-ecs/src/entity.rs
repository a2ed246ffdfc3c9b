//! Entity handles.
//!
//! An [`EntityId`] names a registry slot and the generation of that slot at
//! the time the entity was registered. The registry bumps a slot's
//! generation whenever it frees the slot, so a handle that outlives its
//! entity stops resolving instead of picking up the slot's next occupant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A generational entity handle.
///
/// Ordering is by slot, then generation. It carries no meaning beyond being
/// a stable tie-break for sorted collections.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    /// A handle for slot `index` at `generation`.
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The registry slot this handle points at.
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// How many times the slot had been freed when this handle was issued.
    #[inline]
    pub fn generation(self) -> u32 {
        self.generation
    }

    /// The handle the same slot hands out after it is freed.
    pub(crate) fn successor(self) -> Self {
        Self {
            index: self.index,
            generation: self.generation.wrapping_add(1),
        }
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity#{}@{}", self.index, self.generation)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}
