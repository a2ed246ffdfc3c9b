//! Component kinds and masks.
//!
//! Components are not stored here. Each game declares its own component bag
//! (a struct of optional fields) and reports which kinds it currently holds
//! through [`ComponentSet`]. Systems declare the kinds they require as a
//! [`ComponentMask`], and membership is a plain bitset subset test.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

/// Value tag naming one kind of component.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentKind(u8);

impl ComponentKind {
    /// Largest usable kind index.
    pub const MAX_INDEX: u8 = 63;

    /// # Panics
    ///
    /// Panics if `index` exceeds [`ComponentKind::MAX_INDEX`].
    pub const fn new(index: u8) -> Self {
        assert!(index <= Self::MAX_INDEX, "component kind index must be at most 63");
        Self(index)
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    const fn bit(self) -> u64 {
        1u64 << self.0
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// ComponentMask
// ---------------------------------------------------------------------------

/// A set of [`ComponentKind`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ComponentMask(u64);

impl ComponentMask {
    pub const EMPTY: ComponentMask = ComponentMask(0);

    /// Mask holding exactly `kinds`.
    pub const fn of(kinds: &[ComponentKind]) -> Self {
        let mut bits = 0u64;
        let mut i = 0;
        while i < kinds.len() {
            bits |= kinds[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub const fn with(self, kind: ComponentKind) -> Self {
        Self(self.0 | kind.bit())
    }

    pub const fn without(self, kind: ComponentKind) -> Self {
        Self(self.0 & !kind.bit())
    }

    pub const fn contains(self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Whether every kind in `self` is also in `other`.
    pub const fn is_subset_of(self, other: ComponentMask) -> bool {
        self.0 & other.0 == self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Kinds in ascending index order.
    pub fn kinds(self) -> impl Iterator<Item = ComponentKind> {
        (0..=ComponentKind::MAX_INDEX)
            .map(ComponentKind)
            .filter(move |k| self.contains(*k))
    }
}

impl FromIterator<ComponentKind> for ComponentMask {
    fn from_iter<I: IntoIterator<Item = ComponentKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, ComponentMask::with)
    }
}

impl fmt::Debug for ComponentMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.kinds().map(|k| k.index()))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentSet
// ---------------------------------------------------------------------------

/// A per-entity component bag.
///
/// Implementors are usually a struct with one `Option` field per component
/// kind; the mask must have a bit set exactly for the fields that are `Some`.
pub trait ComponentSet {
    fn component_mask(&self) -> ComponentMask;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
