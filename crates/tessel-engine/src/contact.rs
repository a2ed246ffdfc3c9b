//! Fixture contacts and the listener that receives their lifecycle events.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use tessel_ecs::entity::EntityId;
use tessel_ecs::registry::Registry;

use crate::fixture::{FixtureKind, FixtureRef};

/// An unordered pair of overlapping fixtures.
///
/// `Contact::new(a, b) == Contact::new(b, a)`. Hashing and ordering use the
/// same normalised pair, so either construction finds the same set entry.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    first: FixtureRef,
    second: FixtureRef,
}

impl Contact {
    /// A contact between two fixtures, in either order.
    pub fn new(first: FixtureRef, second: FixtureRef) -> Self {
        Self { first, second }
    }

    /// The fixture given first at construction.
    pub fn first(&self) -> FixtureRef {
        self.first
    }

    /// The fixture given second at construction.
    pub fn second(&self) -> FixtureRef {
        self.second
    }

    /// The pair with the lower [`FixtureRef`] first.
    fn key(&self) -> (FixtureRef, FixtureRef) {
        if self.first <= self.second {
            (self.first, self.second)
        } else {
            (self.second, self.first)
        }
    }

    /// If the contact joins a `kind_a` fixture with a `kind_b` fixture in
    /// either order, return them as `(kind_a, kind_b)`.
    pub fn accept_mask(
        &self,
        kind_a: FixtureKind,
        kind_b: FixtureKind,
    ) -> Option<(FixtureRef, FixtureRef)> {
        if self.first.kind == kind_a && self.second.kind == kind_b {
            Some((self.first, self.second))
        } else if self.second.kind == kind_a && self.first.kind == kind_b {
            Some((self.second, self.first))
        } else {
            None
        }
    }

    /// Whether either fixture is of `kind`.
    pub fn involves(&self, kind: FixtureKind) -> bool {
        self.first.kind == kind || self.second.kind == kind
    }

    /// Whether either fixture belongs to `entity`.
    pub fn involves_entity(&self, entity: EntityId) -> bool {
        self.first.entity == entity || self.second.entity == entity
    }

    /// The partner of `fixture`, or `None` if it is not part of this contact.
    pub fn other(&self, fixture: &FixtureRef) -> Option<FixtureRef> {
        if *fixture == self.first {
            Some(self.second)
        } else if *fixture == self.second {
            Some(self.first)
        } else {
            None
        }
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for Contact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Contact {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// Receives contact lifecycle events from the world system.
///
/// `begin_contact` fires once when two fixtures start overlapping,
/// `continue_contact` once per frame while they stay overlapping, and
/// `end_contact` once when they stop. Callbacks may mutate any entity in
/// the registry, including marking it dead.
pub trait ContactListener<C> {
    fn begin_contact(&mut self, contact: &Contact, registry: &mut Registry<C>, delta: f32);

    fn continue_contact(&mut self, contact: &Contact, registry: &mut Registry<C>, delta: f32);

    fn end_contact(&mut self, contact: &Contact, registry: &mut Registry<C>, delta: f32);
}

/// A listener that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl<C> ContactListener<C> for NoopListener {
    fn begin_contact(&mut self, _: &Contact, _: &mut Registry<C>, _: f32) {}

    fn continue_contact(&mut self, _: &Contact, _: &mut Registry<C>, _: f32) {}

    fn end_contact(&mut self, _: &Contact, _: &mut Registry<C>, _: f32) {}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
