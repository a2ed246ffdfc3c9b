//! The [`System`] trait and per-system membership lists.

use std::collections::HashSet;

use crate::component::{ComponentMask, ComponentSet};
use crate::entity::EntityId;
use crate::registry::{Entity, Registry};

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// A per-frame subsystem run by the [`Scheduler`](crate::scheduler::Scheduler).
///
/// A system never manages its own membership. The scheduler admits every
/// entity whose components cover [`component_mask`](System::component_mask)
/// and evicts it once they no longer do, then passes the current member list
/// to [`update`](System::update).
///
/// The provided `update` is a template: [`pre_process`](System::pre_process),
/// then [`process_entity`](System::process_entity) for every member, then
/// [`post_process`](System::post_process). Systems that need the whole member
/// list at once override `update` directly.
pub trait System<C: ComponentSet> {
    /// Unique name, used for diagnostics and lookups.
    fn name(&self) -> &str;

    /// Component kinds an entity must hold to be a member.
    fn component_mask(&self) -> ComponentMask;

    /// Whether an entity holding `held` qualifies for membership.
    fn qualifies(&self, held: ComponentMask) -> bool {
        self.component_mask().is_subset_of(held)
    }

    /// Run one frame over `members`, in admission order. `delta` is the
    /// sanitised frame time in seconds.
    fn update(&mut self, members: &[EntityId], registry: &mut Registry<C>, delta: f32) {
        self.pre_process(registry, delta);
        for &id in members {
            if let Some(entity) = registry.get_mut(id) {
                self.process_entity(entity, delta);
            }
        }
        self.post_process(registry, delta);
    }

    /// Called once per frame before any member is processed.
    fn pre_process(&mut self, _registry: &mut Registry<C>, _delta: f32) {}

    /// Called once per member per frame.
    fn process_entity(&mut self, _entity: &mut Entity<C>, _delta: f32) {}

    /// Called once per frame after every member is processed.
    fn post_process(&mut self, _registry: &mut Registry<C>, _delta: f32) {}
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// The members of one system, in admission order.
#[derive(Debug, Default, Clone)]
pub struct Membership {
    ordered: Vec<EntityId>,
    lookup: HashSet<EntityId>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if `id` was already a member.
    pub fn admit(&mut self, id: EntityId) -> bool {
        if !self.lookup.insert(id) {
            return false;
        }
        self.ordered.push(id);
        true
    }

    /// Returns `false` if `id` was not a member.
    pub fn evict(&mut self, id: EntityId) -> bool {
        if !self.lookup.remove(&id) {
            return false;
        }
        self.ordered.retain(|&e| e != id);
        true
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: EntityId) -> bool {
        self.lookup.contains(&id)
    }

    /// Drop every member for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(EntityId) -> bool) {
        let lookup = &mut self.lookup;
        self.ordered.retain(|&id| {
            let kept = keep(id);
            if !kept {
                lookup.remove(&id);
            }
            kept
        });
    }

    /// Members in admission order.
    pub fn as_slice(&self) -> &[EntityId] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn clear(&mut self) {
        self.ordered.clear();
        self.lookup.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
