//! The entity registry: every registered [`Entity`] keyed by its
//! [`EntityId`], kept in registration order.

use std::collections::VecDeque;

use crate::component::{ComponentMask, ComponentSet};
use crate::entity::EntityId;
use crate::EcsError;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// An identity, its component bag, and a liveness flag.
///
/// Gameplay marks an entity dead with [`Entity::die`]; the scheduler removes
/// it from every system and from the registry at its next membership pass.
#[derive(Debug)]
pub struct Entity<C> {
    id: EntityId,
    dead: bool,
    components: C,
}

impl<C> Entity<C> {
    /// The handle this entity is registered under.
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Whether the entity is waiting to be destroyed.
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Mark the entity for destruction at the next membership pass. There is
    /// no way back.
    pub fn die(&mut self) {
        self.dead = true;
    }

    /// The component bag.
    pub fn components(&self) -> &C {
        &self.components
    }

    /// Mutable access to the component bag.
    pub fn components_mut(&mut self) -> &mut C {
        &mut self.components
    }

    pub fn into_components(self) -> C {
        self.components
    }
}

impl<C: ComponentSet> Entity<C> {
    /// Component kinds the bag currently holds.
    pub fn component_mask(&self) -> ComponentMask {
        self.components.component_mask()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owns every registered entity.
///
/// Entities live in slots indexed by [`EntityId::index`]. A freed slot is
/// queued together with the handle it will issue next, and queued slots are
/// reused oldest first. A lookup with a stale handle finds either an empty
/// slot or an entity of a later generation and returns `None`.
///
/// Removal is reserved to the [`Scheduler`](crate::scheduler::Scheduler),
/// which keeps system membership in step with it. Gameplay code retires an
/// entity with [`Registry::kill`].
#[derive(Debug)]
pub struct Registry<C> {
    slots: Vec<Option<Entity<C>>>,
    /// Freed slots, oldest first, as the handle each will issue next.
    vacant: VecDeque<EntityId>,
    /// Live ids in registration order.
    order: Vec<EntityId>,
}

impl<C> Registry<C> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            vacant: VecDeque::new(),
            order: Vec::new(),
        }
    }

    /// Register a new entity holding `components`.
    pub fn insert(&mut self, components: C) -> EntityId {
        let id = match self.vacant.pop_front() {
            Some(id) => id,
            None => {
                self.slots.push(None);
                EntityId::new((self.slots.len() - 1) as u32, 0)
            }
        };
        self.slots[id.index() as usize] = Some(Entity {
            id,
            dead: false,
            components,
        });
        self.order.push(id);
        id
    }

    /// The entity `id` names, or `None` if the handle is stale.
    pub fn get(&self, id: EntityId) -> Option<&Entity<C>> {
        self.slots
            .get(id.index() as usize)
            .and_then(Option::as_ref)
            .filter(|e| e.id == id)
    }

    /// Mutable access to the entity `id` names, or `None` if the handle is
    /// stale.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity<C>> {
        self.slots
            .get_mut(id.index() as usize)
            .and_then(Option::as_mut)
            .filter(|e| e.id == id)
    }

    /// Whether `id` names a registered entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Mark `id` dead. It stays registered until the next membership pass.
    pub fn kill(&mut self, id: EntityId) -> Result<(), EcsError> {
        let entity = self
            .get_mut(id)
            .ok_or(EcsError::StaleEntity { entity: id })?;
        entity.die();
        Ok(())
    }

    /// Unregister `id` immediately and hand back its entity.
    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity<C>> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if !slot.as_ref().is_some_and(|e| e.id == id) {
            return None;
        }
        let entity = slot.take();
        self.vacant.push_back(id.successor());
        self.order.retain(|&e| e != id);
        entity
    }

    /// Live ids in registration order.
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    /// Entities in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity<C>> + '_ {
        self.order.iter().filter_map(move |&id| self.get(id))
    }

    /// Entities in slot order (not registration order).
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity<C>> + '_ {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// Mutable references to the entities named by `ids`, in the order given.
    ///
    /// Stale ids and repeated ids are skipped, so the returned references are
    /// always disjoint.
    pub fn get_disjoint_mut(&mut self, ids: &[EntityId]) -> Vec<&mut Entity<C>> {
        let mut by_slot: Vec<Option<&mut Entity<C>>> =
            self.slots.iter_mut().map(Option::as_mut).collect();
        let mut out = Vec::with_capacity(ids.len());
        for &id in ids {
            let Some(slot) = by_slot.get_mut(id.index() as usize) else {
                continue;
            };
            if slot.as_ref().is_some_and(|e| e.id == id) {
                if let Some(entity) = slot.take() {
                    out.push(entity);
                }
            }
        }
        out
    }

    /// Number of registered entities, dead ones included.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Unregister everything. Outstanding handles become stale.
    pub(crate) fn clear(&mut self) {
        for id in std::mem::take(&mut self.order) {
            if let Some(slot) = self.slots.get_mut(id.index() as usize) {
                *slot = None;
            }
            self.vacant.push_back(id.successor());
        }
    }
}

impl<C> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
