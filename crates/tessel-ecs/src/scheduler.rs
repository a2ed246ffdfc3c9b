//! Frame scheduler: system membership maintenance and ordered invocation.
//!
//! Every call to [`Scheduler::update_systems`] does two things:
//!
//! 1. A membership pass over all registered entities, in registration order.
//!    Dead entities are removed from every system that holds them and then
//!    dropped from the registry. Live entities are admitted to each system
//!    whose mask they now cover and evicted from each system whose mask they
//!    no longer cover.
//! 2. Every system's `update` runs in registration order.
//!
//! Registration order is a correctness dependency: physics has to run before
//! anything that reads resolved positions.
//!
//! # Example
//!
//! ```
//! use tessel_ecs::prelude::*;
//!
//! const HEALTH: ComponentKind = ComponentKind::new(0);
//!
//! struct Bag { health: Option<u32> }
//!
//! impl ComponentSet for Bag {
//!     fn component_mask(&self) -> ComponentMask {
//!         if self.health.is_some() { ComponentMask::of(&[HEALTH]) } else { ComponentMask::EMPTY }
//!     }
//! }
//!
//! struct Regen;
//!
//! impl System<Bag> for Regen {
//!     fn name(&self) -> &str { "regen" }
//!     fn component_mask(&self) -> ComponentMask { ComponentMask::of(&[HEALTH]) }
//!     fn process_entity(&mut self, entity: &mut Entity<Bag>, _delta: f32) {
//!         if let Some(hp) = entity.components_mut().health.as_mut() { *hp += 1; }
//!     }
//! }
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.add_system(Regen);
//! let e = scheduler.add_entity(Bag { health: Some(1) });
//!
//! scheduler.update_systems(1.0 / 60.0);
//! assert_eq!(scheduler.registry().get(e).unwrap().components().health, Some(2));
//! assert!(scheduler.is_member("regen", e));
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::component::ComponentSet;
use crate::entity::EntityId;
use crate::registry::Registry;
use crate::system::{Membership, System};
use crate::EcsError;

// ---------------------------------------------------------------------------
// SchedulerDiagnostics
// ---------------------------------------------------------------------------

/// Timing for the last frame.
#[derive(Debug, Clone, Default)]
pub struct SchedulerDiagnostics {
    /// Wall-clock time per system, in execution order.
    pub system_times: Vec<(String, Duration)>,
    /// Time spent in the membership pass.
    pub membership_time: Duration,
    /// Entities destroyed by the membership pass.
    pub destroyed: usize,
    /// Membership pass plus all systems.
    pub total_time: Duration,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

struct ScheduledSystem<C> {
    system: Box<dyn System<C>>,
    members: Membership,
}

/// Owns the entity registry and the ordered system pipeline.
pub struct Scheduler<C: ComponentSet> {
    registry: Registry<C>,
    systems: Vec<ScheduledSystem<C>>,
    frame_counter: u64,
    last_diagnostics: SchedulerDiagnostics,
}

impl<C: ComponentSet> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            systems: Vec::new(),
            frame_counter: 0,
            last_diagnostics: SchedulerDiagnostics::default(),
        }
    }

    /// Register an entity. It joins systems at the next membership pass.
    pub fn add_entity(&mut self, components: C) -> EntityId {
        let id = self.registry.insert(components);
        debug!(entity = %id, "entity registered");
        id
    }

    /// Append a system to the pipeline.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system<S: System<C> + 'static>(&mut self, system: S) {
        let name = system.name().to_owned();
        assert!(
            !self.systems.iter().any(|s| s.system.name() == name),
            "duplicate system name: {name:?}"
        );
        debug!(system = %name, position = self.systems.len(), "system registered");
        self.systems.push(ScheduledSystem {
            system: Box::new(system),
            members: Membership::new(),
        });
    }

    /// Run one frame: membership pass, then every system in order.
    pub fn update_systems(&mut self, delta: f32) {
        let delta = sanitize_delta(delta);
        let frame_start = Instant::now();

        let membership_start = Instant::now();
        let destroyed = self.update_membership();
        let membership_time = membership_start.elapsed();

        let mut system_times = Vec::with_capacity(self.systems.len());
        for scheduled in &mut self.systems {
            let start = Instant::now();
            scheduled
                .system
                .update(scheduled.members.as_slice(), &mut self.registry, delta);
            system_times.push((scheduled.system.name().to_owned(), start.elapsed()));
        }

        self.frame_counter += 1;
        self.last_diagnostics = SchedulerDiagnostics {
            system_times,
            membership_time,
            destroyed,
            total_time: frame_start.elapsed(),
        };
    }

    /// Run only the membership pass. Returns the number of entities destroyed.
    pub fn update_membership(&mut self) -> usize {
        for scheduled in &mut self.systems {
            let registry = &self.registry;
            scheduled.members.retain(|id| registry.contains(id));
        }

        let mut destroyed = 0;
        let ids = self.registry.ids().to_vec();
        for id in ids {
            let Some(entity) = self.registry.get(id) else {
                continue;
            };
            if entity.is_dead() {
                for scheduled in &mut self.systems {
                    scheduled.members.evict(id);
                }
                self.registry.remove(id);
                destroyed += 1;
                debug!(entity = %id, "dead entity destroyed");
                continue;
            }
            let held = entity.component_mask();
            for scheduled in &mut self.systems {
                let qualifies = scheduled.system.qualifies(held);
                let member = scheduled.members.contains(id);
                if qualifies && !member {
                    scheduled.members.admit(id);
                    debug!(entity = %id, system = scheduled.system.name(), "entity admitted");
                } else if !qualifies && member {
                    scheduled.members.evict(id);
                    debug!(entity = %id, system = scheduled.system.name(), "entity evicted");
                }
            }
        }
        destroyed
    }

    /// Drop every entity from the registry and from every system.
    pub fn purge_all_entities(&mut self) {
        for scheduled in &mut self.systems {
            scheduled.members.clear();
        }
        self.registry.clear();
    }

    // -- accessors ----------------------------------------------------------

    /// Every registered entity.
    pub fn registry(&self) -> &Registry<C> {
        &self.registry
    }

    /// Mutable access for gameplay code running between frames.
    ///
    /// Entities cannot be unregistered through it; mark them dead with
    /// [`Registry::kill`] and the next membership pass destroys them.
    pub fn registry_mut(&mut self) -> &mut Registry<C> {
        &mut self.registry
    }

    /// Current members of the named system, in admission order.
    pub fn members(&self, system: &str) -> Result<&[EntityId], EcsError> {
        self.systems
            .iter()
            .find(|s| s.system.name() == system)
            .map(|s| s.members.as_slice())
            .ok_or_else(|| EcsError::UnknownSystem {
                name: system.to_owned(),
                registered: self.system_names().join(", "),
            })
    }

    /// Whether `id` belongs to the named system. `false` for an unknown system.
    pub fn is_member(&self, system: &str, id: EntityId) -> bool {
        self.systems
            .iter()
            .any(|s| s.system.name() == system && s.members.contains(id))
    }

    /// The named system, if registered.
    pub fn system(&self, name: &str) -> Option<&dyn System<C>> {
        self.systems
            .iter()
            .find(|s| s.system.name() == name)
            .map(|s| s.system.as_ref())
    }

    /// System names in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.system.name()).collect()
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_counter
    }

    /// Timings from the most recent [`Scheduler::update_systems`].
    pub fn last_diagnostics(&self) -> &SchedulerDiagnostics {
        &self.last_diagnostics
    }
}

impl<C: ComponentSet> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Negative or non-finite frame times count as no elapsed time.
pub fn sanitize_delta(delta: f32) -> f32 {
    if delta.is_finite() && delta >= 0.0 {
        delta
    } else {
        warn!(delta, "invalid frame delta, treating as zero");
        0.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentKind, ComponentMask};
    use crate::registry::Entity;
    use std::cell::RefCell;
    use std::rc::Rc;

    const BODY: ComponentKind = ComponentKind::new(0);
    const SPRITE: ComponentKind = ComponentKind::new(1);

    #[derive(Debug, Default)]
    struct Bag {
        body: Option<()>,
        sprite: Option<()>,
    }

    impl Bag {
        fn body() -> Self {
            Self {
                body: Some(()),
                sprite: None,
            }
        }

        fn body_and_sprite() -> Self {
            Self {
                body: Some(()),
                sprite: Some(()),
            }
        }
    }

    impl ComponentSet for Bag {
        fn component_mask(&self) -> ComponentMask {
            let mut mask = ComponentMask::EMPTY;
            if self.body.is_some() {
                mask = mask.with(BODY);
            }
            if self.sprite.is_some() {
                mask = mask.with(SPRITE);
            }
            mask
        }
    }

    type Log = Rc<RefCell<Vec<(String, Vec<EntityId>)>>>;

    /// Records its name and member list every frame.
    struct Tracer {
        name: String,
        mask: ComponentMask,
        log: Log,
    }

    impl Tracer {
        fn new(name: &str, kinds: &[ComponentKind], log: &Log) -> Self {
            Self {
                name: name.to_owned(),
                mask: ComponentMask::of(kinds),
                log: Rc::clone(log),
            }
        }
    }

    impl System<Bag> for Tracer {
        fn name(&self) -> &str {
            &self.name
        }

        fn component_mask(&self) -> ComponentMask {
            self.mask
        }

        fn update(&mut self, members: &[EntityId], _registry: &mut Registry<Bag>, _delta: f32) {
            self.log
                .borrow_mut()
                .push((self.name.clone(), members.to_vec()));
        }
    }

    /// Kills every member during its update.
    struct Reaper;

    impl System<Bag> for Reaper {
        fn name(&self) -> &str {
            "reaper"
        }

        fn component_mask(&self) -> ComponentMask {
            ComponentMask::of(&[SPRITE])
        }

        fn process_entity(&mut self, entity: &mut Entity<Bag>, _delta: f32) {
            entity.die();
        }
    }

    // -- 1. registration ----------------------------------------------------

    #[test]
    fn new_scheduler_is_empty() {
        let scheduler: Scheduler<Bag> = Scheduler::new();
        assert_eq!(scheduler.frame_count(), 0);
        assert_eq!(scheduler.system_count(), 0);
        assert!(scheduler.registry().is_empty());
    }

    #[test]
    #[should_panic(expected = "duplicate system name")]
    fn duplicate_system_name_panics() {
        let log = Log::default();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(Tracer::new("physics", &[BODY], &log));
        scheduler.add_system(Tracer::new("physics", &[SPRITE], &log));
    }

    // -- 2. execution order -------------------------------------------------

    #[test]
    fn systems_run_in_registration_order() {
        let log = Log::default();
        let mut scheduler: Scheduler<Bag> = Scheduler::new();
        scheduler.add_system(Tracer::new("world", &[BODY], &log));
        scheduler.add_system(Tracer::new("sprite", &[SPRITE], &log));
        scheduler.add_system(Tracer::new("render", &[], &log));

        scheduler.update_systems(0.016);
        scheduler.update_systems(0.016);

        let names: Vec<String> = log.borrow().iter().map(|(n, _)| n.clone()).collect();
        assert_eq!(names, vec!["world", "sprite", "render", "world", "sprite", "render"]);
        assert_eq!(scheduler.system_names(), vec!["world", "sprite", "render"]);
        assert_eq!(scheduler.frame_count(), 2);
        assert_eq!(scheduler.last_diagnostics().system_times.len(), 3);
    }

    // -- 3. membership ------------------------------------------------------

    #[test]
    fn entities_join_systems_whose_mask_they_cover() {
        let log = Log::default();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(Tracer::new("world", &[BODY], &log));
        scheduler.add_system(Tracer::new("sprite", &[BODY, SPRITE], &log));

        let a = scheduler.add_entity(Bag::body());
        let b = scheduler.add_entity(Bag::body_and_sprite());
        let c = scheduler.add_entity(Bag::default());

        // Not a member until the first membership pass.
        assert!(!scheduler.is_member("world", a));

        scheduler.update_systems(0.016);
        assert_eq!(scheduler.members("world").unwrap(), &[a, b]);
        assert_eq!(scheduler.members("sprite").unwrap(), &[b]);
        assert!(!scheduler.is_member("world", c));

        let seen = log.borrow();
        assert_eq!(seen[0], ("world".to_owned(), vec![a, b]));
        assert_eq!(seen[1], ("sprite".to_owned(), vec![b]));
    }

    #[test]
    fn losing_a_component_evicts_and_regaining_readmits() {
        let log = Log::default();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(Tracer::new("sprite", &[SPRITE], &log));
        let a = scheduler.add_entity(Bag::body_and_sprite());
        let b = scheduler.add_entity(Bag::body_and_sprite());
        scheduler.update_systems(0.016);
        assert_eq!(scheduler.members("sprite").unwrap(), &[a, b]);

        scheduler.registry_mut().get_mut(a).unwrap().components_mut().sprite = None;
        scheduler.update_systems(0.016);
        assert_eq!(scheduler.members("sprite").unwrap(), &[b]);

        scheduler.registry_mut().get_mut(a).unwrap().components_mut().sprite = Some(());
        scheduler.update_systems(0.016);
        // Re-admitted members go to the back.
        assert_eq!(scheduler.members("sprite").unwrap(), &[b, a]);
    }

    #[test]
    fn dead_entities_are_destroyed_the_frame_after_death() {
        let log = Log::default();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(Reaper);
        scheduler.add_system(Tracer::new("world", &[BODY], &log));
        let a = scheduler.add_entity(Bag::body_and_sprite());
        let b = scheduler.add_entity(Bag::body());

        // Frame 1: the reaper kills `a`, which still reaches later systems.
        scheduler.update_systems(0.016);
        assert!(scheduler.registry().get(a).unwrap().is_dead());
        assert_eq!(log.borrow()[0].1, vec![a, b]);
        assert_eq!(scheduler.last_diagnostics().destroyed, 0);

        // Frame 2: `a` is removed before any system runs.
        scheduler.update_systems(0.016);
        assert!(!scheduler.registry().contains(a));
        assert!(!scheduler.is_member("reaper", a));
        assert_eq!(log.borrow()[1].1, vec![b]);
        assert_eq!(scheduler.last_diagnostics().destroyed, 1);
    }

    #[test]
    fn killing_between_frames_leaves_no_stale_member() {
        let log = Log::default();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(Tracer::new("world", &[BODY], &log));
        let a = scheduler.add_entity(Bag::body());
        let b = scheduler.add_entity(Bag::body());
        scheduler.update_systems(0.016);

        scheduler.registry_mut().kill(a).unwrap();
        for _ in 0..3 {
            scheduler.update_systems(0.016);
        }
        assert_eq!(scheduler.members("world").unwrap(), &[b]);
        assert_eq!(log.borrow().last().unwrap().1, vec![b]);
    }

    #[test]
    fn unregistered_members_are_pruned() {
        let log = Log::default();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(Tracer::new("world", &[BODY], &log));
        let a = scheduler.add_entity(Bag::body());
        scheduler.update_systems(0.016);

        scheduler.registry.remove(a);
        scheduler.update_systems(0.016);
        assert!(scheduler.members("world").unwrap().is_empty());
        assert!(log.borrow().last().unwrap().1.is_empty());

        // The reused slot is a different entity and joins afresh.
        let c = scheduler.add_entity(Bag::body());
        assert_eq!(c.index(), a.index());
        scheduler.update_systems(0.016);
        assert_eq!(scheduler.members("world").unwrap(), &[c]);
    }

    #[test]
    fn purge_clears_registry_and_members() {
        let log = Log::default();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(Tracer::new("world", &[BODY], &log));
        let a = scheduler.add_entity(Bag::body());
        scheduler.update_systems(0.016);
        assert!(scheduler.is_member("world", a));

        scheduler.purge_all_entities();
        assert!(scheduler.registry().is_empty());
        assert!(scheduler.members("world").unwrap().is_empty());
    }

    #[test]
    fn unknown_system_lookup_lists_registered_names() {
        let log = Log::default();
        let mut scheduler: Scheduler<Bag> = Scheduler::new();
        scheduler.add_system(Tracer::new("world", &[BODY], &log));
        let err = scheduler.members("render").unwrap_err();
        assert!(err.to_string().contains("world"), "got: {err}");
        assert!(scheduler.system("world").is_some());
    }

    #[test]
    fn invalid_delta_is_treated_as_zero() {
        assert_eq!(sanitize_delta(-1.0), 0.0);
        assert_eq!(sanitize_delta(f32::NAN), 0.0);
        assert_eq!(sanitize_delta(f32::INFINITY), 0.0);
        assert_eq!(sanitize_delta(0.25), 0.25);
    }
}
