//! The world system: fixed-step integration, collision resolution and
//! contact tracking for every entity carrying a [`Body`].
//!
//! Each frame runs in four phases:
//!
//! 1. Pre-process: every member body snapshots its box into the prior box,
//!    clears its collision flags and runs its pre-process hook.
//! 2. Fixed steps: frame time is added to an accumulator, and while it holds
//!    at least one fixed step every body is integrated, overlapping fixtures
//!    are recorded as contacts and overlapping collision boxes are resolved.
//! 3. Contact diff: contacts present now and last frame continue, new ones
//!    begin, vanished ones end.
//! 4. Post-process: every post-process hook runs once with the frame delta.

use std::collections::BTreeSet;

use glam::Vec2;
use tessel_ecs::component::ComponentMask;
use tessel_ecs::entity::EntityId;
use tessel_ecs::registry::Registry;
use tessel_ecs::scheduler::sanitize_delta;
use tessel_ecs::system::System;
use tracing::trace;

use crate::body::{Body, Direction, HasBody, BODY_KIND};
use crate::config::WorldConfig;
use crate::contact::{Contact, ContactListener};
use crate::fixture::FixtureRef;
use crate::resolve::resolve_collision;
use crate::WorldError;

/// Speeds below this (per axis) are snapped to zero before each step.
pub const VELOCITY_SNAP_THRESHOLD: f32 = 0.5;

/// Vertical velocity of a gravity-affected body resting on something.
pub const GROUND_REST_VELOCITY: f32 = -0.5;

/// Name the world system registers under.
pub const WORLD_SYSTEM_NAME: &str = "world";

/// The physics system. Admits every entity whose components hold a
/// [`Body`] and drives them through the frame phases above, reporting
/// fixture contacts to its listener `L`.
///
/// Members are integrated and resolved in admission order, which fixes the
/// outcome of every multi-body overlap.
pub struct WorldSystem<L> {
    listener: L,
    config: WorldConfig,
    /// Unconsumed simulated time in seconds. Kept in `f64` so that long runs
    /// of small frame deltas still add up to whole steps.
    accumulator: f64,
    prior_contacts: BTreeSet<Contact>,
    current_contacts: BTreeSet<Contact>,
    step_count: u64,
}

impl<L> WorldSystem<L> {
    /// A world system with `listener`, once `config` passes
    /// [`WorldConfig::validate`].
    pub fn new(listener: L, config: WorldConfig) -> Result<Self, WorldError> {
        config.validate()?;
        Ok(Self {
            listener,
            config,
            accumulator: 0.0,
            prior_contacts: BTreeSet::new(),
            current_contacts: BTreeSet::new(),
            step_count: 0,
        })
    }

    /// The configuration the system was built with.
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Simulated time not yet consumed by a fixed step, in seconds.
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Drop any leftover time, e.g. after a level load, so the next frame
    /// starts on a step boundary.
    pub fn reset_accumulator(&mut self) {
        self.accumulator = 0.0;
    }

    /// Total fixed steps run since construction.
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Contacts that were alive at the end of the last frame.
    pub fn prior_contacts(&self) -> impl Iterator<Item = &Contact> + '_ {
        self.prior_contacts.iter()
    }

    /// The contact listener.
    pub fn listener(&self) -> &L {
        &self.listener
    }

    /// Mutable access to the contact listener.
    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// One fixed step over `bodies`, in membership order.
    fn step(&mut self, bodies: &mut [(EntityId, &mut Body)]) {
        let fixed_step = self.config.fixed_step;
        for (_, body) in bodies.iter_mut() {
            integrate(body, self.config.air_resistance, fixed_step);
        }

        for j in 1..bodies.len() {
            let (left, right) = bodies.split_at(j);
            let (id_b, b) = &right[0];
            for (id_a, a) in left {
                for (ia, fa) in a.fixtures().iter().enumerate() {
                    for (ib, fb) in b.fixtures().iter().enumerate() {
                        if fa.overlaps(fb) {
                            self.current_contacts.insert(Contact::new(
                                FixtureRef::new(*id_a, ia, fa.kind()),
                                FixtureRef::new(*id_b, ib, fb.kind()),
                            ));
                        }
                    }
                }
            }
        }

        for i in 0..bodies.len() {
            for j in (i + 1)..bodies.len() {
                let (left, right) = bodies.split_at_mut(j);
                let a = &mut *left[i].1;
                let b = &mut *right[0].1;
                if let Some(overlap) = a.collision_box.intersection(&b.collision_box) {
                    resolve_collision(a, b, &overlap);
                }
            }
        }

        self.step_count += 1;
    }

    fn dispatch_contacts<C>(&mut self, registry: &mut Registry<C>, delta: f32)
    where
        L: ContactListener<C>,
    {
        let mut begun = 0usize;
        let mut ended = 0usize;
        for contact in &self.current_contacts {
            if self.prior_contacts.contains(contact) {
                self.listener.continue_contact(contact, registry, delta);
            } else {
                self.listener.begin_contact(contact, registry, delta);
                begun += 1;
            }
        }
        for contact in &self.prior_contacts {
            if !self.current_contacts.contains(contact) {
                self.listener.end_contact(contact, registry, delta);
                ended += 1;
            }
        }
        trace!(
            live = self.current_contacts.len(),
            begun,
            ended,
            "contacts dispatched"
        );
        self.prior_contacts = std::mem::take(&mut self.current_contacts);
    }
}

/// Advance one body by one fixed step.
fn integrate(body: &mut Body, air_resistance: Vec2, fixed_step: f32) {
    let mut v = body.velocity;
    if v.x.abs() < VELOCITY_SNAP_THRESHOLD {
        v.x = 0.0;
    }
    if v.y.abs() < VELOCITY_SNAP_THRESHOLD {
        v.y = 0.0;
    }

    if body.is_colliding(Direction::Left) {
        v.x = v.x.max(0.0);
    } else if body.is_colliding(Direction::Right) {
        v.x = v.x.min(0.0);
    }

    if body.affected_by_resistance {
        v.x *= 1.0 / body.resistance.x.max(1.0);
        v.y *= 1.0 / body.resistance.y.max(1.0);
    }
    body.resistance = air_resistance;

    if body.gravity_enabled {
        if body.is_colliding(Direction::Down) {
            v.y = GROUND_REST_VELOCITY;
        } else {
            v.y += body.gravity * fixed_step;
        }
    }

    v = Vec2::new(round_hundredths(v.x), round_hundredths(v.y));
    body.velocity = v;
    body.translate(v * fixed_step);
    body.recenter_fixtures();
}

/// Round to two decimals, halves toward positive infinity.
fn round_hundredths(value: f32) -> f32 {
    (value * 100.0 + 0.5).floor() / 100.0
}

impl<C, L> System<C> for WorldSystem<L>
where
    C: HasBody,
    L: ContactListener<C>,
{
    fn name(&self) -> &str {
        WORLD_SYSTEM_NAME
    }

    fn component_mask(&self) -> ComponentMask {
        ComponentMask::of(&[BODY_KIND])
    }

    fn update(&mut self, members: &[EntityId], registry: &mut Registry<C>, delta: f32) {
        let delta = sanitize_delta(delta);
        let mut post_hooks = Vec::new();
        let mut steps = 0u32;

        {
            let mut bodies: Vec<(EntityId, &mut Body)> = registry
                .get_disjoint_mut(members)
                .into_iter()
                .map(|entity| {
                    let id = entity.id();
                    let Some(body) = entity.components_mut().body_mut() else {
                        panic!("world system member {id} has no Body component");
                    };
                    (id, body)
                })
                .collect();

            for (id, body) in bodies.iter_mut() {
                body.snapshot_prior_box();
                body.clear_colliding();
                body.run_pre_process(delta);
                if body.has_post_process() {
                    post_hooks.push(*id);
                }
            }

            let fixed_step = f64::from(self.config.fixed_step);
            self.accumulator += f64::from(delta);
            while self.accumulator >= fixed_step {
                self.accumulator -= fixed_step;
                self.step(&mut bodies);
                steps += 1;
            }
            trace!(
                bodies = bodies.len(),
                steps,
                accumulator = self.accumulator,
                "world frame"
            );
        }

        // A frame without a fixed step saw no overlaps; keep last frame's
        // contacts instead of ending them all.
        if steps > 0 {
            self.dispatch_contacts(registry, delta);
        }

        for id in post_hooks {
            if let Some(body) = registry
                .get_mut(id)
                .and_then(|entity| entity.components_mut().body_mut())
            {
                body.run_post_process(delta);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
