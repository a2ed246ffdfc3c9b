//! Headless demo -- crates dropped at seeded random positions land on a
//! floor, and a contact listener tracks which ones have their feet down.
//!
//! Run with:
//!   cargo run --example falling_crates -p tessel-engine [-- path/to/world.json]
//!
//! Set `RUST_LOG=tessel_engine=trace` to see per-frame step and contact logs.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tessel_engine::prelude::*;
use tracing::info;

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Components {
    body: Option<Body>,
}

impl ComponentSet for Components {
    fn component_mask(&self) -> ComponentMask {
        if self.body.is_some() {
            ComponentMask::of(&[BODY_KIND])
        } else {
            ComponentMask::EMPTY
        }
    }
}

impl HasBody for Components {
    fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    fn body_mut(&mut self) -> Option<&mut Body> {
        self.body.as_mut()
    }
}

// ---------------------------------------------------------------------------
// Listener
// ---------------------------------------------------------------------------

/// Marks crates as grounded while a feet sensor touches a block.
struct Landings;

impl Landings {
    fn feet_body<'r>(
        contact: &Contact,
        registry: &'r mut Registry<Components>,
    ) -> Option<&'r mut Body> {
        let (feet, _) = contact.accept_mask(FixtureKind::Feet, FixtureKind::Block)?;
        registry.get_mut(feet.entity)?.components_mut().body_mut()
    }
}

impl ContactListener<Components> for Landings {
    fn begin_contact(&mut self, contact: &Contact, registry: &mut Registry<Components>, _: f32) {
        if let Some(body) = Self::feet_body(contact, registry) {
            body.set_is(BodySense::FeetOnGround);
        }
    }

    fn continue_contact(&mut self, _: &Contact, _: &mut Registry<Components>, _: f32) {}

    fn end_contact(&mut self, contact: &Contact, registry: &mut Registry<Components>, _: f32) {
        if let Some(body) = Self::feet_body(contact, registry) {
            body.set_is_not(BodySense::FeetOnGround);
        }
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

const SEED: u64 = 0x7e55e1;
const CRATES: usize = 24;
const FRAMES: usize = 240;
const FRAME_DELTA: f32 = 1.0 / 60.0;
const FLOOR_WIDTH: f32 = 40.0 * PPM;

fn spawn_crate(
    scheduler: &mut Scheduler<Components>,
    rng: &mut Pcg64,
) -> Result<EntityId, WorldError> {
    let size = rng.gen_range(0.5..1.5) * PPM;
    let x = rng.gen_range(0.0..FLOOR_WIDTH - size);
    let y = rng.gen_range(2.0..12.0) * PPM;

    let body = Body::new(BodyType::Dynamic, Rect::new(x, y, size, size))?
        .with_gravity(-20.0 * PPM)
        .with_friction(Vec2::new(0.035, 0.0))
        .with_velocity(Vec2::new(rng.gen_range(-2.0..2.0) * PPM, 0.0))
        .with_fixture(Fixture::new(FixtureKind::Block, size, size)?)
        .with_fixture(
            Fixture::new(FixtureKind::Feet, size / 2.0, 2.0)?
                .with_offset(Vec2::new(0.0, -size / 2.0)),
        );

    Ok(scheduler.add_entity(Components { body: Some(body) }))
}

fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => WorldConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => WorldConfig::default(),
    };
    info!(?config, "world config");

    let mut scheduler = Scheduler::new();
    scheduler.add_system(WorldSystem::new(Landings, config)?);

    let floor = Body::new(BodyType::Static, Rect::new(0.0, 0.0, FLOOR_WIDTH, PPM))?
        .with_friction(Vec2::new(0.035, 0.0))
        .with_fixture(Fixture::new(FixtureKind::Block, FLOOR_WIDTH, PPM)?);
    scheduler.add_entity(Components { body: Some(floor) });

    let mut rng = Pcg64::seed_from_u64(SEED);
    let crates = (0..CRATES)
        .map(|_| spawn_crate(&mut scheduler, &mut rng))
        .collect::<Result<Vec<_>, _>>()?;

    for frame in 0..FRAMES {
        scheduler.update_systems(FRAME_DELTA);
        if frame % 60 == 59 {
            let grounded = grounded(&scheduler, &crates);
            info!(frame = frame + 1, grounded = grounded.len(), "progress");
        }
    }

    let grounded = grounded(&scheduler, &crates);
    println!(
        "{} of {} crates grounded after {} frames",
        grounded.len(),
        crates.len(),
        scheduler.frame_count()
    );
    for id in &crates {
        let Some(body) = scheduler.registry().get(*id).and_then(|e| e.components().body()) else {
            continue;
        };
        let p = body.position();
        println!(
            "  {id}: ({:7.2}, {:7.2}) v=({:6.2}, {:6.2}) {:?}",
            p.x,
            p.y,
            body.velocity.x,
            body.velocity.y,
            body.colliding()
        );
    }

    Ok(())
}

fn grounded(scheduler: &Scheduler<Components>, crates: &[EntityId]) -> BTreeSet<EntityId> {
    crates
        .iter()
        .copied()
        .filter(|&id| {
            scheduler
                .registry()
                .get(id)
                .and_then(|e| e.components().body())
                .is_some_and(|b| b.is(BodySense::FeetOnGround))
        })
        .collect()
}
