//! Tessel engine -- deterministic 2D platformer physics on top of
//! `tessel-ecs`.
//!
//! Bodies are axis-aligned boxes integrated at a fixed timestep. Dynamic
//! bodies are pushed out of static ones; every other overlapping pair only
//! records which side touched and picks up friction. Fixtures are sensor
//! boxes whose overlaps are reported to a [`ContactListener`] as
//! begin/continue/end events.
//!
//! # Quick Start
//!
//! ```
//! use tessel_engine::prelude::*;
//!
//! #[derive(Default)]
//! struct Components { body: Option<Body> }
//!
//! impl ComponentSet for Components {
//!     fn component_mask(&self) -> ComponentMask {
//!         if self.body.is_some() { ComponentMask::of(&[BODY_KIND]) } else { ComponentMask::EMPTY }
//!     }
//! }
//!
//! impl HasBody for Components {
//!     fn body(&self) -> Option<&Body> { self.body.as_ref() }
//!     fn body_mut(&mut self) -> Option<&mut Body> { self.body.as_mut() }
//! }
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.add_system(WorldSystem::new(NoopListener, WorldConfig::default()).unwrap());
//!
//! let floor = Body::new(BodyType::Static, Rect::new(0.0, 0.0, 320.0, 32.0)).unwrap();
//! let player = Body::new(BodyType::Dynamic, Rect::new(16.0, 64.0, 16.0, 16.0)).unwrap().with_gravity(-20.0 * PPM);
//! scheduler.add_entity(Components { body: Some(floor) });
//! let player = scheduler.add_entity(Components { body: Some(player) });
//!
//! for _ in 0..120 {
//!     scheduler.update_systems(1.0 / 60.0);
//! }
//!
//! let body = scheduler.registry().get(player).unwrap().components().body().unwrap();
//! assert!(body.is_colliding(Direction::Down));
//! assert!((body.position().y - 32.0).abs() <= 0.5);
//! ```

#![deny(unsafe_code)]

pub mod body;
pub mod config;
pub mod contact;
pub mod fixture;
pub mod geometry;
mod resolve;
pub mod world_system;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while building bodies, fixtures and the world system.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A fixture was given a non-positive or non-finite size.
    #[error("fixture size {width} x {height} must be positive and finite")]
    DegenerateFixture { width: f32, height: f32 },

    /// A body was given a collision box with a non-finite position or a
    /// non-positive or non-finite size.
    #[error("body box at ({x}, {y}) of size {width} x {height} is degenerate")]
    DegenerateBody {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },

    /// The fixed step is zero, negative, or not finite.
    #[error("fixed step {fixed_step} must be positive and finite")]
    InvalidFixedStep { fixed_step: f32 },

    /// An air resistance component is not finite.
    #[error("air resistance ({x}, {y}) must be finite")]
    InvalidAirResistance { x: f32, y: f32 },

    /// The configuration could not be parsed or serialised.
    #[error(transparent)]
    Config(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage, including the `tessel-ecs`
/// prelude.
pub mod prelude {
    pub use tessel_ecs::prelude::*;

    pub use crate::body::{Body, BodyHook, BodySense, BodyType, Direction, DirectionSet, HasBody, BODY_KIND};
    pub use crate::config::{WorldConfig, PPM};
    pub use crate::contact::{Contact, ContactListener, NoopListener};
    pub use crate::fixture::{Fixture, FixtureKind, FixtureRef};
    pub use crate::geometry::Rect;
    pub use crate::world_system::{WorldSystem, WORLD_SYSTEM_NAME};
    pub use crate::WorldError;

    pub use glam::Vec2;
}
