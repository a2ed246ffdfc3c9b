//! Fixtures: sensor boxes attached to a body.

use std::collections::HashMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tessel_ecs::entity::EntityId;

use crate::geometry::Rect;
use crate::WorldError;

/// What a fixture is for. Listeners dispatch on pairs of kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FixtureKind {
    Block,
    Feet,
    Head,
    Left,
    Right,
    DamageBox,
    HitBox,
    Projectile,
    WallSlideSensor,
    Laser,
    /// Game-defined kind.
    Custom(u16),
}

/// An axis-aligned sensor box that overlaps other fixtures but never
/// resolves against them.
///
/// The bounding box is recentred at the owning body's centre plus
/// [`offset`](Fixture::offset) on every fixed step.
pub struct Fixture {
    kind: FixtureKind,
    bounds: Rect,
    offset: Vec2,
    user_data: HashMap<String, serde_json::Value>,
}

impl Fixture {
    /// A fixture of `width` x `height`. Both must be positive and finite.
    pub fn new(kind: FixtureKind, width: f32, height: f32) -> Result<Self, WorldError> {
        let valid = |v: f32| v.is_finite() && v > 0.0;
        if !valid(width) || !valid(height) {
            return Err(WorldError::DegenerateFixture { width, height });
        }
        Ok(Self {
            kind,
            bounds: Rect::new(0.0, 0.0, width, height),
            offset: Vec2::ZERO,
            user_data: HashMap::new(),
        })
    }

    /// Set the offset of the fixture's centre from the body centre.
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// What the fixture senses.
    pub fn kind(&self) -> FixtureKind {
        self.kind
    }

    /// World-space box, as of the last recentre.
    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    /// Offset of the fixture's centre from the body centre.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    /// Centre the bounding box at `body_center + offset`.
    pub fn recenter(&mut self, body_center: Vec2) {
        self.bounds.set_center(body_center + self.offset);
    }

    /// Strict overlap of the two world-space boxes.
    pub fn overlaps(&self, other: &Fixture) -> bool {
        self.bounds.overlaps(&other.bounds)
    }

    // -- user data ---------------------------------------------------------

    /// Attach a value under `key`, returning the previous one.
    pub fn put_user_data(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.user_data.insert(key.into(), value)
    }

    pub fn user_data(&self, key: &str) -> Option<&serde_json::Value> {
        self.user_data.get(key)
    }

    pub fn user_data_mut(&mut self, key: &str) -> Option<&mut serde_json::Value> {
        self.user_data.get_mut(key)
    }

    pub fn take_user_data(&mut self, key: &str) -> Option<serde_json::Value> {
        self.user_data.remove(key)
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.user_data.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("Fixture")
            .field("kind", &self.kind)
            .field("bounds", &self.bounds)
            .field("offset", &self.offset)
            .field("user_data", &keys)
            .finish()
    }
}

/// Value identity of a fixture: its owner, its index in the owner's fixture
/// list, and its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureRef {
    /// Owner of the fixture.
    pub entity: EntityId,
    /// Position in the owner's fixture list.
    pub index: usize,
    /// Kind of the fixture at the time of the contact.
    pub kind: FixtureKind,
}

impl FixtureRef {
    /// Reference to fixture `index` of `entity`.
    pub fn new(entity: EntityId, index: usize, kind: FixtureKind) -> Self {
        Self {
            entity,
            index,
            kind,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
