//! The [`Body`] component: collision box, velocity, and per-frame contact
//! state of a physics participant.

use std::collections::HashSet;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tessel_ecs::component::{ComponentKind, ComponentSet};

use crate::fixture::Fixture;
use crate::geometry::Rect;
use crate::WorldError;

/// Component kind tag reserved for [`Body`].
pub const BODY_KIND: ComponentKind = ComponentKind::new(0);

/// How a body takes part in collision resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyType {
    /// Never moved by resolution.
    Static,
    /// Pushed out of static bodies.
    Dynamic,
    /// Sets flags and friction but is never pushed and never pushes.
    Abstract,
}

/// A side of a body's collision box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Every direction, in bit order.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// A set of [`Direction`]s.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DirectionSet(u8);

impl DirectionSet {
    /// No directions.
    pub const EMPTY: DirectionSet = DirectionSet(0);

    /// Whether `dir` is in the set.
    pub fn contains(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    /// Add `dir`. Adding a present direction is a no-op.
    pub fn insert(&mut self, dir: Direction) {
        self.0 |= dir.bit();
    }

    /// Remove `dir` if present.
    pub fn remove(&mut self, dir: Direction) {
        self.0 &= !dir.bit();
    }

    /// Remove every direction.
    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Whether the set holds no direction.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in [`Direction::ALL`] order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |&d| self.contains(d))
    }
}

impl fmt::Debug for DirectionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Gameplay-level facts about a body, maintained by contact listeners.
///
/// The world system never reads or writes these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodySense {
    FeetOnGround,
    HeadTouchingBlock,
    TouchingBlockLeft,
    TouchingBlockRight,
    TouchingWallSlideLeft,
    TouchingWallSlideRight,
    Custom(u16),
}

/// Per-frame callback that may only touch its owning body.
pub type BodyHook = Box<dyn FnMut(&mut Body, f32)>;

/// One hook and whether it was reassigned since it last started running.
#[derive(Default)]
struct HookSlot {
    hook: Option<BodyHook>,
    reassigned: bool,
}

impl HookSlot {
    fn assign(&mut self, hook: Option<BodyHook>) {
        self.hook = hook;
        self.reassigned = true;
    }

    fn is_set(&self) -> bool {
        self.hook.is_some()
    }
}

// ---------------------------------------------------------------------------
// Body
// ---------------------------------------------------------------------------

/// A physics participant: an axis-aligned collision box with velocity,
/// resistance, sensor fixtures and optional per-frame hooks.
///
/// The world system owns the body's motion. Gameplay code steers it by
/// setting velocity and resistance, typically from a hook or a contact
/// listener, and reads back the collision flags after each frame.
pub struct Body {
    /// How the body takes part in resolution.
    pub body_type: BodyType,
    /// World-space box, bottom-left origin.
    pub collision_box: Rect,
    /// Pixels per second, rounded to hundredths every fixed step.
    pub velocity: Vec2,
    /// Added to `velocity.y` per second while airborne.
    pub gravity: f32,
    /// When `false`, `gravity` is ignored and a grounded body keeps its
    /// vertical velocity.
    pub gravity_enabled: bool,
    /// Divides velocity once per fixed step, then resets to air resistance.
    pub resistance: Vec2,
    /// When `false`, `resistance` is still reset each step but never applied.
    pub affected_by_resistance: bool,
    /// Added to a partner's resistance on the surface-parallel axis.
    pub friction: Vec2,
    prior_box: Rect,
    fixtures: Vec<Fixture>,
    colliding: DirectionSet,
    senses: HashSet<BodySense>,
    pre_process: HookSlot,
    post_process: HookSlot,
}

impl Body {
    /// A body occupying `collision_box`.
    ///
    /// Gravity starts enabled only for [`BodyType::Dynamic`]. Fails with
    /// [`WorldError::DegenerateBody`] unless the box has a finite position
    /// and a positive, finite size.
    pub fn new(body_type: BodyType, collision_box: Rect) -> Result<Self, WorldError> {
        let Rect {
            x,
            y,
            width,
            height,
        } = collision_box;
        let sized = |v: f32| v.is_finite() && v > 0.0;
        if !(x.is_finite() && y.is_finite() && sized(width) && sized(height)) {
            return Err(WorldError::DegenerateBody { x, y, width, height });
        }
        Ok(Self {
            body_type,
            collision_box,
            velocity: Vec2::ZERO,
            gravity: 0.0,
            gravity_enabled: body_type == BodyType::Dynamic,
            resistance: Vec2::ONE,
            affected_by_resistance: true,
            friction: Vec2::ZERO,
            prior_box: collision_box,
            fixtures: Vec::new(),
            colliding: DirectionSet::EMPTY,
            senses: HashSet::new(),
            pre_process: HookSlot::default(),
            post_process: HookSlot::default(),
        })
    }

    /// Set the vertical acceleration, in pixels per second squared.
    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    /// Override the per-type gravity default.
    pub fn with_gravity_enabled(mut self, enabled: bool) -> Self {
        self.gravity_enabled = enabled;
        self
    }

    /// Set the friction handed to bodies touching this one.
    pub fn with_friction(mut self, friction: Vec2) -> Self {
        self.friction = friction;
        self
    }

    /// Set the starting velocity.
    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Attach `fixture`; see [`Body::add_fixture`].
    pub fn with_fixture(mut self, fixture: Fixture) -> Self {
        self.add_fixture(fixture);
        self
    }

    /// Install a pre-process hook; see [`Body::set_pre_process`].
    pub fn with_pre_process(mut self, hook: impl FnMut(&mut Body, f32) + 'static) -> Self {
        self.set_pre_process(hook);
        self
    }

    /// Install a post-process hook; see [`Body::set_post_process`].
    pub fn with_post_process(mut self, hook: impl FnMut(&mut Body, f32) + 'static) -> Self {
        self.set_post_process(hook);
        self
    }

    // -- geometry ----------------------------------------------------------

    /// Bottom-left corner of the collision box.
    pub fn position(&self) -> Vec2 {
        self.collision_box.position()
    }

    /// Width and height of the collision box.
    pub fn size(&self) -> Vec2 {
        self.collision_box.size()
    }

    /// Centre of the collision box.
    pub fn center(&self) -> Vec2 {
        self.collision_box.center()
    }

    /// Move the collision box so its centre lands on `center`.
    ///
    /// Fixtures follow at the next fixed step.
    pub fn set_center(&mut self, center: Vec2) {
        self.collision_box.set_center(center);
    }

    /// Shift the collision box by `delta`. Fixtures follow at the next fixed
    /// step.
    pub fn translate(&mut self, delta: Vec2) {
        self.collision_box.translate(delta);
    }

    /// The collision box as it was at the start of the current frame.
    pub fn prior_box(&self) -> &Rect {
        &self.prior_box
    }

    pub(crate) fn snapshot_prior_box(&mut self) {
        self.prior_box = self.collision_box;
    }

    // -- velocity and resistance -------------------------------------------

    /// Replace the velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Add `impulse` to the velocity.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse;
    }

    /// Raise horizontal resistance for the next fixed step.
    pub fn add_resistance_x(&mut self, amount: f32) {
        self.resistance.x += amount;
    }

    /// Raise vertical resistance for the next fixed step.
    pub fn add_resistance_y(&mut self, amount: f32) {
        self.resistance.y += amount;
    }

    // -- fixtures ----------------------------------------------------------

    /// Attach `fixture`, centring it on the body. Returns its index.
    pub fn add_fixture(&mut self, mut fixture: Fixture) -> usize {
        fixture.recenter(self.center());
        self.fixtures.push(fixture);
        self.fixtures.len() - 1
    }

    /// Fixtures in attachment order. A fixture's index here is the index
    /// carried by its [`FixtureRef`](crate::fixture::FixtureRef)s.
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// The fixture at `index`, if any.
    pub fn fixture(&self, index: usize) -> Option<&Fixture> {
        self.fixtures.get(index)
    }

    /// Mutable access to the fixture at `index`, if any.
    pub fn fixture_mut(&mut self, index: usize) -> Option<&mut Fixture> {
        self.fixtures.get_mut(index)
    }

    pub(crate) fn recenter_fixtures(&mut self) {
        let center = self.center();
        for fixture in &mut self.fixtures {
            fixture.recenter(center);
        }
    }

    // -- collision flags ---------------------------------------------------

    /// Which sides touched another body during the current frame.
    pub fn colliding(&self) -> DirectionSet {
        self.colliding
    }

    /// Whether side `dir` touched another body this frame.
    pub fn is_colliding(&self, dir: Direction) -> bool {
        self.colliding.contains(dir)
    }

    pub(crate) fn set_colliding(&mut self, dir: Direction) {
        self.colliding.insert(dir);
    }

    pub(crate) fn clear_colliding(&mut self) {
        self.colliding.clear();
    }

    // -- senses ------------------------------------------------------------

    /// Whether a listener has recorded `sense` on this body.
    pub fn is(&self, sense: BodySense) -> bool {
        self.senses.contains(&sense)
    }

    /// Record `sense`.
    pub fn set_is(&mut self, sense: BodySense) {
        self.senses.insert(sense);
    }

    /// Forget `sense`.
    pub fn set_is_not(&mut self, sense: BodySense) {
        self.senses.remove(&sense);
    }

    // -- hooks -------------------------------------------------------------

    /// Install the hook run once per frame before the fixed steps.
    ///
    /// A hook may call this on its own body to replace itself; the new hook
    /// runs from the next frame on.
    pub fn set_pre_process(&mut self, hook: impl FnMut(&mut Body, f32) + 'static) {
        self.pre_process.assign(Some(Box::new(hook)));
    }

    /// Install the hook run once per frame after contacts are dispatched.
    pub fn set_post_process(&mut self, hook: impl FnMut(&mut Body, f32) + 'static) {
        self.post_process.assign(Some(Box::new(hook)));
    }

    /// Remove both hooks. Called from inside a hook, that hook does not run
    /// again.
    pub fn clear_hooks(&mut self) {
        self.pre_process.assign(None);
        self.post_process.assign(None);
    }

    /// Whether a pre-process hook is installed.
    pub fn has_pre_process(&self) -> bool {
        self.pre_process.is_set()
    }

    /// Whether a post-process hook is installed.
    pub fn has_post_process(&self) -> bool {
        self.post_process.is_set()
    }

    pub(crate) fn run_pre_process(&mut self, delta: f32) {
        self.run_hook(|body| &mut body.pre_process, delta);
    }

    pub(crate) fn run_post_process(&mut self, delta: f32) {
        self.run_hook(|body| &mut body.post_process, delta);
    }

    /// Take the hook out of its slot, run it, and put it back unless it
    /// reassigned the slot while running.
    fn run_hook(&mut self, slot: fn(&mut Body) -> &mut HookSlot, delta: f32) {
        let Some(mut hook) = slot(self).hook.take() else {
            return;
        };
        slot(self).reassigned = false;
        hook(self, delta);
        let slot = slot(self);
        if !slot.reassigned {
            slot.hook = Some(hook);
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("body_type", &self.body_type)
            .field("collision_box", &self.collision_box)
            .field("velocity", &self.velocity)
            .field("gravity", &self.gravity)
            .field("gravity_enabled", &self.gravity_enabled)
            .field("resistance", &self.resistance)
            .field("friction", &self.friction)
            .field("colliding", &self.colliding)
            .field("fixtures", &self.fixtures.len())
            .field("pre_process", &self.pre_process.is_set())
            .field("post_process", &self.post_process.is_set())
            .finish_non_exhaustive()
    }
}

/// A component bag that may carry a [`Body`].
///
/// Implementors must report [`BODY_KIND`] in their mask exactly when
/// `body()` returns `Some`.
pub trait HasBody: ComponentSet {
    fn body(&self) -> Option<&Body>;
    fn body_mut(&mut self) -> Option<&mut Body>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
