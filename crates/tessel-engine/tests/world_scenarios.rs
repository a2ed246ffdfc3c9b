//! End-to-end physics scenarios driven through the scheduler.

use std::cell::RefCell;
use std::rc::Rc;

use tessel_engine::prelude::*;

// -- test component bag -----------------------------------------------------

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

// -- helpers ----------------------------------------------------------------

const FRAME: f32 = 1.0 / 60.0;

fn fixed_step() -> f32 {
    WorldConfig::default().fixed_step
}

fn world() -> Scheduler<Components> {
    let mut scheduler = Scheduler::new();
    let world = WorldSystem::new(NoopListener, WorldConfig::default()).unwrap();
    scheduler.add_system(world);
    scheduler
}

fn spawn(scheduler: &mut Scheduler<Components>, body: Body) -> EntityId {
    scheduler.add_entity(Components { body: Some(body) })
}

fn body(scheduler: &Scheduler<Components>, id: EntityId) -> &Body {
    scheduler
        .registry()
        .get(id)
        .and_then(|e| e.components().body())
        .expect("entity should hold a body")
}

fn run(scheduler: &mut Scheduler<Components>, frames: usize, delta: f32) {
    for _ in 0..frames {
        scheduler.update_systems(delta);
    }
}

fn floor() -> Body {
    Body::new(BodyType::Static, Rect::new(0.0, 0.0, 320.0, 32.0)).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn falling_body_comes_to_rest_on_the_floor() {
    let mut scheduler = world();
    spawn(&mut scheduler, floor());
    let player = spawn(
        &mut scheduler,
        Body::new(BodyType::Dynamic, Rect::new(144.0, 160.0, 32.0, 32.0)).unwrap().with_gravity(-20.0 * PPM),
    );

    run(&mut scheduler, 180, FRAME);

    let p = body(&scheduler, player);
    assert!((p.position().y - 32.0).abs() <= 0.5, "bottom at {}", p.position().y);
    assert!(p.is_colliding(Direction::Down));
    assert_eq!(p.velocity.y, -0.5);
    assert_eq!(p.position().x, 144.0);
}

#[test]
fn gravity_disabled_bodies_never_gain_vertical_speed() {
    let mut scheduler = world();
    spawn(&mut scheduler, floor());
    let drifter = spawn(
        &mut scheduler,
        Body::new(BodyType::Dynamic, Rect::new(0.0, 100.0, 16.0, 16.0)).unwrap()
            .with_gravity(-20.0 * PPM)
            .with_gravity_enabled(false)
            .with_velocity(Vec2::new(120.0, 0.0)),
    );

    for _ in 0..90 {
        scheduler.update_systems(FRAME);
        assert_eq!(body(&scheduler, drifter).velocity.y, 0.0);
    }
    assert_eq!(body(&scheduler, drifter).position().y, 100.0);
}

#[test]
fn static_dynamic_overlap_is_resolved_in_one_step() {
    let mut scheduler = world();
    let ground = spawn(&mut scheduler, Body::new(BodyType::Static, Rect::new(0.0, 0.0, 64.0, 32.0)).unwrap());
    let sunk = spawn(
        &mut scheduler,
        Body::new(BodyType::Dynamic, Rect::new(10.0, 20.0, 16.0, 16.0)).unwrap().with_gravity_enabled(false),
    );

    scheduler.update_systems(fixed_step());

    let g = body(&scheduler, ground);
    let s = body(&scheduler, sunk);
    assert_eq!(s.position(), Vec2::new(10.0, 32.0));
    assert!(g.collision_box.intersection(&s.collision_box).is_none());
    assert!(s.is_colliding(Direction::Down));
    assert!(g.is_colliding(Direction::Up));
    assert_eq!(g.collision_box, Rect::new(0.0, 0.0, 64.0, 32.0));
}

#[test]
fn slow_velocities_converge_to_exact_zero() {
    let mut scheduler = world();
    let crawler = spawn(
        &mut scheduler,
        Body::new(BodyType::Dynamic, Rect::new(0.0, 100.0, 16.0, 16.0)).unwrap()
            .with_gravity_enabled(false)
            .with_velocity(Vec2::new(0.3, -0.4)),
    );
    scheduler.update_systems(fixed_step());
    assert_eq!(body(&scheduler, crawler).velocity, Vec2::ZERO);

    let coaster = spawn(
        &mut scheduler,
        Body::new(BodyType::Dynamic, Rect::new(0.0, 200.0, 16.0, 16.0)).unwrap()
            .with_gravity_enabled(false)
            .with_velocity(Vec2::new(5.0, 0.0)),
    );
    run(&mut scheduler, 120, FRAME);
    assert_eq!(body(&scheduler, coaster).velocity, Vec2::ZERO);
}

#[test]
fn overlapping_static_bodies_stay_put() {
    let mut scheduler = world();
    let a = spawn(&mut scheduler, Body::new(BodyType::Static, Rect::new(0.0, 0.0, 32.0, 32.0)).unwrap());
    let b = spawn(&mut scheduler, Body::new(BodyType::Static, Rect::new(16.0, 8.0, 32.0, 32.0)).unwrap());

    run(&mut scheduler, 30, FRAME);

    let (a, b) = (body(&scheduler, a), body(&scheduler, b));
    assert_eq!(a.collision_box, Rect::new(0.0, 0.0, 32.0, 32.0));
    assert_eq!(b.collision_box, Rect::new(16.0, 8.0, 32.0, 32.0));
    assert!(a.is_colliding(Direction::Right));
    assert!(b.is_colliding(Direction::Left));
    assert_eq!(a.velocity, Vec2::ZERO);
}

#[test]
fn walls_stop_horizontal_motion() {
    let mut scheduler = world();
    spawn(&mut scheduler, Body::new(BodyType::Static, Rect::new(64.0, 0.0, 32.0, 256.0)).unwrap());
    let runner = spawn(
        &mut scheduler,
        Body::new(BodyType::Dynamic, Rect::new(0.0, 100.0, 16.0, 16.0)).unwrap()
            .with_gravity_enabled(false)
            .with_velocity(Vec2::new(600.0, 0.0)),
    );

    run(&mut scheduler, 60, FRAME);

    let r = body(&scheduler, runner);
    assert!((r.position().x - 48.0).abs() < 1e-3, "x = {}", r.position().x);
    assert_eq!(r.velocity.x, 0.0);
}

#[test]
fn floor_friction_slows_sliding_bodies() {
    let slide = |friction: f32| {
        let mut scheduler = world();
        spawn(&mut scheduler, floor().with_friction(Vec2::new(friction, 0.0)));
        let slider = spawn(
            &mut scheduler,
            Body::new(BodyType::Dynamic, Rect::new(0.0, 32.0, 16.0, 16.0)).unwrap()
                .with_gravity(-20.0 * PPM)
                .with_velocity(Vec2::new(150.0, 0.0)),
        );
        run(&mut scheduler, 30, FRAME);
        body(&scheduler, slider).position().x
    };

    let icy = slide(0.0);
    let rough = slide(0.5);
    assert!(rough < icy, "rough {rough} should stop before icy {icy}");
    assert!(rough > 0.0);
}

#[test]
fn accumulator_carries_leftover_time() {
    let air_free = |body: Body| {
        let mut body = body.with_gravity_enabled(false).with_velocity(Vec2::new(60.0, 0.0));
        body.affected_by_resistance = false;
        body
    };
    let start = Rect::new(0.0, 0.0, 8.0, 8.0);

    let mut fine = world();
    let a = spawn(&mut fine, air_free(Body::new(BodyType::Dynamic, start).unwrap()));
    run(&mut fine, 105, 0.001);

    let mut coarse = world();
    let b = spawn(&mut coarse, air_free(Body::new(BodyType::Dynamic, start).unwrap()));
    coarse.update_systems(0.105);

    let (xa, xb) = (body(&fine, a).position().x, body(&coarse, b).position().x);
    assert!((xa - xb).abs() < 1e-4, "{xa} vs {xb}");
    assert!((xb - 6.0).abs() < 1e-3, "15 steps of 0.4 px, got {xb}");
}

#[test]
fn hooks_run_around_the_physics_pass() {
    let seen: Rc<RefCell<Vec<(f32, f32)>>> = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();

    let mut jumper = Body::new(BodyType::Dynamic, Rect::new(0.0, 0.0, 16.0, 16.0)).unwrap()
        .with_gravity_enabled(false)
        .with_pre_process(|b, _| b.set_velocity(Vec2::new(0.0, 150.0)))
        .with_post_process(move |b, delta| log.borrow_mut().push((b.position().y, delta)));
    jumper.affected_by_resistance = false;

    let mut scheduler = world();
    let jumper = spawn(&mut scheduler, jumper);

    scheduler.update_systems(fixed_step());
    scheduler.update_systems(fixed_step());

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!((seen[0].0 - 1.0).abs() < 1e-5, "one step at 150 px/s, got {}", seen[0].0);
    assert!((seen[1].0 - 2.0).abs() < 1e-5);
    assert_eq!(seen[0].1, fixed_step());
    assert!((body(&scheduler, jumper).position().y - 2.0).abs() < 1e-5);
}

#[test]
fn dead_floor_stops_holding_bodies_up() {
    let mut scheduler = world();
    let ground = spawn(&mut scheduler, floor());
    let player = spawn(
        &mut scheduler,
        Body::new(BodyType::Dynamic, Rect::new(144.0, 32.0, 32.0, 32.0)).unwrap().with_gravity(-20.0 * PPM),
    );
    run(&mut scheduler, 30, FRAME);
    assert!((body(&scheduler, player).position().y - 32.0).abs() <= 0.5);

    scheduler.registry_mut().kill(ground).unwrap();
    run(&mut scheduler, 60, FRAME);

    assert!(!scheduler.registry().contains(ground));
    assert!(body(&scheduler, player).position().y < 0.0);
}

#[test]
fn world_system_uses_the_world_name_and_body_mask() {
    let scheduler = world();
    assert_eq!(scheduler.system_names(), vec![WORLD_SYSTEM_NAME]);
    let system = scheduler.system(WORLD_SYSTEM_NAME).unwrap();
    assert_eq!(system.component_mask(), ComponentMask::of(&[BODY_KIND]));
}

// -- a bag that reports a body it does not hold ----------------------------

#[derive(Debug, Default)]
struct Liar;

impl ComponentSet for Liar {
    fn component_mask(&self) -> ComponentMask {
        ComponentMask::of(&[BODY_KIND])
    }
}

impl HasBody for Liar {
    fn body(&self) -> Option<&Body> {
        None
    }

    fn body_mut(&mut self) -> Option<&mut Body> {
        None
    }
}

#[test]
#[should_panic(expected = "has no Body component")]
fn member_without_body_is_a_programming_error() {
    let mut scheduler: Scheduler<Liar> = Scheduler::new();
    scheduler.add_system(WorldSystem::new(NoopListener, WorldConfig::default()).unwrap());
    scheduler.add_entity(Liar);
    scheduler.update_systems(FRAME);
}
