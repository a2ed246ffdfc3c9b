//! Pairwise resolution of two overlapping collision boxes.

use crate::body::{Body, BodyType, Direction};
use crate::geometry::Rect;

/// Resolve one overlapping pair.
///
/// A wider-than-tall overlap is treated as a vertical contact, anything else
/// as horizontal. Both bodies get their directional flags set and pick up
/// the partner's friction on the axis parallel to the shared surface. Only a
/// Dynamic/Static pair is separated, by moving the dynamic body out along the
/// contact axis by the overlap extent.
pub(crate) fn resolve_collision(a: &mut Body, b: &mut Body, overlap: &Rect) {
    let push = match (a.body_type, b.body_type) {
        (BodyType::Dynamic, BodyType::Static) => Push::A,
        (BodyType::Static, BodyType::Dynamic) => Push::B,
        _ => Push::Neither,
    };

    if overlap.width > overlap.height {
        if a.collision_box.y > b.collision_box.y {
            if a.velocity.y <= 0.0 {
                a.add_resistance_x(b.friction.x);
            }
            if b.velocity.y >= 0.0 {
                b.add_resistance_x(a.friction.x);
            }
            a.set_colliding(Direction::Down);
            b.set_colliding(Direction::Up);
            match push {
                Push::A => a.collision_box.y += overlap.height,
                Push::B => b.collision_box.y -= overlap.height,
                Push::Neither => {}
            }
        } else {
            if a.velocity.y > 0.0 {
                a.add_resistance_x(b.friction.x);
            }
            if b.velocity.y < 0.0 {
                b.add_resistance_x(a.friction.x);
            }
            a.set_colliding(Direction::Up);
            b.set_colliding(Direction::Down);
            match push {
                Push::A => a.collision_box.y -= overlap.height,
                Push::B => b.collision_box.y += overlap.height,
                Push::Neither => {}
            }
        }
    } else if a.collision_box.x > b.collision_box.x {
        if a.velocity.x < 0.0 {
            a.add_resistance_y(b.friction.y);
        }
        if b.velocity.x > 0.0 {
            b.add_resistance_y(a.friction.y);
        }
        a.set_colliding(Direction::Left);
        b.set_colliding(Direction::Right);
        match push {
            Push::A => a.collision_box.x += overlap.width,
            Push::B => b.collision_box.x -= overlap.width,
            Push::Neither => {}
        }
    } else {
        if a.velocity.x > 0.0 {
            a.add_resistance_y(b.friction.y);
        }
        if b.velocity.x < 0.0 {
            b.add_resistance_y(a.friction.y);
        }
        a.set_colliding(Direction::Right);
        b.set_colliding(Direction::Left);
        match push {
            Push::A => a.collision_box.x -= overlap.width,
            Push::B => b.collision_box.x += overlap.width,
            Push::Neither => {}
        }
    }
}

/// Which side of the pair, if any, gets separated.
#[derive(Clone, Copy)]
enum Push {
    A,
    B,
    Neither,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
