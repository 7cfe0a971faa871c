use macroquad::math::{Rect, Vec2, vec2};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Strict AABB intersection: rects that merely share an edge do not collide.
/// `Rect::overlaps` counts touching edges, which would make a grounded
/// entity collide with its own floor on the horizontal pass.
pub fn intersects(a: Rect, b: Rect) -> bool {
    a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
}

/// Clamps a moved rect out of every overlapped solid along one axis and kills
/// the velocity component on contact. Returns the resolved rect, the velocity
/// component, and whether a downward contact happened (the ground signal,
/// only ever true on the Y axis).
pub fn resolve_axis(rect: Rect, vel: f32, solids: &[Rect], axis: Axis) -> (Rect, f32, bool) {
    let mut rect = rect;
    let mut vel = vel;
    let mut grounded = false;

    for solid in solids {
        if !intersects(rect, *solid) {
            continue;
        }
        match axis {
            Axis::X => {
                if vel > 0.0 {
                    rect.x = solid.x - rect.w;
                } else if vel < 0.0 {
                    rect.x = solid.x + solid.w;
                }
                vel = 0.0;
            }
            Axis::Y => {
                if vel > 0.0 {
                    rect.y = solid.y - rect.h;
                    grounded = true;
                } else if vel < 0.0 {
                    rect.y = solid.y + solid.h;
                }
                vel = 0.0;
            }
        }
    }

    (rect, vel, grounded)
}

pub fn overlaps_any(rect: Rect, solids: &[Rect]) -> bool {
    solids.iter().any(|solid| intersects(rect, *solid))
}

/// Zero-length-safe normalize. Firing and chase code must never divide by a
/// zero-length direction; the fallback is a defined default such as facing.
pub fn normalize_or(v: Vec2, fallback: Vec2) -> Vec2 {
    if v.length_squared() > 0.0001 {
        v.normalize()
    } else {
        fallback
    }
}

/// Impulse pushing an entity away from a contact on its facing side, with a
/// small upward pop.
pub fn knockback_from(facing: f32, speed: f32, lift: f32) -> Vec2 {
    vec2(-facing * speed, -lift)
}

pub fn rect_centered(center: Vec2, size: Vec2) -> Rect {
    Rect::new(center.x - size.x * 0.5, center.y - size.y * 0.5, size.x, size.y)
}

pub fn rect_center(rect: Rect) -> Vec2 {
    vec2(rect.x + rect.w * 0.5, rect.y + rect.h * 0.5)
}
