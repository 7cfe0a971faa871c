use macroquad::math::{Rect, Vec2};

use crate::helpers::{intersects, normalize_or, overlaps_any};

/// Player shot. Flies straight, dies on the first solid it touches or when it
/// leaves the level bounds.
#[derive(Clone, Debug)]
pub struct Projectile {
    pub rect: Rect,
    pub vel: Vec2,
    pub alive: bool,
}

impl Projectile {
    /// `dir` may come straight from held arrow keys; a zero vector falls back
    /// to `facing_dir` so a shot always has a defined direction.
    pub fn fire(center: Vec2, dir: Vec2, facing_dir: Vec2, speed: f32, size: f32) -> Self {
        let dir = normalize_or(dir, facing_dir);
        Self {
            rect: Rect::new(center.x - size * 0.5, center.y - size * 0.5, size, size),
            vel: dir * speed,
            alive: true,
        }
    }

    pub fn update(&mut self, dt: f32, solids: &[Rect], bounds: Rect) {
        if !self.alive {
            return;
        }
        self.rect.x += self.vel.x * dt;
        self.rect.y += self.vel.y * dt;

        if overlaps_any(self.rect, solids) || !intersects(bounds, self.rect) {
            self.alive = false;
        }
    }
}
