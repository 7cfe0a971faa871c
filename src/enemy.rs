use macroquad::math::{Rect, Vec2};
use serde::Deserialize;

use crate::config::{EnemyTuning, GameMode};
use crate::helpers::{Axis, intersects, rect_center, resolve_axis};
use crate::rng::GameRng;
use crate::world::TileGrid;

const ENEMY_GRAVITY: f32 = 900.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Patroller,
    Chaser,
    Dasher,
}

/// Per-kind behavior state. Each brain carries only the fields its behavior
/// needs; shared fields live on `Enemy`.
#[derive(Clone, Debug)]
enum Brain {
    /// Walks a platform, reversing at walls and ledges.
    Patrol { direction: f32, probe: f32 },
    /// Steers toward the player's x. No ledge check; pursuit wins.
    Chase,
    /// Floats with a sinusoidal bob, periodically dashing at the player.
    Dash {
        cooldown: f32,
        timer: f32,
        dashing: bool,
        dash_left: f32,
        dash_duration: f32,
        multiplier: f32,
        direction: f32,
        base_y: f32,
        bob_timer: f32,
        bob_amplitude: f32,
        bob_frequency: f32,
    },
}

#[derive(Clone, Debug)]
pub struct Enemy {
    pub rect: Rect,
    pub vel: Vec2,
    pub hp: i32,
    pub alive: bool,
    pub kind: EnemyKind,
    pub contact_damage: i32,
    pub drop_chance: f32,
    pub anim_timer: f32,
    speed: f32,
    brain: Brain,
}

impl Enemy {
    pub fn spawn(
        kind: EnemyKind,
        x: f32,
        y: f32,
        tuning: &EnemyTuning,
        mode: GameMode,
        rng: &mut GameRng,
    ) -> Self {
        match kind {
            EnemyKind::Patroller => {
                let t = &tuning.patroller;
                Self {
                    rect: Rect::new(x, y, t.size[0], t.size[1]),
                    vel: Vec2::ZERO,
                    hp: hp_for(mode, t.hp, t.combat_hp),
                    alive: true,
                    kind,
                    contact_damage: t.contact_damage,
                    drop_chance: t.drop_chance,
                    anim_timer: 0.0,
                    speed: t.speed,
                    brain: Brain::Patrol { direction: -1.0, probe: t.ledge_probe },
                }
            }
            EnemyKind::Chaser => {
                let t = &tuning.chaser;
                Self {
                    rect: Rect::new(x, y, t.size[0], t.size[1]),
                    vel: Vec2::ZERO,
                    hp: hp_for(mode, t.hp, t.combat_hp),
                    alive: true,
                    kind,
                    contact_damage: t.contact_damage,
                    drop_chance: t.drop_chance,
                    anim_timer: 0.0,
                    speed: t.speed,
                    brain: Brain::Chase,
                }
            }
            EnemyKind::Dasher => {
                let t = &tuning.dasher;
                Self {
                    rect: Rect::new(x, y, t.size[0], t.size[1]),
                    vel: Vec2::ZERO,
                    hp: hp_for(mode, t.hp, t.combat_hp),
                    alive: true,
                    kind,
                    contact_damage: t.contact_damage,
                    drop_chance: t.drop_chance,
                    anim_timer: 0.0,
                    speed: t.speed,
                    brain: Brain::Dash {
                        cooldown: t.cooldown,
                        timer: t.cooldown,
                        dashing: false,
                        dash_left: 0.0,
                        dash_duration: t.dash_duration,
                        multiplier: t.dash_multiplier,
                        direction: 1.0,
                        base_y: y,
                        bob_timer: rng.gen_range(0.0, 1.0),
                        bob_amplitude: t.bob_amplitude,
                        bob_frequency: t.bob_frequency,
                    },
                }
            }
        }
    }

    pub fn center(&self) -> Vec2 {
        rect_center(self.rect)
    }

    pub fn take_damage(&mut self, amount: i32) {
        self.hp = (self.hp - amount).max(0);
        if self.hp == 0 {
            self.alive = false;
        }
    }

    pub fn step(
        &mut self,
        dt: f32,
        grid: &TileGrid,
        solids: &[Rect],
        player_center: Vec2,
        speed_bonus: f32,
    ) {
        if !self.alive {
            return;
        }
        let speed = self.speed + speed_bonus;
        match &mut self.brain {
            Brain::Patrol { direction, probe } => {
                self.vel.x = *direction * speed;
                self.rect.x += self.vel.x * dt;
                self.anim_timer = if self.vel.x.abs() > 1.0 { self.anim_timer + dt } else { 0.0 };

                let mut hit_wall = false;
                for solid in solids {
                    if intersects(self.rect, *solid) {
                        hit_wall = true;
                        if self.vel.x > 0.0 {
                            self.rect.x = solid.x - self.rect.w;
                        } else {
                            self.rect.x = solid.x + solid.w;
                        }
                    }
                }
                if hit_wall {
                    *direction = -*direction;
                } else {
                    // Probe one pixel under the leading edge; stepping onto
                    // empty air means a ledge, so turn around.
                    let front_x = self.rect.x + self.rect.w * 0.5 + *direction * *probe;
                    let front_y = self.rect.y + self.rect.h + 1.0;
                    if !grid.is_solid_at(front_x, front_y) {
                        *direction = -*direction;
                    }
                }
                self.fall(dt, solids);
            }
            Brain::Chase => {
                let dx = player_center.x - (self.rect.x + self.rect.w * 0.5);
                self.vel.x = if dx.abs() > 1.0 { dx.signum() * speed } else { 0.0 };
                self.rect.x += self.vel.x * dt;
                self.anim_timer = if self.vel.x.abs() > 1.0 { self.anim_timer + dt } else { 0.0 };
                let (resolved, vx, _) = resolve_axis(self.rect, self.vel.x, solids, Axis::X);
                self.rect = resolved;
                self.vel.x = vx;
                self.fall(dt, solids);
            }
            Brain::Dash {
                cooldown,
                timer,
                dashing,
                dash_left,
                dash_duration,
                multiplier,
                direction,
                base_y,
                bob_timer,
                bob_amplitude,
                bob_frequency,
            } => {
                *bob_timer += dt;
                self.anim_timer += dt;
                self.rect.y = *base_y + *bob_amplitude * (*bob_timer * *bob_frequency).sin();

                if *dashing {
                    *dash_left -= dt;
                    self.vel.x = speed * *multiplier * *direction;
                    self.rect.x += self.vel.x * dt;
                    for solid in solids {
                        if intersects(self.rect, *solid) {
                            if *direction > 0.0 {
                                self.rect.x = solid.x - self.rect.w;
                            } else {
                                self.rect.x = solid.x + solid.w;
                            }
                            // A wall ends the dash outright; it does not
                            // resume after the cooldown.
                            *dashing = false;
                            *timer = *cooldown;
                        }
                    }
                    if *dash_left <= 0.0 {
                        *dashing = false;
                        *timer = *cooldown;
                    }
                    return;
                }

                *timer -= dt;
                self.vel.x = 0.0;
                if *timer <= 0.0 {
                    *direction = if player_center.x > self.rect.x + self.rect.w * 0.5 {
                        1.0
                    } else {
                        -1.0
                    };
                    *dashing = true;
                    *dash_left = *dash_duration;
                }
            }
        }
    }

    /// Grounded kinds fall until they land; keeps spawn points forgiving.
    fn fall(&mut self, dt: f32, solids: &[Rect]) {
        self.vel.y += ENEMY_GRAVITY * dt;
        self.rect.y += self.vel.y * dt;
        let (resolved, vy, _) = resolve_axis(self.rect, self.vel.y, solids, Axis::Y);
        self.rect = resolved;
        self.vel.y = vy;
    }

    pub fn is_dashing(&self) -> bool {
        matches!(self.brain, Brain::Dash { dashing: true, .. })
    }

    #[cfg(test)]
    fn dash_timer(&self) -> f32 {
        match self.brain {
            Brain::Dash { timer, .. } => timer,
            _ => 0.0,
        }
    }
}

fn hp_for(mode: GameMode, stage_hp: i32, combat_hp: i32) -> i32 {
    match mode {
        GameMode::Stage => stage_hp,
        GameMode::Rooms => combat_hp,
    }
}
