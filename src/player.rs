use macroquad::math::{Rect, Vec2, vec2};

use crate::config::{JumpStyle, PlayerTuning};
use crate::game::InputFrame;
use crate::helpers::{Axis, knockback_from, rect_center, rect_centered, resolve_axis};
use crate::projectile::Projectile;
use crate::timer::{TimerKind, Timers};

/// Short-lived melee hitbox, pinned where it was swung.
#[derive(Clone, Copy, Debug)]
pub struct AttackHitbox {
    pub rect: Rect,
    pub remaining: f32,
}

pub struct Player {
    pub rect: Rect,
    pub vel: Vec2,
    pub alive: bool,
    pub facing: f32,
    pub on_ground: bool,
    pub hp: i32,
    pub max_hp: i32,
    pub score: u32,
    pub charging_jump: bool,
    pub jump_charge: f32,
    pub can_air_dash: bool,
    pub anim_timer: f32,
    pub attack_hitboxes: Vec<AttackHitbox>,
    pub timers: Timers,

    // Item-granted stats.
    pub damage_reduction: i32,
    pub shield: i32,
    pub stage_reset_charges: i32,
    pub speed_bonus: f32,

    pub tuning: PlayerTuning,
}

impl Player {
    pub fn new(pos: Vec2, tuning: PlayerTuning) -> Self {
        Self {
            rect: Rect::new(pos.x, pos.y, tuning.size[0], tuning.size[1]),
            vel: Vec2::ZERO,
            alive: true,
            facing: 1.0,
            on_ground: false,
            hp: tuning.max_hp,
            max_hp: tuning.max_hp,
            score: 0,
            charging_jump: false,
            jump_charge: 0.0,
            can_air_dash: true,
            anim_timer: 0.0,
            attack_hitboxes: Vec::new(),
            timers: Timers::new(),
            damage_reduction: 0,
            shield: 0,
            stage_reset_charges: 0,
            speed_bonus: 0.0,
            tuning,
        }
    }

    pub fn center(&self) -> Vec2 {
        rect_center(self.rect)
    }

    pub fn step(&mut self, dt: f32, input: &InputFrame, solids: &[Rect]) {
        self.timers.tick(dt);

        if self.on_ground {
            self.timers.set(TimerKind::Coyote, self.tuning.coyote_time);
            self.can_air_dash = true;
        }
        // Near the jump apex a short grace of reduced gravity eases landings.
        if !self.on_ground && self.vel.y.abs() < self.tuning.hover_threshold {
            self.timers.set(TimerKind::Hover, self.tuning.hover_time);
        }

        if !self.timers.active(TimerKind::DashActive) {
            self.handle_horizontal(dt, input);
        }
        self.handle_jump(dt, input);
        self.try_dash(input);
        self.apply_gravity(dt, input.jump);
        self.move_and_collide(dt, solids);

        for hitbox in &mut self.attack_hitboxes {
            hitbox.remaining -= dt;
        }
        self.attack_hitboxes.retain(|h| h.remaining > 0.0);

        self.anim_timer = if self.vel.x.abs() > 10.0 && self.on_ground {
            self.anim_timer + dt
        } else {
            0.0
        };
    }

    fn handle_horizontal(&mut self, dt: f32, input: &InputFrame) {
        let accel = if self.on_ground {
            self.tuning.ground_accel
        } else {
            self.tuning.air_accel
        };
        let cap = self.max_speed(input.run);

        if input.left && !input.right {
            self.vel.x = (self.vel.x - accel * dt).max(-cap);
            self.facing = -1.0;
        } else if input.right && !input.left {
            self.vel.x = (self.vel.x + accel * dt).min(cap);
            self.facing = 1.0;
        } else if self.on_ground {
            // Decelerate toward zero without ever crossing it.
            if self.vel.x > 0.0 {
                self.vel.x = (self.vel.x - self.tuning.friction * dt).max(0.0);
            } else if self.vel.x < 0.0 {
                self.vel.x = (self.vel.x + self.tuning.friction * dt).min(0.0);
            }
        }
    }

    pub fn max_speed(&self, running: bool) -> f32 {
        let base = if running {
            self.tuning.run_speed
        } else {
            self.tuning.walk_speed
        };
        base + self.speed_bonus
    }

    fn handle_jump(&mut self, dt: f32, input: &InputFrame) {
        match self.tuning.jump_style {
            JumpStyle::Charge => {
                // Landing with the key still held begins a fresh charge.
                if self.on_ground && !self.charging_jump && input.jump {
                    self.charging_jump = true;
                    self.jump_charge = 0.0;
                }
                if self.charging_jump && self.on_ground {
                    self.jump_charge =
                        (self.jump_charge + self.tuning.charge_rate * dt).min(self.tuning.charge_max);
                }
            }
            JumpStyle::Buffered => {
                if self.timers.active(TimerKind::JumpBuffer) && self.timers.active(TimerKind::Coyote)
                {
                    self.vel.y = -self.tuning.jump_speed;
                    self.on_ground = false;
                    // Consumed together; neither survives the launch.
                    self.timers.clear(TimerKind::JumpBuffer);
                    self.timers.clear(TimerKind::Coyote);
                }
            }
        }
    }

    /// Discrete jump key-down.
    pub fn press_jump(&mut self) {
        match self.tuning.jump_style {
            JumpStyle::Charge => {
                if self.on_ground {
                    self.charging_jump = true;
                    self.jump_charge = 0.0;
                }
            }
            JumpStyle::Buffered => {
                self.timers.set(TimerKind::JumpBuffer, self.tuning.jump_buffer);
            }
        }
    }

    /// Discrete jump key-up. Launches a charged jump if the player is still
    /// grounded or inside the coyote window.
    pub fn release_jump(&mut self) {
        if self.tuning.jump_style == JumpStyle::Charge
            && self.charging_jump
            && (self.on_ground || self.timers.active(TimerKind::Coyote))
        {
            let boost = self.charge_boost();
            self.vel.y = -self.tuning.jump_speed * boost;
            self.on_ground = false;
            self.timers.clear(TimerKind::Coyote);
        }
        self.charging_jump = false;
        self.jump_charge = 0.0;
    }

    pub fn charge_ratio(&self) -> f32 {
        if self.tuning.charge_max <= 0.0 {
            return 0.0;
        }
        (self.jump_charge / self.tuning.charge_max).clamp(0.0, 1.0)
    }

    /// 1.0 for a tap (ratio under epsilon, so float noise can't produce a
    /// micro-boost), scaling linearly to `max_boost` at a full charge.
    fn charge_boost(&self) -> f32 {
        let ratio = self.charge_ratio();
        if ratio < self.tuning.charge_epsilon {
            1.0
        } else {
            1.0 + ratio * (self.tuning.max_boost - 1.0)
        }
    }

    fn try_dash(&mut self, input: &InputFrame) {
        if self.timers.active(TimerKind::DashActive)
            || self.timers.active(TimerKind::DashCooldown)
            || !input.run
            || !self.can_air_dash
        {
            return;
        }
        let direction = match (input.left, input.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => return,
        };
        self.vel.x = direction * self.tuning.dash_speed;
        self.facing = direction;
        self.timers.set(TimerKind::DashActive, self.tuning.dash_duration);
        self.timers.set(TimerKind::DashCooldown, self.tuning.dash_cooldown);
        self.timers
            .set(TimerKind::DashInvincible, self.tuning.dash_invincibility);
        self.can_air_dash = false;
    }

    fn apply_gravity(&mut self, dt: f32, jump_held: bool) {
        if self.timers.active(TimerKind::DashActive) {
            return;
        }
        if self.timers.active(TimerKind::Hover) && self.vel.y > 0.0 {
            self.vel.y += self.tuning.gravity * self.tuning.hover_gravity_scale * dt;
        } else if self.vel.y < 0.0 && jump_held {
            self.vel.y += self.tuning.gravity * dt;
        } else {
            self.vel.y += self.tuning.fall_gravity * dt;
        }
    }

    fn move_and_collide(&mut self, dt: f32, solids: &[Rect]) {
        self.rect.x += self.vel.x * dt;
        let (resolved, vx, _) = resolve_axis(self.rect, self.vel.x, solids, Axis::X);
        self.rect = resolved;
        self.vel.x = vx;

        self.rect.y += self.vel.y * dt;
        self.on_ground = false;
        let (resolved, vy, grounded) = resolve_axis(self.rect, self.vel.y, solids, Axis::Y);
        self.rect = resolved;
        self.vel.y = vy;
        if grounded {
            self.on_ground = true;
        }
    }

    /// Cooldown-gated melee swing. Returns whether a hitbox spawned.
    pub fn try_attack(&mut self) -> bool {
        if self.timers.active(TimerKind::Attack) {
            return false;
        }
        self.timers.set(TimerKind::Attack, self.tuning.attack_cooldown);
        let center = self.center() + vec2(self.facing * self.tuning.attack_reach, 0.0);
        self.attack_hitboxes.push(AttackHitbox {
            rect: rect_centered(center, Vec2::from(self.tuning.attack_size)),
            remaining: self.tuning.attack_duration,
        });
        true
    }

    /// Cooldown-gated shot. `dir` comes from held arrows and may be zero;
    /// the fallback is the facing direction.
    pub fn try_fire(&mut self, dir: Vec2, speed_bonus: f32) -> Option<Projectile> {
        if self.timers.active(TimerKind::Fire) {
            return None;
        }
        self.timers.set(TimerKind::Fire, self.tuning.fire_cooldown);
        Some(Projectile::fire(
            self.center(),
            dir,
            vec2(self.facing, 0.0),
            self.tuning.projectile_speed + speed_bonus,
            self.tuning.projectile_size,
        ))
    }

    /// A hit checks invincibility, then shield charges, then damage
    /// reduction. Any accepted hit opens the invincibility window, even one
    /// fully absorbed, so contact can't grind hp down through repeat touches.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if self.timers.active(TimerKind::Invincible)
            || self.timers.active(TimerKind::DashInvincible)
        {
            return false;
        }
        if self.shield > 0 {
            self.shield -= 1;
        } else {
            let reduced = (amount - self.damage_reduction).max(0);
            self.hp = (self.hp - reduced).max(0);
        }
        self.timers.set(TimerKind::Invincible, self.tuning.invincibility);
        true
    }

    pub fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Impulse away from the facing direction.
    pub fn apply_knockback(&mut self) {
        self.vel = knockback_from(
            self.facing,
            self.tuning.knockback_speed,
            self.tuning.knockback_lift,
        );
    }

    pub fn invincible(&self) -> bool {
        self.timers.active(TimerKind::Invincible) || self.timers.active(TimerKind::DashInvincible)
    }

    /// Render-layer flag: blink while invincible, keyed off timer parity.
    pub fn should_blink(&self) -> bool {
        self.invincible() && (self.timers.get(TimerKind::Invincible) * 10.0) as i32 % 2 == 0
    }

    pub fn respawn_at(&mut self, pos: Vec2) {
        self.rect.x = pos.x;
        self.rect.y = pos.y;
        self.vel = Vec2::ZERO;
        self.charging_jump = false;
        self.jump_charge = 0.0;
    }
}
