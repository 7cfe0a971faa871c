use macroquad::math::{Rect, Vec2, vec2};
use serde::Deserialize;

use crate::helpers::{rect_center, rect_centered};
use crate::rng::GameRng;

/// Where a pattern's rects are pinned at invocation time. Rects are never
/// re-aimed afterward; moving after the telegraph appears is the dodge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Boss,
    Player,
    BelowBoss,
    /// Full level width at the player's row. `size.x` is ignored.
    PlayerRow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mirror {
    /// Flip the x offset onto the player's side of the anchor.
    TowardPlayer,
    /// Flip the x offset on a coin toss.
    Random,
}

/// A geometry template. One executor interprets these for every boss, so a
/// new attack is a table row, not code.
#[derive(Clone, Debug, Deserialize)]
pub struct PatternTemplate {
    pub weight: f32,
    pub anchor: Anchor,
    #[serde(default)]
    pub offset: [f32; 2],
    #[serde(default)]
    pub jitter: [f32; 2],
    pub size: [f32; 2],
    #[serde(default)]
    pub mirror: Option<Mirror>,
    pub telegraph: f32,
    pub strike: f32,
    pub damage: i32,
    #[serde(default = "default_telegraph_color")]
    pub telegraph_color: [u8; 3],
    #[serde(default = "default_strike_color")]
    pub strike_color: [u8; 3],
}

fn default_telegraph_color() -> [u8; 3] {
    [220, 200, 80]
}

fn default_strike_color() -> [u8; 3] {
    [220, 80, 80]
}

#[derive(Clone, Debug, Deserialize)]
pub struct PhaseSpec {
    pub cooldown: f32,
    pub patterns: Vec<PatternTemplate>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BossArchetype {
    pub name: String,
    pub size: [f32; 2],
    pub max_hp: i32,
    pub color: [u8; 3],
    #[serde(default = "default_contact_damage")]
    pub contact_damage: i32,
    pub phases: Vec<PhaseSpec>,
}

fn default_contact_damage() -> i32 {
    1
}

/// Warning region. Never damages; it exists so the renderer can show where
/// the strike will land while the strike's delay runs.
#[derive(Clone, Debug)]
pub struct Telegraph {
    pub rect: Rect,
    pub remaining: f32,
    pub color: [u8; 3],
}

/// Damaging region. Armed only once `delay` (the telegraph window) has
/// elapsed, then live for `remaining` seconds.
#[derive(Clone, Debug)]
pub struct AttackRegion {
    pub rect: Rect,
    pub delay: f32,
    pub remaining: f32,
    pub damage: i32,
    pub color: [u8; 3],
}

impl AttackRegion {
    pub fn active(&self) -> bool {
        self.delay <= 0.0 && self.remaining > 0.0
    }
}

pub struct Boss {
    pub rect: Rect,
    pub alive: bool,
    pub hp: i32,
    pub max_hp: i32,
    pub attack_timer: f32,
    pub telegraphs: Vec<Telegraph>,
    pub attacks: Vec<AttackRegion>,
    archetype: BossArchetype,
}

impl Boss {
    pub fn spawn(x: f32, y: f32, archetype: BossArchetype) -> Self {
        debug_assert!(archetype.max_hp > 0, "boss archetype needs positive hp");
        let first_cooldown = archetype.phases.first().map(|p| p.cooldown).unwrap_or(1.0);
        Self {
            rect: Rect::new(x, y, archetype.size[0], archetype.size[1]),
            alive: true,
            hp: archetype.max_hp,
            max_hp: archetype.max_hp,
            attack_timer: first_cooldown,
            telegraphs: Vec::new(),
            attacks: Vec::new(),
            archetype,
        }
    }

    pub fn name(&self) -> &str {
        &self.archetype.name
    }

    pub fn color(&self) -> [u8; 3] {
        self.archetype.color
    }

    pub fn contact_damage(&self) -> i32 {
        self.archetype.contact_damage
    }

    /// Pure function of the hp ratio, strict `>` on both boundaries: a boss
    /// at exactly 0.7 is phase 2, at exactly 0.3 phase 3. No hysteresis.
    pub fn phase(&self) -> u32 {
        let ratio = self.hp as f32 / self.max_hp as f32;
        if ratio > 0.7 {
            1
        } else if ratio > 0.3 {
            2
        } else {
            3
        }
    }

    pub fn apply_damage(&mut self, amount: i32) {
        self.hp = (self.hp - amount).max(0);
        if self.hp == 0 {
            self.alive = false;
        }
    }

    pub fn step(&mut self, dt: f32, player_rect: Rect, level_width: f32, rng: &mut GameRng) {
        if !self.alive {
            return;
        }

        for telegraph in &mut self.telegraphs {
            telegraph.remaining -= dt;
        }
        self.telegraphs.retain(|t| t.remaining > 0.0);

        for attack in &mut self.attacks {
            if attack.delay > 0.0 {
                attack.delay -= dt;
            } else {
                attack.remaining -= dt;
            }
        }
        self.attacks.retain(|a| a.delay > 0.0 || a.remaining > 0.0);

        self.attack_timer -= dt;
        if self.attack_timer > 0.0 {
            return;
        }

        let phase = self.phase() as usize;
        let Some(spec) = self
            .archetype
            .phases
            .get(phase - 1)
            .or_else(|| self.archetype.phases.last())
        else {
            return;
        };
        if spec.patterns.is_empty() {
            return;
        }

        // Phase 1 always opens with its one rehearsed pattern; later phases
        // draw from the weighted table.
        let idx = if phase == 1 {
            0
        } else {
            let weights: Vec<f32> = spec.patterns.iter().map(|p| p.weight).collect();
            rng.weighted_index(&weights)
        };
        let cooldown = spec.cooldown;
        let pattern = spec.patterns[idx].clone();
        self.execute(&pattern, player_rect, level_width, rng);
        self.attack_timer = cooldown;
    }

    fn execute(
        &mut self,
        pattern: &PatternTemplate,
        player_rect: Rect,
        level_width: f32,
        rng: &mut GameRng,
    ) {
        let boss_center = rect_center(self.rect);
        let player_center = rect_center(player_rect);

        let side = match pattern.mirror {
            Some(Mirror::TowardPlayer) => {
                if player_center.x >= boss_center.x {
                    1.0
                } else {
                    -1.0
                }
            }
            Some(Mirror::Random) => {
                if rng.chance(0.5) {
                    1.0
                } else {
                    -1.0
                }
            }
            None => 1.0,
        };

        let mut offset = vec2(pattern.offset[0] * side, pattern.offset[1]);
        if pattern.jitter[0] > 0.0 {
            offset.x += rng.gen_range(-pattern.jitter[0], pattern.jitter[0]);
        }
        if pattern.jitter[1] > 0.0 {
            offset.y += rng.gen_range(-pattern.jitter[1], pattern.jitter[1]);
        }

        let size = Vec2::from(pattern.size);
        let rect = match pattern.anchor {
            Anchor::Boss => rect_centered(boss_center + offset, size),
            Anchor::Player => rect_centered(player_center + offset, size),
            Anchor::BelowBoss => {
                let foot = vec2(boss_center.x, self.rect.y + self.rect.h);
                rect_centered(foot + offset, size)
            }
            Anchor::PlayerRow => Rect::new(
                0.0,
                player_center.y + offset.y - size.y * 0.5,
                level_width,
                size.y,
            ),
        };

        self.telegraphs.push(Telegraph {
            rect,
            remaining: pattern.telegraph,
            color: pattern.telegraph_color,
        });
        self.attacks.push(AttackRegion {
            rect,
            delay: pattern.telegraph,
            remaining: pattern.strike,
            damage: pattern.damage,
            color: pattern.strike_color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    fn director() -> Boss {
        let config = GameConfig::builtin();
        Boss::spawn(300.0, 100.0, config.archetype("Director").unwrap().clone())
    }

    fn player_rect() -> Rect {
        Rect::new(100.0, 120.0, 18.0, 24.0)
    }

    #[test]
    fn phase_is_a_pure_function_of_hp_ratio() {
        let mut boss = director();
        assert_eq!(boss.max_hp, 20);

        boss.hp = 15; // 0.75
        assert_eq!(boss.phase(), 1);
        boss.hp = 14; // exactly 0.7: strict `>` puts this in phase 2
        assert_eq!(boss.phase(), 2);
        boss.hp = 10; // 0.5
        assert_eq!(boss.phase(), 2);
        boss.hp = 6; // exactly 0.3: phase 3
        assert_eq!(boss.phase(), 3);
        boss.hp = 4; // 0.2
        assert_eq!(boss.phase(), 3);
    }

    #[test]
    fn attack_fires_after_cooldown_and_spawns_a_pair() {
        let mut boss = director();
        let mut rng = GameRng::new(1);
        let dt = 1.0 / 60.0;
        let mut frames = 0;
        while boss.attacks.is_empty() {
            boss.step(dt, player_rect(), 1920.0, &mut rng);
            frames += 1;
            assert!(frames < 600, "boss never attacked");
        }
        assert_eq!(boss.telegraphs.len(), 1);
        assert_eq!(boss.attacks.len(), 1);
        // Phase 1 Director opens with the full-width beam on the player row.
        let attack = &boss.attacks[0];
        assert_eq!(attack.rect.w, 1920.0);
        assert!((attack.rect.y + attack.rect.h * 0.5 - 132.0).abs() < 1e-3);
    }

    #[test]
    fn strike_is_inert_until_the_telegraph_window_passes() {
        let mut boss = director();
        let mut rng = GameRng::new(1);
        let dt = 1.0 / 60.0;
        while boss.attacks.is_empty() {
            boss.step(dt, player_rect(), 1920.0, &mut rng);
        }
        assert!(!boss.attacks[0].active());

        // Phase 1 telegraph lasts 0.4s; step past it.
        for _ in 0..30 {
            boss.step(dt, player_rect(), 1920.0, &mut rng);
        }
        assert!(boss.attacks.iter().any(AttackRegion::active));
    }

    #[test]
    fn expired_regions_are_swept() {
        let mut boss = director();
        let mut rng = GameRng::new(1);
        while boss.attacks.is_empty() {
            boss.step(1.0 / 60.0, player_rect(), 1920.0, &mut rng);
        }
        // Two long steps burn through the telegraph window and then the
        // strike window, both inside the phase-1 cooldown of 1.6s.
        boss.step(1.0, player_rect(), 1920.0, &mut rng);
        assert!(boss.telegraphs.is_empty());
        assert_eq!(boss.attacks.len(), 1);
        boss.step(0.4, player_rect(), 1920.0, &mut rng);
        assert!(boss.attacks.is_empty());
    }

    #[test]
    fn damage_floors_at_zero_and_kills() {
        let mut boss = director();
        boss.apply_damage(19);
        assert!(boss.alive);
        boss.apply_damage(5);
        assert_eq!(boss.hp, 0);
        assert!(!boss.alive);
        // Dead bosses stop acting.
        let mut rng = GameRng::new(1);
        boss.step(10.0, player_rect(), 1920.0, &mut rng);
        assert!(boss.attacks.is_empty());
    }

    #[test]
    fn cooldowns_shrink_as_phases_advance() {
        let config = GameConfig::builtin();
        let arch = config.archetype("Dancer").unwrap();
        assert!(arch.phases[0].cooldown > arch.phases[2].cooldown);
    }

    #[test]
    fn pattern_selection_is_deterministic_under_seed() {
        let run = |seed: u64| -> Vec<f32> {
            let mut boss = director();
            boss.hp = 5; // phase 3: weighted three-way draws
            let mut rng = GameRng::new(seed);
            let mut xs = Vec::new();
            for _ in 0..600 {
                let before = boss.attacks.len();
                boss.step(1.0 / 60.0, player_rect(), 1920.0, &mut rng);
                if boss.attacks.len() > before {
                    xs.push(boss.attacks.last().unwrap().rect.x);
                }
            }
            xs
        };
        assert_eq!(run(77), run(77));
        assert!(!run(77).is_empty());
    }
}
