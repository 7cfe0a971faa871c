use macroquad::math::{Rect, vec2};
use serde::Deserialize;

use crate::config::HeartTuning;
use crate::player::Player;
use crate::rng::GameRng;

/// Item effects are data, not closures, so the tables stay serializable and
/// the application logic lives in one place.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemEffect {
    DamageReduction { amount: i32 },
    Shield { amount: i32 },
    RevealHint,
    SpotlightBoost { projectile: f32, enemy: f32 },
    StageReset { charges: i32 },
    MoveSpeed { amount: f32 },
}

/// Effects the player cannot hold; raised to the owning session instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionEffect {
    RevealHint,
    SpotlightBoost { projectile: f32, enemy: f32 },
}

impl ItemEffect {
    pub fn apply(&self, player: &mut Player) -> Option<SessionEffect> {
        match *self {
            Self::DamageReduction { amount } => {
                player.damage_reduction += amount;
                None
            }
            Self::Shield { amount } => {
                player.shield += amount;
                None
            }
            Self::RevealHint => Some(SessionEffect::RevealHint),
            Self::SpotlightBoost { projectile, enemy } => {
                Some(SessionEffect::SpotlightBoost { projectile, enemy })
            }
            Self::StageReset { charges } => {
                player.stage_reset_charges += charges;
                None
            }
            Self::MoveSpeed { amount } => {
                player.speed_bonus += amount;
                None
            }
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ItemDef {
    pub name: String,
    pub description: String,
    pub icon: String,
    pub effect: ItemEffect,
}

impl ItemDef {
    pub fn pickup_message(&self) -> String {
        format!("{}: {}", self.name, self.description)
    }
}

#[derive(Clone, Debug)]
pub enum PickupPayload {
    Item(ItemDef),
    Heart { heal: i32 },
}

/// A pickup sits in the world bobbing until the player overlaps it. The
/// sweep happens in combat resolution; `collected` marks it for removal.
#[derive(Clone, Debug)]
pub struct Pickup {
    pub rect: Rect,
    pub payload: PickupPayload,
    pub collected: bool,
    pub icon: Option<String>,
    base_y: f32,
    bob_timer: f32,
    bob_amplitude: f32,
    bob_frequency: f32,
}

impl Pickup {
    pub fn item(x: f32, y: f32, def: ItemDef, rng: &mut GameRng) -> Self {
        Self {
            rect: Rect::new(x, y, 12.0, 12.0),
            icon: Some(def.icon.clone()),
            payload: PickupPayload::Item(def),
            collected: false,
            base_y: y,
            bob_timer: rng.gen_range(0.0, 1.0),
            bob_amplitude: 2.0,
            bob_frequency: 3.0,
        }
    }

    pub fn heart(x: f32, y: f32, tuning: &HeartTuning, rng: &mut GameRng) -> Self {
        Self {
            rect: Rect::new(x, y, tuning.size[0], tuning.size[1]),
            icon: None,
            payload: PickupPayload::Heart { heal: tuning.heal },
            collected: false,
            base_y: y,
            bob_timer: rng.gen_range(0.0, 1.0),
            bob_amplitude: tuning.bob_amplitude,
            bob_frequency: tuning.bob_frequency,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.bob_timer += dt;
        self.rect.y = self.base_y + self.bob_amplitude * (self.bob_timer * self.bob_frequency).sin();
    }

    /// Applies the payload to the player. Returns the user-facing message and
    /// any effect the session has to handle itself.
    pub fn collect(&mut self, player: &mut Player) -> (String, Option<SessionEffect>) {
        self.collected = true;
        match &self.payload {
            PickupPayload::Item(def) => {
                let session = def.effect.apply(player);
                (def.pickup_message(), session)
            }
            PickupPayload::Heart { heal } => {
                player.heal(*heal);
                ("Heart: +1".to_string(), None)
            }
        }
    }

    pub fn center(&self) -> macroquad::math::Vec2 {
        vec2(self.rect.x + self.rect.w * 0.5, self.rect.y + self.rect.h * 0.5)
    }
}
