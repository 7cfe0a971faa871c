use serde::Deserialize;

use crate::boss::BossArchetype;
use crate::enemy::EnemyKind;
use crate::item::ItemDef;

const BUILTIN_GAME_YAML: &str = include_str!("data/game.yaml");
const BUILTIN_STAGE_JSON: &str = include_str!("data/stage.json");

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Yaml(err) => write!(f, "yaml error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Yaml(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// The two shipped modes share one engine. `Stage` is the side-scrolling
/// platformer (charge jumps, melee, one long level); `Rooms` is the room-grid
/// combat mode (buffered jumps, projectiles, floors of rooms).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameMode {
    Stage,
    Rooms,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JumpStyle {
    /// Hold to charge while grounded, release to launch with a charge boost.
    Charge,
    /// Press buffers a jump; it fires when buffer and coyote overlap.
    Buffered,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub size: [f32; 2],
    pub walk_speed: f32,
    pub run_speed: f32,
    pub ground_accel: f32,
    pub air_accel: f32,
    pub friction: f32,
    pub jump_style: JumpStyle,
    pub jump_speed: f32,
    pub charge_rate: f32,
    pub charge_max: f32,
    pub charge_epsilon: f32,
    pub max_boost: f32,
    pub gravity: f32,
    pub fall_gravity: f32,
    pub hover_time: f32,
    pub hover_threshold: f32,
    pub hover_gravity_scale: f32,
    pub coyote_time: f32,
    pub jump_buffer: f32,
    pub dash_speed: f32,
    pub dash_duration: f32,
    pub dash_cooldown: f32,
    pub dash_invincibility: f32,
    pub attack_cooldown: f32,
    pub attack_duration: f32,
    pub attack_reach: f32,
    pub attack_size: [f32; 2],
    pub max_hp: i32,
    pub invincibility: f32,
    pub knockback_speed: f32,
    pub knockback_lift: f32,
    pub fire_cooldown: f32,
    pub projectile_speed: f32,
    pub projectile_size: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size: [18.0, 24.0],
            walk_speed: 140.0,
            run_speed: 200.0,
            ground_accel: 1400.0,
            air_accel: 1000.0,
            friction: 1600.0,
            jump_style: JumpStyle::Charge,
            jump_speed: 280.0,
            charge_rate: 2.0,
            charge_max: 0.7,
            charge_epsilon: 0.05,
            max_boost: 1.3,
            gravity: 900.0,
            fall_gravity: 1700.0,
            hover_time: 0.08,
            hover_threshold: 15.0,
            hover_gravity_scale: 0.3,
            coyote_time: 0.12,
            jump_buffer: 0.12,
            dash_speed: 320.0,
            dash_duration: 0.14,
            dash_cooldown: 0.7,
            dash_invincibility: 0.2,
            attack_cooldown: 0.3,
            attack_duration: 0.12,
            attack_reach: 18.0,
            attack_size: [30.0, 18.0],
            max_hp: 5,
            invincibility: 0.5,
            knockback_speed: 180.0,
            knockback_lift: 120.0,
            fire_cooldown: 0.35,
            projectile_speed: 260.0,
            projectile_size: 6.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct PatrollerTuning {
    pub size: [f32; 2],
    pub speed: f32,
    pub hp: i32,
    pub combat_hp: i32,
    pub contact_damage: i32,
    pub ledge_probe: f32,
    pub drop_chance: f32,
}

impl Default for PatrollerTuning {
    fn default() -> Self {
        Self {
            size: [14.0, 14.0],
            speed: 55.0,
            hp: 1,
            combat_hp: 3,
            contact_damage: 1,
            ledge_probe: 8.0,
            drop_chance: 0.25,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChaserTuning {
    pub size: [f32; 2],
    pub speed: f32,
    pub hp: i32,
    pub combat_hp: i32,
    pub contact_damage: i32,
    pub drop_chance: f32,
}

impl Default for ChaserTuning {
    fn default() -> Self {
        Self {
            size: [14.0, 14.0],
            speed: 55.0,
            hp: 1,
            combat_hp: 3,
            contact_damage: 1,
            drop_chance: 0.25,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DasherTuning {
    pub size: [f32; 2],
    pub speed: f32,
    pub hp: i32,
    pub combat_hp: i32,
    pub contact_damage: i32,
    pub cooldown: f32,
    pub dash_duration: f32,
    pub dash_multiplier: f32,
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
    pub drop_chance: f32,
}

impl Default for DasherTuning {
    fn default() -> Self {
        Self {
            size: [14.0, 14.0],
            speed: 80.0,
            hp: 1,
            combat_hp: 2,
            contact_damage: 1,
            cooldown: 1.2,
            dash_duration: 0.32,
            dash_multiplier: 2.4,
            bob_amplitude: 2.0,
            bob_frequency: 3.0,
            drop_chance: 0.25,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    pub patroller: PatrollerTuning,
    pub chaser: ChaserTuning,
    pub dasher: DasherTuning,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HeartTuning {
    pub size: [f32; 2],
    pub heal: i32,
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
}

impl Default for HeartTuning {
    fn default() -> Self {
        Self {
            size: [12.0, 12.0],
            heal: 1,
            bob_amplitude: 2.0,
            bob_frequency: 3.0,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerTuning,
    pub combat_player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub heart: HeartTuning,
    pub items: Vec<ItemDef>,
    pub bosses: Vec<BossArchetype>,
}

impl GameConfig {
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&source)
    }

    /// The tables shipped with the crate. These are compiled in, so a parse
    /// failure here is a build defect, not a runtime condition.
    pub fn builtin() -> Self {
        Self::from_yaml_str(BUILTIN_GAME_YAML).unwrap_or_else(|err| {
            eprintln!("builtin game.yaml is invalid: {err}");
            panic!("builtin config failed to parse");
        })
    }

    pub fn archetype(&self, name: &str) -> Option<&BossArchetype> {
        self.bosses.iter().find(|b| b.name == name)
    }

    pub fn player_for(&self, mode: GameMode) -> &PlayerTuning {
        match mode {
            GameMode::Stage => &self.player,
            GameMode::Rooms => &self.combat_player,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct EnemySpawn {
    pub x: i32,
    pub y: i32,
    pub kind: EnemyKind,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BossSpawn {
    pub x: i32,
    pub y: i32,
    pub archetype: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Sign {
    pub x: i32,
    pub y: i32,
    pub text: String,
}

/// Stage layout document, the JSON companion to the YAML tuning tables.
/// Coordinates are in tiles; the grid builder converts to pixels.
#[derive(Clone, Debug, Deserialize)]
pub struct StageLayout {
    pub tile_size: f32,
    pub width: usize,
    pub height: usize,
    #[serde(default = "default_ground_rows")]
    pub ground_rows: usize,
    #[serde(default)]
    pub platforms: Vec<(usize, usize, usize)>,
    #[serde(default)]
    pub pits: Vec<(usize, usize)>,
    pub spawn: (i32, i32),
    #[serde(default)]
    pub checkpoints: Vec<(i32, i32)>,
    #[serde(default)]
    pub enemy_spawns: Vec<EnemySpawn>,
    #[serde(default)]
    pub item_spawns: Vec<(i32, i32)>,
    pub exit: (i32, i32, i32, i32),
    #[serde(default)]
    pub boss: Option<BossSpawn>,
    #[serde(default)]
    pub signs: Vec<Sign>,
    #[serde(default)]
    pub prop_count: usize,
    /// Pixels below the level bottom at which falling entities are culled.
    #[serde(default = "default_kill_depth")]
    pub kill_depth: f32,
}

fn default_ground_rows() -> usize {
    2
}

fn default_kill_depth() -> f32 {
    64.0
}

impl StageLayout {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json_str(&source)
    }

    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_STAGE_JSON).unwrap_or_else(|err| {
            eprintln!("builtin stage.json is invalid: {err}");
            panic!("builtin stage layout failed to parse");
        })
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_parse() {
        let config = GameConfig::builtin();
        assert_eq!(config.bosses.len(), 5);
        assert_eq!(config.items.len(), 6);
        assert_eq!(config.player.jump_style, JumpStyle::Charge);
        assert_eq!(config.combat_player.jump_style, JumpStyle::Buffered);
        assert_eq!(config.combat_player.max_hp, 4);
        assert!(config.archetype("Director").is_some());
        assert!(config.archetype("Understudy").is_none());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = GameConfig::from_yaml_str("player:\n  walk_speed: 99\n").unwrap();
        assert_eq!(config.player.walk_speed, 99.0);
        assert_eq!(config.player.run_speed, 200.0);
        assert!(config.bosses.is_empty());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let err = GameConfig::from_yaml_str("player: [not, a, map]").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn builtin_stage_layout_parses() {
        let stage = StageLayout::builtin();
        assert_eq!(stage.tile_size, 16.0);
        assert_eq!(stage.width, 120);
        assert_eq!(stage.platforms.len(), 8);
        assert_eq!(stage.checkpoints.len(), 3);
        assert!(stage.boss.is_some());
        assert_eq!(stage.pixel_width(), 1920.0);
    }

    #[test]
    fn stage_layout_defaults_optional_fields() {
        let stage = StageLayout::from_json_str(
            r#"{"tile_size": 16, "width": 10, "height": 8, "spawn": [1, 5], "exit": [8, 4, 1, 2]}"#,
        )
        .unwrap();
        assert_eq!(stage.ground_rows, 2);
        assert!(stage.platforms.is_empty());
        assert_eq!(stage.kill_depth, 64.0);
    }

    #[test]
    fn malformed_stage_json_is_an_error() {
        let err = StageLayout::from_json_str("{\"tile_size\": }").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn builtin_boss_phases_are_complete() {
        let config = GameConfig::builtin();
        for boss in &config.bosses {
            assert_eq!(boss.phases.len(), 3, "{} needs three phases", boss.name);
            assert_eq!(boss.phases[0].patterns.len(), 1);
            assert!(boss.phases[1].patterns.len() >= 2);
            assert!(boss.phases[2].patterns.len() >= 3);
            // Difficulty ramps by shrinking the attack cooldown.
            assert!(boss.phases[0].cooldown > boss.phases[1].cooldown);
            assert!(boss.phases[1].cooldown > boss.phases[2].cooldown);
        }
    }
}
