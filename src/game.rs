use std::panic::{self, AssertUnwindSafe};

use macroquad::math::{Vec2, vec2};

use crate::combat;
use crate::config::{GameConfig, GameMode, StageLayout};
use crate::helpers::intersects;
use crate::item::SessionEffect;
use crate::player::Player;
use crate::rng::GameRng;
use crate::rooms::WorldMap;
use crate::world::Level;

const FLOOR_COUNT: u32 = 3;
const ENTRY_DISPLAY_TIME: f32 = 1.2;
const VIEW_W: f32 = 480.0;
const VIEW_H: f32 = 272.0;

/// Rotating stage-direction lines shown on entry.
const ENTRY_LINES: [&str; 5] = [
    "Cut. Again.",
    "Smile. The scene is falling apart.",
    "There was no audience.",
    "The stage stood empty.",
    "Every line rings false.",
];

const STAGE_HINT: &str = "Stage direction: exit right, past the lead.";

/// Held-key snapshot for one frame, supplied by the external driver. The
/// core never polls a keyboard itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputFrame {
    pub left: bool,
    pub right: bool,
    pub run: bool,
    pub jump: bool,
    pub fire_left: bool,
    pub fire_right: bool,
    pub fire_up: bool,
    pub fire_down: bool,
}

impl InputFrame {
    pub fn fire_dir(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.fire_left {
            dir.x -= 1.0;
        }
        if self.fire_right {
            dir.x += 1.0;
        }
        if self.fire_up {
            dir.y -= 1.0;
        }
        if self.fire_down {
            dir.y += 1.0;
        }
        dir
    }
}

/// Discrete key-transition events, layered over the continuous frame input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Confirm,
    Cancel,
    Help,
    JumpPressed,
    JumpReleased,
    Attack,
    Interact,
    Restart,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Title,
    Help,
    Playing,
    GameOver,
    Victory,
}

enum Scene {
    Stage(Level),
    Rooms(WorldMap),
}

#[derive(Default)]
struct SimOutcome {
    victory: bool,
    died: bool,
    descended: bool,
}

pub struct Game {
    pub state: GameState,
    pub player: Player,
    pub camera: Vec2,
    pub entry_text: String,
    pub entry_timer: f32,
    pub hint_text: String,
    pub messages: Vec<String>,
    config: GameConfig,
    mode: GameMode,
    stage_layout: StageLayout,
    scene: Scene,
    rng: GameRng,
    view_size: Vec2,
    projectile_speed_bonus: f32,
    enemy_speed_bonus: f32,
    #[cfg(test)]
    force_fault: bool,
}

impl Game {
    pub fn new(config: GameConfig, mode: GameMode, seed: u64) -> Self {
        Self::with_layout(config, StageLayout::builtin(), mode, seed)
    }

    pub fn with_layout(
        config: GameConfig,
        stage_layout: StageLayout,
        mode: GameMode,
        seed: u64,
    ) -> Self {
        let mut rng = GameRng::new(seed);
        let tuning = config.player_for(mode).clone();
        let (scene, spawn) = build_scene(&config, &stage_layout, mode, 0, &mut rng);
        let mut game = Self {
            state: GameState::Title,
            player: Player::new(spawn, tuning),
            camera: Vec2::ZERO,
            entry_text: String::new(),
            entry_timer: 0.0,
            hint_text: String::new(),
            messages: Vec::new(),
            config,
            mode,
            stage_layout,
            scene,
            rng,
            view_size: vec2(VIEW_W, VIEW_H),
            projectile_speed_bonus: 0.0,
            enemy_speed_bonus: 0.0,
            #[cfg(test)]
            force_fault: false,
        };
        game.roll_entry_line();
        game
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// The stage level, in stage mode.
    pub fn level(&self) -> Option<&Level> {
        match &self.scene {
            Scene::Stage(level) => Some(level),
            Scene::Rooms(_) => None,
        }
    }

    pub fn level_mut(&mut self) -> Option<&mut Level> {
        match &mut self.scene {
            Scene::Stage(level) => Some(level),
            Scene::Rooms(_) => None,
        }
    }

    /// The room map, in rooms mode.
    pub fn world_map(&self) -> Option<&WorldMap> {
        match &self.scene {
            Scene::Rooms(map) => Some(map),
            Scene::Stage(_) => None,
        }
    }

    pub fn world_map_mut(&mut self) -> Option<&mut WorldMap> {
        match &mut self.scene {
            Scene::Rooms(map) => Some(map),
            Scene::Stage(_) => None,
        }
    }

    /// Discrete input. State transitions live here; the continuous
    /// simulation only runs in `Playing`.
    pub fn handle_event(&mut self, event: InputEvent) {
        match self.state {
            GameState::Title => match event {
                InputEvent::Confirm => {
                    self.state = GameState::Playing;
                    self.roll_entry_line();
                }
                InputEvent::Help => self.state = GameState::Help,
                _ => {}
            },
            GameState::Help => {
                if matches!(event, InputEvent::Confirm | InputEvent::Cancel) {
                    self.state = GameState::Title;
                }
            }
            GameState::GameOver | GameState::Victory => {
                if matches!(event, InputEvent::Confirm | InputEvent::Cancel) {
                    self.reset_session();
                    self.state = GameState::Title;
                }
            }
            GameState::Playing => match event {
                InputEvent::JumpPressed => self.player.press_jump(),
                InputEvent::JumpReleased => self.player.release_jump(),
                InputEvent::Attack => {
                    self.player.try_attack();
                }
                InputEvent::Interact => self.read_sign(),
                InputEvent::Restart => {
                    self.reset_session();
                    self.state = GameState::Playing;
                }
                _ => {}
            },
        }
    }

    /// One frame. Any panic inside the simulation step is contained here:
    /// the fault is logged and the session degrades to GameOver instead of
    /// taking the process down.
    pub fn frame(&mut self, dt: f32, input: &InputFrame) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.step(dt, input)));
        if let Err(payload) = result {
            let detail = if let Some(s) = payload.downcast_ref::<&str>() {
                s
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.as_str()
            } else {
                "unknown panic"
            };
            eprintln!("simulation fault: {detail}; curtain falls");
            self.state = GameState::GameOver;
        }
    }

    fn step(&mut self, dt: f32, input: &InputFrame) {
        if self.state != GameState::Playing {
            return;
        }
        #[cfg(test)]
        if self.force_fault {
            panic!("injected fault");
        }

        self.entry_timer = (self.entry_timer - dt).max(0.0);

        let outcome = self.simulate(dt, input);
        if outcome.died {
            self.handle_death();
        } else if outcome.victory {
            self.state = GameState::Victory;
        } else if outcome.descended {
            self.next_floor();
        }

        self.update_camera();
    }

    fn simulate(&mut self, dt: f32, input: &InputFrame) -> SimOutcome {
        let mut outcome = SimOutcome::default();
        let Self {
            scene,
            player,
            config,
            rng,
            messages,
            hint_text,
            projectile_speed_bonus,
            enemy_speed_bonus,
            mode,
            ..
        } = self;

        match scene {
            Scene::Stage(level) => {
                player.step(dt, input, &level.solids);
                let center = player.center();
                for enemy in &mut level.enemies {
                    enemy.step(dt, &level.grid, &level.solids, center, *enemy_speed_bonus);
                }
                if let Some(boss) = &mut level.boss {
                    boss.step(dt, player.rect, level.grid.pixel_width(), rng);
                }
                for pickup in &mut level.pickups {
                    pickup.update(dt);
                }
                level.particles.update(dt);

                let report = combat::resolve(player, level, config, *mode, rng);
                messages.extend(report.messages);
                for effect in report.session_effects {
                    match effect {
                        SessionEffect::RevealHint => *hint_text = STAGE_HINT.to_string(),
                        SessionEffect::SpotlightBoost { projectile, enemy } => {
                            *projectile_speed_bonus += projectile;
                            *enemy_speed_bonus += enemy;
                        }
                    }
                }

                outcome.victory = report.boss_defeated
                    || (level.boss.is_none()
                        && level.cleared()
                        && intersects(level.exit, player.rect));
            }
            Scene::Rooms(map) => {
                let solids = map.current_room().effective_solids();
                player.step(dt, input, &solids);

                let fire = input.fire_dir();
                if fire.length_squared() > 0.0 {
                    if let Some(shot) = player.try_fire(fire, *projectile_speed_bonus) {
                        map.current_room_mut().level.projectiles.push(shot);
                    }
                }

                let center = player.center();
                let room = map.current_room_mut();
                let bounds = room.level.bounds();
                for enemy in &mut room.level.enemies {
                    enemy.step(dt, &room.level.grid, &solids, center, *enemy_speed_bonus);
                }
                for projectile in &mut room.level.projectiles {
                    projectile.update(dt, &solids, bounds);
                }
                for pickup in &mut room.level.pickups {
                    pickup.update(dt);
                }
                room.level.particles.update(dt);

                let report = combat::resolve(player, &mut room.level, config, *mode, rng);
                if room.check_clear(config, rng) {
                    messages.push("The room falls silent. A door creaks open.".to_string());
                }
                messages.extend(report.messages);
                let mut reveal = false;
                for effect in report.session_effects {
                    match effect {
                        SessionEffect::RevealHint => reveal = true,
                        SessionEffect::SpotlightBoost { projectile, enemy } => {
                            *projectile_speed_bonus += projectile;
                            *enemy_speed_bonus += enemy;
                        }
                    }
                }

                if let Some(entry) = map.try_traverse(player.rect) {
                    player.respawn_at(entry);
                }
                if reveal {
                    *hint_text = map.exit_hint();
                }
                outcome.descended = map.stairway_overlap(player.rect);
            }
        }

        outcome.died = player.hp <= 0;
        outcome
    }

    /// An eraser charge rewrites the death: the scene rebuilds and the
    /// player walks back on at full hp, keeping score and items. Otherwise
    /// the curtain falls.
    fn handle_death(&mut self) {
        if self.player.stage_reset_charges > 0 {
            self.player.stage_reset_charges -= 1;
            let spawn = self.rebuild_scene();
            self.player.hp = self.player.max_hp;
            self.player.respawn_at(spawn);
            self.messages.push("The eraser rewrites the scene.".to_string());
            self.roll_entry_line();
        } else {
            self.state = GameState::GameOver;
        }
    }

    fn next_floor(&mut self) {
        let Scene::Rooms(map) = &self.scene else {
            return;
        };
        let floor = map.floor + 1;
        if floor >= FLOOR_COUNT {
            self.state = GameState::Victory;
            return;
        }
        let map = WorldMap::generate(&self.config, floor, &mut self.rng);
        let spawn = map.current_room().level.spawn;
        self.scene = Scene::Rooms(map);
        self.player.respawn_at(spawn);
        self.roll_entry_line();
    }

    /// Rebuilds the current scene in place (same floor in rooms mode) and
    /// returns its spawn point.
    fn rebuild_scene(&mut self) -> Vec2 {
        let floor = match &self.scene {
            Scene::Rooms(map) => map.floor,
            Scene::Stage(_) => 0,
        };
        let (scene, spawn) =
            build_scene(&self.config, &self.stage_layout, self.mode, floor, &mut self.rng);
        self.scene = scene;
        spawn
    }

    /// Full session reset: scene and player replaced wholesale.
    pub fn reset_session(&mut self) {
        let tuning = self.config.player_for(self.mode).clone();
        let spawn = {
            let (scene, spawn) =
                build_scene(&self.config, &self.stage_layout, self.mode, 0, &mut self.rng);
            self.scene = scene;
            spawn
        };
        self.player = Player::new(spawn, tuning);
        self.hint_text.clear();
        self.messages.clear();
        self.projectile_speed_bonus = 0.0;
        self.enemy_speed_bonus = 0.0;
        self.camera = Vec2::ZERO;
        self.roll_entry_line();
    }

    fn roll_entry_line(&mut self) {
        if let Some(line) = self.rng.pick(&ENTRY_LINES) {
            self.entry_text = line.to_string();
        }
        self.entry_timer = ENTRY_DISPLAY_TIME;
    }

    fn read_sign(&mut self) {
        if let Scene::Stage(level) = &self.scene {
            if let Some(text) = level.sign_text_at(self.player.rect) {
                self.hint_text = text.to_string();
            }
        }
    }

    /// Centers the player, clamped to the level bounds.
    fn update_camera(&mut self) {
        let (pw, ph) = match &self.scene {
            Scene::Stage(level) => (level.grid.pixel_width(), level.grid.pixel_height()),
            Scene::Rooms(map) => {
                let grid = &map.current_room().level.grid;
                (grid.pixel_width(), grid.pixel_height())
            }
        };
        let target = self.player.center() - self.view_size * 0.5;
        self.camera.x = target.x.clamp(0.0, (pw - self.view_size.x).max(0.0));
        self.camera.y = target.y.clamp(0.0, (ph - self.view_size.y).max(0.0));
    }
}

fn build_scene(
    config: &GameConfig,
    stage_layout: &StageLayout,
    mode: GameMode,
    floor: u32,
    rng: &mut GameRng,
) -> (Scene, Vec2) {
    match mode {
        GameMode::Stage => {
            let level = Level::from_stage(stage_layout, config, mode, rng);
            let spawn = level.spawn;
            (Scene::Stage(level), spawn)
        }
        GameMode::Rooms => {
            let map = WorldMap::generate(config, floor, rng);
            let spawn = map.current_room().level.spawn;
            (Scene::Rooms(map), spawn)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_game() -> Game {
        Game::new(GameConfig::builtin(), GameMode::Stage, 7)
    }

    fn rooms_game() -> Game {
        Game::new(GameConfig::builtin(), GameMode::Rooms, 7)
    }

    #[test]
    fn title_flow_reaches_playing_and_help() {
        let mut game = stage_game();
        assert_eq!(game.state, GameState::Title);
        game.handle_event(InputEvent::Help);
        assert_eq!(game.state, GameState::Help);
        game.handle_event(InputEvent::Cancel);
        assert_eq!(game.state, GameState::Title);
        game.handle_event(InputEvent::Confirm);
        assert_eq!(game.state, GameState::Playing);
        assert!(game.entry_timer > 0.0);
        assert!(!game.entry_text.is_empty());
    }

    #[test]
    fn simulation_only_ticks_while_playing() {
        let mut game = stage_game();
        let before = game.player.rect;
        game.frame(1.0 / 60.0, &InputFrame { right: true, ..Default::default() });
        assert_eq!(game.player.rect, before, "title screen must not simulate");

        game.handle_event(InputEvent::Confirm);
        for _ in 0..30 {
            game.frame(1.0 / 60.0, &InputFrame { right: true, ..Default::default() });
        }
        assert!(game.player.rect.x > before.x);
    }

    #[test]
    fn dying_without_an_eraser_ends_the_run() {
        let mut game = stage_game();
        game.handle_event(InputEvent::Confirm);
        game.player.hp = 0;
        game.frame(1.0 / 60.0, &InputFrame::default());
        assert_eq!(game.state, GameState::GameOver);

        // Any key returns to the title with a fresh session.
        game.handle_event(InputEvent::Confirm);
        assert_eq!(game.state, GameState::Title);
        assert_eq!(game.player.hp, game.player.max_hp);
    }

    #[test]
    fn eraser_charge_rewrites_a_death() {
        let mut game = stage_game();
        game.handle_event(InputEvent::Confirm);
        game.player.stage_reset_charges = 1;
        game.player.score = 125;
        game.player.hp = 0;
        game.frame(1.0 / 60.0, &InputFrame::default());
        assert_eq!(game.state, GameState::Playing);
        assert_eq!(game.player.hp, game.player.max_hp);
        assert_eq!(game.player.stage_reset_charges, 0);
        assert_eq!(game.player.score, 125, "score survives a rewrite");
    }

    #[test]
    fn restart_key_rebuilds_the_stage() {
        let mut game = stage_game();
        game.handle_event(InputEvent::Confirm);
        game.player.score = 50;
        game.handle_event(InputEvent::Restart);
        assert_eq!(game.state, GameState::Playing);
        assert_eq!(game.player.score, 0, "manual restart is a full reset");
    }

    #[test]
    fn a_panicking_step_degrades_to_game_over() {
        let mut game = stage_game();
        game.handle_event(InputEvent::Confirm);
        game.force_fault = true;
        game.frame(1.0 / 60.0, &InputFrame::default());
        assert_eq!(game.state, GameState::GameOver);
    }

    #[test]
    fn camera_follows_and_clamps_to_level_bounds() {
        let mut game = stage_game();
        game.handle_event(InputEvent::Confirm);
        game.frame(1.0 / 60.0, &InputFrame::default());
        // Player starts at the far left; the camera pins to the edge.
        assert_eq!(game.camera.x, 0.0);

        game.player.rect.x = 1800.0;
        game.frame(1.0 / 60.0, &InputFrame::default());
        let max_x = game.level().unwrap().grid.pixel_width() - VIEW_W;
        assert_eq!(game.camera.x, max_x);
    }

    #[test]
    fn boss_defeat_wins_the_stage() {
        let mut game = stage_game();
        game.handle_event(InputEvent::Confirm);
        // Pin the player safely away and snipe the boss down to nothing.
        if let Scene::Stage(level) = &mut game.scene {
            let boss = level.boss.as_mut().unwrap();
            boss.hp = 1;
            let rect = boss.rect;
            game.player.rect.x = rect.x - game.player.rect.w - 2.0;
            game.player.rect.y = rect.y;
        }
        game.handle_event(InputEvent::Attack);
        game.frame(1.0 / 60.0, &InputFrame::default());
        assert_eq!(game.state, GameState::Victory);
    }

    #[test]
    fn exit_alone_does_not_win_while_enemies_live() {
        let mut game = stage_game();
        game.handle_event(InputEvent::Confirm);
        if let Scene::Stage(level) = &mut game.scene {
            level.boss = None;
            let exit = level.exit;
            game.player.rect.x = exit.x + 1.0;
            game.player.rect.y = exit.y + 1.0;
        }
        game.frame(1.0 / 60.0, &InputFrame::default());
        assert_eq!(game.state, GameState::Playing);

        if let Scene::Stage(level) = &mut game.scene {
            for enemy in &mut level.enemies {
                enemy.alive = false;
            }
            let exit = level.exit;
            game.player.rect.x = exit.x + 1.0;
            game.player.rect.y = exit.y + 1.0;
        }
        game.frame(1.0 / 60.0, &InputFrame::default());
        assert_eq!(game.state, GameState::Victory);
    }

    #[test]
    fn rooms_mode_simulates_and_follows_doors() {
        let mut game = rooms_game();
        game.handle_event(InputEvent::Confirm);
        for _ in 0..10 {
            game.frame(1.0 / 60.0, &InputFrame::default());
        }
        assert_eq!(game.state, GameState::Playing);
        let map = game.world_map().unwrap();
        assert_eq!(map.floor, 0);
        assert!(map.current_room().cleared, "start room opens immediately");
    }

    #[test]
    fn reading_a_sign_sets_the_hint_line() {
        let mut game = stage_game();
        game.handle_event(InputEvent::Confirm);
        if let Scene::Stage(level) = &mut game.scene {
            let sign = level.signs[0].rect;
            game.player.rect.x = sign.x;
            game.player.rect.y = sign.y;
        }
        game.handle_event(InputEvent::Interact);
        assert!(!game.hint_text.is_empty());
    }
}
