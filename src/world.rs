use macroquad::math::{Rect, Vec2, vec2};

use crate::boss::Boss;
use crate::config::{GameConfig, GameMode, StageLayout};
use crate::enemy::Enemy;
use crate::helpers::intersects;
use crate::item::Pickup;
use crate::particle::ParticlePool;
use crate::projectile::Projectile;
use crate::rng::GameRng;

const PARTICLE_CAPACITY: usize = 256;

/// Fixed grid of cells, 0 empty and 1 solid, built once per load.
#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f32,
    cells: Vec<u8>,
}

impl TileGrid {
    pub fn empty(width: usize, height: usize, tile_size: f32) -> Self {
        debug_assert!(tile_size > 0.0, "tile size must be positive");
        Self {
            width,
            height,
            tile_size,
            cells: vec![0; width * height],
        }
    }

    /// Lays the ground strip, the platform segments, then carves the pits.
    pub fn build(layout: &StageLayout) -> Self {
        let mut grid = Self::empty(layout.width, layout.height, layout.tile_size);
        let ground_y = layout.height.saturating_sub(layout.ground_rows);
        for y in ground_y..layout.height {
            for x in 0..layout.width {
                grid.set_solid(x, y);
            }
        }
        for &(start_x, y, length) in &layout.platforms {
            for x in start_x..(start_x + length).min(layout.width.saturating_sub(2)) {
                grid.set_solid(x, y);
            }
        }
        for &(start_x, length) in &layout.pits {
            for x in start_x..(start_x + length).min(layout.width.saturating_sub(1)) {
                for y in ground_y..layout.height {
                    grid.set_empty(x, y);
                }
            }
        }
        grid
    }

    pub fn set_solid(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = 1;
        }
    }

    pub fn set_empty(&mut self, x: usize, y: usize) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = 0;
        }
    }

    /// Out-of-bounds counts as solid, so collision code can never walk an
    /// entity out of the level.
    pub fn is_solid_tile(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return true;
        }
        self.cells[y as usize * self.width + x as usize] == 1
    }

    /// Pixel-space query.
    pub fn is_solid_at(&self, x: f32, y: f32) -> bool {
        let tx = (x / self.tile_size).floor() as i32;
        let ty = (y / self.tile_size).floor() as i32;
        self.is_solid_tile(tx, ty)
    }

    /// One rect per solid cell, unmerged. Keeps the collision code trivial
    /// at a memory cost that stays small for maps under a few thousand tiles.
    pub fn solids(&self) -> Vec<Rect> {
        let mut solids = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                if self.cells[y * self.width + x] == 1 {
                    solids.push(Rect::new(
                        x as f32 * self.tile_size,
                        y as f32 * self.tile_size,
                        self.tile_size,
                        self.tile_size,
                    ));
                }
            }
        }
        solids
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * self.tile_size
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * self.tile_size
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropKind {
    Tape,
    Mark,
    Curtain,
}

/// Set dressing. Never collides, never updates; carried for the renderer.
#[derive(Clone, Copy, Debug)]
pub struct Prop {
    pub pos: Vec2,
    pub kind: PropKind,
}

#[derive(Clone, Debug)]
pub struct Sign {
    pub rect: Rect,
    pub text: String,
}

/// One loaded stage: the immutable tile geometry plus every live collection
/// the simulation step mutates.
pub struct Level {
    pub grid: TileGrid,
    pub solids: Vec<Rect>,
    pub enemies: Vec<Enemy>,
    pub pickups: Vec<Pickup>,
    pub projectiles: Vec<Projectile>,
    pub particles: ParticlePool,
    pub props: Vec<Prop>,
    pub signs: Vec<Sign>,
    pub exit: Rect,
    pub checkpoints: Vec<Vec2>,
    pub spawn: Vec2,
    pub kill_plane_y: f32,
    pub boss: Option<Boss>,
}

impl Level {
    pub fn from_stage(
        layout: &StageLayout,
        config: &GameConfig,
        mode: GameMode,
        rng: &mut GameRng,
    ) -> Self {
        let grid = TileGrid::build(layout);
        let solids = grid.solids();
        let ts = layout.tile_size;

        let enemies = layout
            .enemy_spawns
            .iter()
            .map(|spawn| {
                Enemy::spawn(
                    spawn.kind,
                    spawn.x as f32 * ts,
                    spawn.y as f32 * ts,
                    &config.enemy,
                    mode,
                    rng,
                )
            })
            .collect();

        let mut pickups = Vec::new();
        for &(x, y) in &layout.item_spawns {
            if let Some(def) = rng.pick(&config.items) {
                pickups.push(Pickup::item(x as f32 * ts, y as f32 * ts, def.clone(), rng));
            }
        }

        let boss = layout.boss.as_ref().and_then(|spec| {
            let archetype = config.archetype(&spec.archetype);
            if archetype.is_none() {
                eprintln!("stage names unknown boss archetype '{}'", spec.archetype);
            }
            archetype.map(|a| Boss::spawn(spec.x as f32 * ts, spec.y as f32 * ts, a.clone()))
        });

        let mut props = Vec::new();
        for _ in 0..layout.prop_count {
            let px = rng.gen_range(2.0, (layout.width - 2) as f32).floor() * ts;
            let py = rng.gen_range(2.0, (layout.height - 4) as f32).floor() * ts;
            let kind = match rng.weighted_index(&[1.0, 1.0, 1.0]) {
                0 => PropKind::Tape,
                1 => PropKind::Mark,
                _ => PropKind::Curtain,
            };
            props.push(Prop { pos: vec2(px, py), kind });
        }

        let signs = layout
            .signs
            .iter()
            .map(|s| Sign {
                rect: Rect::new(s.x as f32 * ts, s.y as f32 * ts, ts, ts),
                text: s.text.clone(),
            })
            .collect();

        let exit = Rect::new(
            layout.exit.0 as f32 * ts,
            layout.exit.1 as f32 * ts,
            layout.exit.2 as f32 * ts,
            layout.exit.3 as f32 * ts,
        );

        Self {
            kill_plane_y: grid.pixel_height() + layout.kill_depth,
            solids,
            enemies,
            pickups,
            projectiles: Vec::new(),
            particles: ParticlePool::new(PARTICLE_CAPACITY),
            props,
            signs,
            exit,
            checkpoints: layout
                .checkpoints
                .iter()
                .map(|&(x, y)| vec2(x as f32 * ts, y as f32 * ts))
                .collect(),
            spawn: vec2(layout.spawn.0 as f32 * ts, layout.spawn.1 as f32 * ts),
            boss,
            grid,
        }
    }

    /// Bare level over a prebuilt grid; the room generator fills in the rest.
    pub fn bare(grid: TileGrid, spawn: Vec2) -> Self {
        let solids = grid.solids();
        let kill_plane_y = grid.pixel_height() + 64.0;
        Self {
            solids,
            enemies: Vec::new(),
            pickups: Vec::new(),
            projectiles: Vec::new(),
            particles: ParticlePool::new(PARTICLE_CAPACITY),
            props: Vec::new(),
            signs: Vec::new(),
            exit: Rect::new(0.0, 0.0, 0.0, 0.0),
            checkpoints: Vec::new(),
            spawn,
            kill_plane_y,
            boss: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.grid.pixel_width(), self.grid.pixel_height())
    }

    /// True iff every enemy in the collection is dead. The boss is tracked
    /// separately by the owning state machine.
    pub fn cleared(&self) -> bool {
        self.enemies.iter().all(|e| !e.alive)
    }

    /// Respawn target after a kill-plane fall: the last checkpoint at or
    /// left of `x`, the stage spawn if none has been passed.
    pub fn checkpoint_left_of(&self, x: f32) -> Vec2 {
        self.checkpoints
            .iter()
            .filter(|c| c.x <= x)
            .max_by(|a, b| a.x.total_cmp(&b.x))
            .copied()
            .unwrap_or(self.spawn)
    }

    pub fn sign_text_at(&self, rect: Rect) -> Option<&str> {
        self.signs
            .iter()
            .find(|s| intersects(s.rect, rect))
            .map(|s| s.text.as_str())
    }
}
