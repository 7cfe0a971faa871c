use macroquad::math::{Rect, Vec2, vec2};

use crate::config::{GameConfig, GameMode};
use crate::enemy::{Enemy, EnemyKind};
use crate::helpers::intersects;
use crate::item::Pickup;
use crate::rng::GameRng;
use crate::world::{Level, TileGrid};

pub const ROOM_TILES_W: usize = 30;
pub const ROOM_TILES_H: usize = 17;
pub const ROOM_TILE_SIZE: f32 = 16.0;
const ROOM_COUNT: usize = 8;

/// Fixed platform ladder inside every room; enough to reach the ceiling door.
const ROOM_PLATFORMS: [(usize, usize, usize); 3] = [(4, 12, 5), (12, 9, 6), (13, 4, 4)];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    fn delta(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Door {
    pub direction: Direction,
    pub rect: Rect,
}

fn door_rect(direction: Direction) -> Rect {
    let ts = ROOM_TILE_SIZE;
    let w = ROOM_TILES_W as f32;
    let h = ROOM_TILES_H as f32;
    match direction {
        Direction::Left => Rect::new(0.0, 12.0 * ts, ts, 3.0 * ts),
        Direction::Right => Rect::new((w - 1.0) * ts, 12.0 * ts, ts, 3.0 * ts),
        Direction::Up => Rect::new((w / 2.0 - 1.0).floor() * ts, 0.0, 2.0 * ts, ts),
        Direction::Down => Rect::new((w / 2.0 - 1.0).floor() * ts, (h - 2.0) * ts, 2.0 * ts, 2.0 * ts),
    }
}

/// Where the player lands after coming through a door, expressed in the
/// destination room. Entering through the floor hole drops them from the
/// ceiling and vice versa; side doors step them just inside the wall.
fn entry_position(moving: Direction) -> Vec2 {
    let ts = ROOM_TILE_SIZE;
    let w = ROOM_TILES_W as f32;
    let h = ROOM_TILES_H as f32;
    match moving {
        Direction::Right => vec2(1.5 * ts, (h - 5.0) * ts),
        Direction::Left => vec2((w - 3.0) * ts, (h - 5.0) * ts),
        // Offset from the center line so arrivals never stand in the floor
        // hole of the next room down.
        Direction::Down => vec2((w / 2.0 + 2.0) * ts, 1.5 * ts),
        Direction::Up => vec2((w / 2.0 + 2.0) * ts, (h - 5.0) * ts),
    }
}

pub struct Room {
    pub grid_pos: (i32, i32),
    pub level: Level,
    pub doors: Vec<Door>,
    pub cleared: bool,
    pub is_exit: bool,
    pub stairway: Option<Rect>,
    item_spawned: bool,
}

impl Room {
    fn build(
        grid_pos: (i32, i32),
        neighbors: &[Direction],
        config: &GameConfig,
        floor: u32,
        populate: bool,
        rng: &mut GameRng,
    ) -> Self {
        let ts = ROOM_TILE_SIZE;
        let mut grid = TileGrid::empty(ROOM_TILES_W, ROOM_TILES_H, ts);
        for x in 0..ROOM_TILES_W {
            grid.set_solid(x, 0);
            grid.set_solid(x, ROOM_TILES_H - 2);
            grid.set_solid(x, ROOM_TILES_H - 1);
        }
        for y in 0..ROOM_TILES_H {
            grid.set_solid(0, y);
            grid.set_solid(ROOM_TILES_W - 1, y);
        }
        for &(sx, y, len) in &ROOM_PLATFORMS {
            for x in sx..(sx + len).min(ROOM_TILES_W - 1) {
                grid.set_solid(x, y);
            }
        }

        // Carve a gap per connected side; while the room is uncleared the
        // same rects come back as blockers.
        let mid = ROOM_TILES_W / 2;
        let mut doors = Vec::new();
        for &direction in neighbors {
            match direction {
                Direction::Left => {
                    for y in 12..15 {
                        grid.set_empty(0, y);
                    }
                }
                Direction::Right => {
                    for y in 12..15 {
                        grid.set_empty(ROOM_TILES_W - 1, y);
                    }
                }
                Direction::Up => {
                    grid.set_empty(mid - 1, 0);
                    grid.set_empty(mid, 0);
                }
                Direction::Down => {
                    for x in [mid - 1, mid] {
                        grid.set_empty(x, ROOM_TILES_H - 2);
                        grid.set_empty(x, ROOM_TILES_H - 1);
                    }
                }
            }
            doors.push(Door { direction, rect: door_rect(direction) });
        }

        // Left of center so the spawn never sits over the floor-door hole.
        let spawn = vec2(10.0 * ts, (ROOM_TILES_H - 5) as f32 * ts);
        let mut level = Level::bare(grid, spawn);

        if populate {
            let count = 2 + rng.weighted_index(&[1.0, 1.0, 1.0]) + floor.min(2) as usize;
            for _ in 0..count {
                let kind = match rng.weighted_index(&[0.4, 0.3, 0.3]) {
                    0 => EnemyKind::Patroller,
                    1 => EnemyKind::Chaser,
                    _ => EnemyKind::Dasher,
                };
                let x = rng.gen_range(3.0, (ROOM_TILES_W - 4) as f32).floor() * ts;
                let y = match kind {
                    EnemyKind::Dasher => rng.gen_range(4.0, 9.0).floor() * ts,
                    _ => (ROOM_TILES_H - 4) as f32 * ts,
                };
                level
                    .enemies
                    .push(Enemy::spawn(kind, x, y, &config.enemy, GameMode::Rooms, rng));
            }
        }

        Self {
            grid_pos,
            level,
            doors,
            // An unpopulated room has nothing to clear and no reward.
            cleared: !populate,
            is_exit: false,
            stairway: None,
            item_spawned: !populate,
        }
    }

    /// Static geometry plus, while the room is uncleared, a blocker rect
    /// over every door gap.
    pub fn effective_solids(&self) -> Vec<Rect> {
        let mut solids = self.level.solids.clone();
        if !self.cleared {
            solids.extend(self.doors.iter().map(|d| d.rect));
        }
        solids
    }

    /// Runs the clear transition exactly once: marks the room cleared,
    /// spawns the single reward pickup, and (for the exit room) reveals the
    /// stairway. Re-checking a cleared room is a no-op.
    pub fn check_clear(&mut self, config: &GameConfig, rng: &mut GameRng) -> bool {
        if self.cleared || !self.level.cleared() {
            return false;
        }
        self.cleared = true;
        if !self.item_spawned {
            self.item_spawned = true;
            if let Some(def) = rng.pick(&config.items) {
                // Over solid floor, clear of the floor-door hole.
                let at = vec2(
                    10.0 * ROOM_TILE_SIZE,
                    (ROOM_TILES_H - 4) as f32 * ROOM_TILE_SIZE,
                );
                self.level
                    .pickups
                    .push(Pickup::item(at.x, at.y, def.clone(), rng));
            }
        }
        if self.is_exit {
            self.stairway = Some(Rect::new(
                (ROOM_TILES_W / 2 - 1) as f32 * ROOM_TILE_SIZE,
                (ROOM_TILES_H - 5) as f32 * ROOM_TILE_SIZE,
                2.0 * ROOM_TILE_SIZE,
                3.0 * ROOM_TILE_SIZE,
            ));
        }
        true
    }

    pub fn door_toward(&self, direction: Direction) -> Option<&Door> {
        self.doors.iter().find(|d| d.direction == direction)
    }
}

/// Grid-indexed set of rooms for one floor, generated by a random walk.
pub struct WorldMap {
    pub rooms: Vec<Room>,
    pub current: usize,
    pub floor: u32,
}

impl WorldMap {
    pub fn generate(config: &GameConfig, floor: u32, rng: &mut GameRng) -> Self {
        let mut positions: Vec<(i32, i32)> = vec![(0, 0)];
        while positions.len() < ROOM_COUNT {
            let from = *rng.pick(&positions).unwrap_or(&(0, 0));
            let direction = *rng.pick(&Direction::ALL).unwrap_or(&Direction::Right);
            let delta = direction.delta();
            let candidate = (from.0 + delta.0, from.1 + delta.1);
            if !positions.contains(&candidate) {
                positions.push(candidate);
            }
        }

        let mut rooms: Vec<Room> = positions
            .iter()
            .enumerate()
            .map(|(idx, &pos)| {
                let neighbors: Vec<Direction> = Direction::ALL
                    .iter()
                    .copied()
                    .filter(|d| {
                        let delta = d.delta();
                        positions.contains(&(pos.0 + delta.0, pos.1 + delta.1))
                    })
                    .collect();
                Room::build(pos, &neighbors, config, floor, idx != 0, rng)
            })
            .collect();
        // The walk's far end is the exit room with the stairway down.
        if let Some(last) = rooms.last_mut() {
            last.is_exit = true;
        }

        Self { rooms, current: 0, floor }
    }

    pub fn current_room(&self) -> &Room {
        &self.rooms[self.current]
    }

    pub fn current_room_mut(&mut self) -> &mut Room {
        &mut self.rooms[self.current]
    }

    pub fn room_at(&self, pos: (i32, i32)) -> Option<usize> {
        self.rooms.iter().position(|r| r.grid_pos == pos)
    }

    /// If the current room is cleared and the player stands in a door gap,
    /// switch rooms. Returns the player's position in the new room.
    pub fn try_traverse(&mut self, player_rect: Rect) -> Option<Vec2> {
        let room = self.current_room();
        if !room.cleared {
            return None;
        }
        let through = room
            .doors
            .iter()
            .find(|d| intersects(d.rect, player_rect))
            .map(|d| d.direction)?;
        let delta = through.delta();
        let pos = room.grid_pos;
        let next = self.room_at((pos.0 + delta.0, pos.1 + delta.1))?;
        self.current = next;
        Some(entry_position(through))
    }

    /// One line for the Script item, pointing from the current room toward
    /// the stairway room.
    pub fn exit_hint(&self) -> String {
        let here = self.current_room().grid_pos;
        let Some(exit) = self.rooms.iter().find(|r| r.is_exit) else {
            return "The script's last page is missing.".to_string();
        };
        let (dx, dy) = (exit.grid_pos.0 - here.0, exit.grid_pos.1 - here.1);
        let place = if dx == 0 && dy == 0 {
            "this very room"
        } else if dx.abs() >= dy.abs() {
            if dx > 0 { "stage right" } else { "stage left" }
        } else if dy > 0 {
            "below the boards"
        } else {
            "up in the rigging"
        };
        format!("The script whispers: the stairway waits {place}.")
    }

    pub fn stairway_overlap(&self, rect: Rect) -> bool {
        self.current_room()
            .stairway
            .is_some_and(|s| intersects(s, rect))
    }
}
