//! Headless simulation core of "falsestage", a theatrical 2D
//! action-platformer. The crate owns entity physics (charge jumps, coyote
//! time, jump buffering, air dashes, hover), tile-map collision, enemy AI,
//! data-driven bosses with telegraphed attack patterns, item pickups, and
//! the surrounding game-state machine. Rendering, windowing, audio and asset
//! loading belong to the consuming binary; the core takes per-frame input
//! snapshots plus `dt` and exposes entity state for a renderer.

pub mod boss;
pub mod combat;
pub mod config;
pub mod enemy;
pub mod game;
pub mod helpers;
pub mod item;
pub mod particle;
pub mod player;
pub mod projectile;
pub mod rng;
pub mod rooms;
pub mod timer;
pub mod world;
