use crate::config::{GameConfig, GameMode};
use crate::helpers::{intersects, rect_center};
use crate::item::{Pickup, SessionEffect};
use crate::player::Player;
use crate::rng::GameRng;
use crate::world::Level;

const ENEMY_KILL_SCORE: u32 = 25;
const BOSS_KILL_SCORE: u32 = 250;
const BLOOD_COLOR: [u8; 3] = [200, 60, 60];
const KILL_BURST: usize = 10;
const BOSS_BURST: usize = 28;

/// What one resolution pass did, for the owning state machine.
#[derive(Debug, Default)]
pub struct ResolutionReport {
    pub enemies_killed: u32,
    pub boss_defeated: bool,
    pub player_respawned: bool,
    pub messages: Vec<String>,
    pub session_effects: Vec<SessionEffect>,
}

/// Cross-entity resolution, run once per step after every entity has moved.
/// Mutates the colliding parties; all removal is retain-based, never
/// mid-iteration.
pub fn resolve(
    player: &mut Player,
    level: &mut Level,
    config: &GameConfig,
    mode: GameMode,
    rng: &mut GameRng,
) -> ResolutionReport {
    let mut report = ResolutionReport::default();

    // Melee swings: one touch fells a stagehand.
    for hitbox in &player.attack_hitboxes {
        for enemy in &mut level.enemies {
            if enemy.alive && intersects(hitbox.rect, enemy.rect) {
                enemy.alive = false;
                player.score += ENEMY_KILL_SCORE;
                report.enemies_killed += 1;
            }
        }
    }

    // Shots wound rather than fell; the shot is spent either way.
    for projectile in &mut level.projectiles {
        if !projectile.alive {
            continue;
        }
        for enemy in &mut level.enemies {
            if enemy.alive && intersects(projectile.rect, enemy.rect) {
                enemy.take_damage(1);
                projectile.alive = false;
                if !enemy.alive {
                    player.score += ENEMY_KILL_SCORE;
                    report.enemies_killed += 1;
                }
                break;
            }
        }
    }

    if let Some(boss) = &mut level.boss {
        if boss.alive {
            // A swing lands once; the hitbox is spent on contact.
            for hitbox in &mut player.attack_hitboxes {
                if hitbox.remaining > 0.0 && intersects(hitbox.rect, boss.rect) {
                    hitbox.remaining = 0.0;
                    boss.apply_damage(1);
                }
            }
            for projectile in &mut level.projectiles {
                if projectile.alive && intersects(projectile.rect, boss.rect) {
                    projectile.alive = false;
                    boss.apply_damage(1);
                }
            }
            if !boss.alive {
                player.score += BOSS_KILL_SCORE;
                report.boss_defeated = true;
                let center = rect_center(boss.rect);
                level
                    .particles
                    .spawn_burst(center, BOSS_BURST, boss.color(), rng);
            }
        }
    }

    // Contact hazards. Knockback only lands when the hit is accepted, so an
    // invincible player can walk through the cast.
    for enemy in &level.enemies {
        if enemy.alive
            && intersects(enemy.rect, player.rect)
            && player.take_damage(enemy.contact_damage)
        {
            player.apply_knockback();
        }
    }
    if let Some(boss) = &level.boss {
        if boss.alive {
            for attack in &boss.attacks {
                if attack.active() && intersects(attack.rect, player.rect) {
                    player.take_damage(attack.damage);
                }
            }
            if intersects(boss.rect, player.rect) && player.take_damage(boss.contact_damage()) {
                player.apply_knockback();
            }
        }
    }

    for pickup in &mut level.pickups {
        if !pickup.collected && intersects(pickup.rect, player.rect) {
            let (message, session) = pickup.collect(player);
            report.messages.push(message);
            if let Some(effect) = session {
                report.session_effects.push(effect);
            }
        }
    }
    level.pickups.retain(|p| !p.collected);

    // Kill plane. Entities are culled; the player is pulled back to the
    // last checkpoint and pays a contact's worth of hp.
    let kill_y = level.kill_plane_y;
    level.enemies.retain(|e| e.rect.y <= kill_y);
    level.projectiles.retain(|p| p.rect.y <= kill_y);
    level.pickups.retain(|p| p.rect.y <= kill_y);
    if player.rect.y > kill_y {
        let checkpoint = level.checkpoint_left_of(player.center().x);
        player.respawn_at(checkpoint);
        player.take_damage(1);
        report.player_respawned = true;
    }

    // Sweep the fallen: burst, maybe a drop, then retain the survivors.
    let mut drops: Vec<Pickup> = Vec::new();
    for enemy in &level.enemies {
        if enemy.alive {
            continue;
        }
        let center = enemy.center();
        level.particles.spawn_burst(center, KILL_BURST, BLOOD_COLOR, rng);
        if rng.chance(enemy.drop_chance) {
            let drop = match mode {
                GameMode::Stage => Pickup::heart(center.x, center.y, &config.heart, rng),
                GameMode::Rooms => match rng.pick(&config.items) {
                    Some(def) => Pickup::item(center.x, center.y, def.clone(), rng),
                    None => continue,
                },
            };
            drops.push(drop);
        }
    }
    level.enemies.retain(|e| e.alive);
    level.pickups.append(&mut drops);

    report
}
