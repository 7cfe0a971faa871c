use macroquad::math::Vec2;

use crate::rng::GameRng;

const PARTICLE_GRAVITY: f32 = 450.0;

#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub life_max: f32,
    pub size: f32,
    pub color: [u8; 3],
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            life: 0.0,
            life_max: 1.0,
            size: 2.0,
            color: [255, 255, 255],
        }
    }
}

/// Fixed-capacity pool of cosmetic particles. Slots cycle through a free
/// list; the active list is swept with `swap_remove` so expiry never shifts
/// the whole vector. Spawning into a full pool drops the particle.
pub struct ParticlePool {
    particles: Vec<Particle>,
    free: Vec<usize>,
    active: Vec<usize>,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        let mut free = Vec::with_capacity(capacity);
        for i in (0..capacity).rev() {
            free.push(i);
        }
        Self {
            particles: vec![Particle::default(); capacity],
            free,
            active: Vec::with_capacity(capacity),
        }
    }

    fn spawn(&mut self, particle: Particle) -> bool {
        if let Some(idx) = self.free.pop() {
            self.particles[idx] = particle;
            self.active.push(idx);
            true
        } else {
            false
        }
    }

    /// Scatter burst at a point: hit sparks, death bursts, boss kills.
    pub fn spawn_burst(&mut self, at: Vec2, count: usize, color: [u8; 3], rng: &mut GameRng) {
        for _ in 0..count {
            let vel = Vec2::new(rng.gen_range(-90.0, 90.0), rng.gen_range(-160.0, -50.0));
            let life = rng.gen_range(0.4, 0.8);
            self.spawn(Particle {
                pos: at,
                vel,
                life,
                life_max: life,
                size: rng.gen_range(1.5, 3.0),
                color,
            });
        }
    }

    pub fn update(&mut self, dt: f32) {
        let mut i = 0;
        while i < self.active.len() {
            let idx = self.active[i];
            let particle = &mut self.particles[idx];

            particle.life -= dt;
            if particle.life <= 0.0 {
                self.free.push(idx);
                self.active.swap_remove(i);
                continue;
            }

            particle.vel.y += PARTICLE_GRAVITY * dt;
            particle.pos += particle.vel * dt;

            i += 1;
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Live particles, for the renderer.
    pub fn iter_active(&self) -> impl Iterator<Item = &Particle> {
        self.active.iter().map(|&idx| &self.particles[idx])
    }

    pub fn clear(&mut self) {
        for idx in self.active.drain(..) {
            self.free.push(idx);
        }
    }
}
