/// The player controller runs on a pile of grace windows and cooldowns that
/// all share one rule: count down every step, never below zero. Keeping them
/// in one registry gives every timer identical decrement semantics and one
/// place to test them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    Coyote,
    JumpBuffer,
    Attack,
    Invincible,
    DashActive,
    DashCooldown,
    DashInvincible,
    Hover,
    Fire,
}

const TIMER_COUNT: usize = 9;

#[derive(Clone, Debug, Default)]
pub struct Timers {
    remaining: [f32; TIMER_COUNT],
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// One decrement-and-floor pass for every timer.
    pub fn tick(&mut self, dt: f32) {
        for t in &mut self.remaining {
            *t = (*t - dt).max(0.0);
        }
    }

    pub fn set(&mut self, kind: TimerKind, seconds: f32) {
        self.remaining[kind as usize] = seconds.max(0.0);
    }

    pub fn clear(&mut self, kind: TimerKind) {
        self.remaining[kind as usize] = 0.0;
    }

    pub fn get(&self, kind: TimerKind) -> f32 {
        self.remaining[kind as usize]
    }

    pub fn active(&self, kind: TimerKind) -> bool {
        self.remaining[kind as usize] > 0.0
    }
}
