//! Per-entity timers advanced by frame delta time.
//!
//! Every duration is in seconds. A [`Timer`] counts up toward a target
//! duration; a [`Cooldown`] counts down to zero. [`TimerBank`] groups the
//! timers an NPC carries so a single `advance` call keeps them consistent.

use serde::{Deserialize, Serialize};

/// Count-up timer with a target duration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Timer {
    elapsed: f32,
    duration: f32,
}

impl Timer {
    /// Creates a timer that finishes after `duration` seconds.
    #[must_use]
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    /// Adds `dt` seconds of elapsed time.
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// Resets elapsed time, keeping the duration.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Resets elapsed time and sets a new duration.
    pub fn restart(&mut self, duration: f32) {
        self.elapsed = 0.0;
        self.duration = duration.max(0.0);
    }

    /// Seconds elapsed since the last reset.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Target duration in seconds.
    #[must_use]
    pub const fn duration(&self) -> f32 {
        self.duration
    }

    /// Whether the target duration has been reached.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Seconds left until the target duration, never negative.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        (self.duration - self.elapsed).max(0.0)
    }
}

/// Count-down timer that is ready once it reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Cooldown {
    remaining: f32,
}

impl Cooldown {
    /// A cooldown that is already ready.
    #[must_use]
    pub const fn ready() -> Self {
        Self { remaining: 0.0 }
    }

    /// Starts (or restarts) the countdown.
    pub fn start(&mut self, duration: f32) {
        self.remaining = duration.max(0.0);
    }

    /// Subtracts `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.remaining = (self.remaining - dt.max(0.0)).max(0.0);
    }

    /// Whether the countdown has run out.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }

    /// Whether the countdown is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_ready()
    }

    /// Seconds until ready.
    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.remaining
    }
}

/// All timers owned by one NPC.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimerBank {
    /// Time spent in the current AI state, with the state's target duration
    /// (idle dwell or wander duration).
    pub state: Timer,
    /// Time until the next attack may deal damage
    pub attack_cooldown: Cooldown,
    /// Time during which incoming hits are ignored
    pub invulnerability: Cooldown,
    /// Time the renderer should keep showing the hurt flash
    pub hurt_flash: Cooldown,
}

impl TimerBank {
    /// Creates a bank with every cooldown ready.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances every timer by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.state.advance(dt);
        self.attack_cooldown.advance(dt);
        self.invulnerability.advance(dt);
        self.hurt_flash.advance(dt);
    }
}
