//! The engine's view of the player.
//!
//! NPCs never own the player. Each tick they receive a [`PlayerLink`] that
//! exposes the player's position and level plus two capabilities: taking
//! damage and gaining XP. [`PlayerState`] is the reference implementation
//! used by the simulator and tests.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::combat::{apply_damage, Health};

/// Something that can be hurt by an NPC attack.
pub trait DamageSink {
    /// Applies `amount` damage and returns whether the target died.
    fn take_damage(&mut self, amount: u32) -> bool;
}

/// Per-tick access to the player.
pub trait PlayerLink {
    /// Current position in pixels.
    fn position(&self) -> Vec2;

    /// Current level (1 or higher).
    fn level(&self) -> u32;

    /// The player's damage capability, if it has one.
    fn damage_sink(&mut self) -> Option<&mut dyn DamageSink>;

    /// Grants experience.
    fn gain_xp(&mut self, amount: u32);
}

/// XP needed to go from `level` to `level + 1`.
#[must_use]
pub const fn xp_to_next(level: u32) -> u32 {
    100 * level
}

/// Minimal player: position, health, level and experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Position in pixels
    pub position: Vec2,
    health: Health,
    level: u32,
    xp: u32,
    total_xp: u32,
}

impl PlayerState {
    /// Default player health.
    pub const DEFAULT_HEALTH: u32 = 100;

    /// Creates a level 1 player at full health.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            position,
            health: Health::full(Self::DEFAULT_HEALTH),
            level: 1,
            xp: 0,
            total_xp: 0,
        }
    }

    /// Sets the starting level.
    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level.max(1);
        self
    }

    /// Sets maximum (and current) health.
    #[must_use]
    pub fn with_health(mut self, health: u32) -> Self {
        self.health = Health::full(health);
        self
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// Whether the player has died.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health.is_depleted()
    }

    /// XP accumulated toward the next level.
    #[must_use]
    pub const fn xp(&self) -> u32 {
        self.xp
    }

    /// XP earned over the player's lifetime.
    #[must_use]
    pub const fn total_xp(&self) -> u32 {
        self.total_xp
    }
}

impl DamageSink for PlayerState {
    fn take_damage(&mut self, amount: u32) -> bool {
        apply_damage(&mut self.health, amount);
        self.health.is_depleted()
    }
}

impl PlayerLink for PlayerState {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn level(&self) -> u32 {
        self.level
    }

    fn damage_sink(&mut self) -> Option<&mut dyn DamageSink> {
        Some(self)
    }

    fn gain_xp(&mut self, amount: u32) {
        self.total_xp = self.total_xp.saturating_add(amount);
        self.xp = self.xp.saturating_add(amount);
        while self.xp >= xp_to_next(self.level) {
            self.xp -= xp_to_next(self.level);
            self.level += 1;
            info!(level = self.level, "Player levelled up");
        }
    }
}
