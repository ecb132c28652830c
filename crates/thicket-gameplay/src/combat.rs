//! Combat resolution: damage tables, level scaling, and health bookkeeping.
//!
//! This module provides:
//! - Damage sources and per-species base damage tables
//! - Player-level damage scaling
//! - Health with a saturating damage transform
//! - Delivery of NPC attacks to the player's damage capability
//!
//! Everything here is pure or operates on a single value; no AI state is
//! touched.

use serde::{Deserialize, Serialize};
use thicket_common::EntityId;
use thiserror::Error;
use tracing::debug;

use crate::player::DamageSink;

/// Combat error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// The player handle cannot perform a required operation
    #[error("player is missing the `{capability}` capability")]
    MissingCapability {
        /// Name of the missing capability
        capability: &'static str,
    },
}

/// Result type for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;

/// Where a hit comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageSource {
    /// NPC bite/claw against the player
    Melee,
    /// Player sword strike
    Sword,
    /// Player arrow
    Arrow,
    /// Player fully charged arrow
    ChargedArrow,
}

impl DamageSource {
    /// Whether the player deals this damage. Player damage is level-scaled,
    /// NPC damage is not.
    #[must_use]
    pub const fn is_player_sourced(self) -> bool {
        !matches!(self, Self::Melee)
    }

    /// All sources.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Melee, Self::Sword, Self::Arrow, Self::ChargedArrow]
    }
}

/// Base damage per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageTable {
    /// NPC melee damage dealt to the player
    pub melee: u32,
    /// Sword damage taken from the player
    pub sword: u32,
    /// Arrow damage taken from the player
    pub arrow: u32,
    /// Charged arrow damage taken from the player
    pub charged_arrow: u32,
}

impl Default for DamageTable {
    fn default() -> Self {
        Self {
            melee: 25,
            sword: 30,
            arrow: 21,
            charged_arrow: 48,
        }
    }
}

impl DamageTable {
    /// Base damage for a source.
    #[must_use]
    pub const fn base(&self, source: DamageSource) -> u32 {
        match source {
            DamageSource::Melee => self.melee,
            DamageSource::Sword => self.sword,
            DamageSource::Arrow => self.arrow,
            DamageSource::ChargedArrow => self.charged_arrow,
        }
    }

    /// Final damage for a source given the player's level.
    #[must_use]
    pub fn resolve(&self, source: DamageSource, player_level: u32) -> u32 {
        let base = self.base(source);
        if source.is_player_sourced() {
            scaled_damage(base, player_level)
        } else {
            base
        }
    }
}

/// Player-level damage multiplier: `0.8 + 0.2 * level`.
#[must_use]
pub fn level_multiplier(level: u32) -> f32 {
    0.8 + 0.2 * level.max(1) as f32
}

/// `floor(base * (0.8 + 0.2 * level))`.
///
/// Evaluated as `base * (4 + level) / 5` in integers so values such as
/// `30 * 1.4` never round down to 41. Levels below 1 count as level 1.
#[must_use]
pub fn scaled_damage(base: u32, level: u32) -> u32 {
    let level = u64::from(level.max(1));
    let scaled = u64::from(base) * (4 + level) / 5;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Current and maximum health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    current: u32,
    max: u32,
}

impl Health {
    /// Full health.
    #[must_use]
    pub const fn full(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Current health.
    #[must_use]
    pub const fn current(&self) -> u32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub const fn max(&self) -> u32 {
        self.max
    }

    /// Whether health has reached zero.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.current == 0
    }

    /// Health as a fraction of maximum (0.0 to 1.0).
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.current as f32 / self.max as f32
        }
    }
}

/// What a damage application did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageOutcome {
    /// Health went down and is still above zero
    Damaged {
        /// Health removed
        dealt: u32,
        /// Health left
        remaining: u32,
    },
    /// This hit brought health to zero
    Killed {
        /// Health removed
        dealt: u32,
    },
    /// The target was invulnerable
    Ignored,
    /// The target was already dead; nothing changed
    AlreadyDead,
}

impl DamageOutcome {
    /// Whether this hit caused the death.
    #[must_use]
    pub const fn is_kill(self) -> bool {
        matches!(self, Self::Killed { .. })
    }

    /// Whether health changed.
    #[must_use]
    pub const fn changed_health(self) -> bool {
        matches!(self, Self::Damaged { dealt, .. } | Self::Killed { dealt } if dealt > 0)
    }

    /// Health removed by this hit.
    #[must_use]
    pub const fn dealt(self) -> u32 {
        match self {
            Self::Damaged { dealt, .. } | Self::Killed { dealt } => dealt,
            Self::Ignored | Self::AlreadyDead => 0,
        }
    }
}

/// Applies `health' = max(0, health - amount)`.
pub fn apply_damage(health: &mut Health, amount: u32) -> DamageOutcome {
    if health.is_depleted() {
        return DamageOutcome::AlreadyDead;
    }
    let dealt = amount.min(health.current);
    health.current -= dealt;
    if health.is_depleted() {
        DamageOutcome::Killed { dealt }
    } else {
        DamageOutcome::Damaged {
            dealt,
            remaining: health.current,
        }
    }
}

/// A resolved NPC attack, consumed as soon as it is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackEvent {
    /// Damage to deal
    pub damage: u32,
    /// Attacking entity
    pub source: EntityId,
}

/// Hands an attack to the player's damage capability.
///
/// Returns whether the player died.
pub fn deliver_to_player(sink: Option<&mut dyn DamageSink>, event: AttackEvent) -> CombatResult<bool> {
    let sink = sink.ok_or(CombatError::MissingCapability {
        capability: "take_damage",
    })?;
    let died = sink.take_damage(event.damage);
    debug!(source = %event.source, damage = event.damage, died, "Attack delivered to player");
    Ok(died)
}
