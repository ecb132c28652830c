//! # Thicket Gameplay
//!
//! Creature behavior and combat resolution for Thicket.
//!
//! This crate provides:
//! - Spatial queries and the tile collision oracle
//! - Per-entity timers and cooldowns
//! - Damage tables, level scaling and health bookkeeping
//! - Species profiles for wolf, bear, snake and beetle
//! - The AI state machine (idle, wandering, chasing, attacking, dead)
//! - Movement integration with wall sliding
//! - Creature lifecycle management and the engine event bus

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ai;
pub mod combat;
pub mod config;
pub mod events;
pub mod lifecycle;
pub mod movement;
pub mod npc;
pub mod player;
pub mod spatial;
pub mod species;
pub mod timers;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::ai::*;
    pub use crate::combat::*;
    pub use crate::config::*;
    pub use crate::events::*;
    pub use crate::lifecycle::*;
    pub use crate::movement::*;
    pub use crate::npc::*;
    pub use crate::player::*;
    pub use crate::spatial::*;
    pub use crate::species::*;
    pub use crate::timers::*;
}

pub use prelude::*;
