//! Event bus for engine notifications.
//!
//! The manager publishes what happened during a tick (spawns, state changes,
//! hits, deaths) so renderers, audio and logs can react without polling.

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use thicket_common::EntityId;
use tracing::debug;

use crate::ai::StateTag;
use crate::combat::{DamageOutcome, DamageSource};
use crate::species::Species;

/// Things that happen to creatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// Creature spawned
    Spawned {
        /// Creature ID
        id: EntityId,
        /// Species
        species: Species,
        /// Spawn position
        position: Vec2,
    },
    /// AI state changed
    StateChanged {
        /// Creature ID
        id: EntityId,
        /// Previous state
        from: StateTag,
        /// New state
        to: StateTag,
    },
    /// A creature's attack landed on the player
    PlayerStruck {
        /// Attacker
        id: EntityId,
        /// Damage dealt
        damage: u32,
        /// Whether the player died from it
        player_died: bool,
    },
    /// A creature reached its damage frame but could not hurt the player
    AttackSkipped {
        /// Attacker
        id: EntityId,
        /// Missing player capability
        capability: String,
    },
    /// The player hit a creature
    Damaged {
        /// Creature ID
        id: EntityId,
        /// Weapon used
        source: DamageSource,
        /// What the hit did
        outcome: DamageOutcome,
    },
    /// A creature's health reached zero
    Died {
        /// Creature ID
        id: EntityId,
        /// Species
        species: Species,
        /// XP granted to the player
        xp_reward: u32,
    },
    /// A creature was removed from the manager
    Despawned {
        /// Creature ID
        id: EntityId,
    },
}

impl EngineEvent {
    /// The creature this event is about.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        match self {
            Self::Spawned { id, .. }
            | Self::StateChanged { id, .. }
            | Self::PlayerStruck { id, .. }
            | Self::AttackSkipped { id, .. }
            | Self::Damaged { id, .. }
            | Self::Died { id, .. }
            | Self::Despawned { id } => *id,
        }
    }
}

/// Bounded queue of engine events.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<EngineEvent>,
    receiver: Receiver<EngineEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
        }
    }

    /// Publishes an event. When the bus is full the event is dropped.
    pub fn publish(&self, event: EngineEvent) {
        if let Err(err) = self.sender.try_send(event) {
            debug!(event = ?err.into_inner(), "Event bus full, dropping event");
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<EngineEvent> {
        self.receiver.try_iter().collect()
    }

    /// Hands every pending event to `handler`.
    pub fn dispatch(&self, handler: &mut dyn EventHandler) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.receiver.try_recv() {
            handler.handle(&event);
            handled += 1;
        }
        handled
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Consumer of engine events.
pub trait EventHandler {
    /// Handles an event.
    fn handle(&mut self, event: &EngineEvent);
}
