//! Tallies engine events over a run.

use thicket_gameplay::{DamageOutcome, EngineEvent, EventHandler, StateTag};
use tracing::{debug, info};

/// Counters collected from the event bus.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Creatures spawned
    pub spawned: u64,
    /// Creatures killed
    pub kills: u64,
    /// Creatures removed
    pub despawned: u64,
    /// XP paid out for kills
    pub xp_awarded: u64,
    /// Player attacks that changed a creature's health
    pub hits_landed: u64,
    /// Player attacks ignored by invulnerability or a corpse
    pub hits_wasted: u64,
    /// Damage the player dealt
    pub damage_dealt: u64,
    /// Creature attacks that reached the player
    pub bites_taken: u64,
    /// Damage the player took
    pub damage_taken: u64,
    /// Creature attacks with no damage capability to use
    pub attacks_skipped: u64,
    /// Times a creature started chasing
    pub chases: u64,
    /// Whether a creature killed the player
    pub player_killed: bool,
}

impl ArenaStats {
    /// Creates new empty stats.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs the totals.
    pub fn log_summary(&self) {
        info!(
            spawned = self.spawned,
            kills = self.kills,
            despawned = self.despawned,
            xp = self.xp_awarded,
            hits = self.hits_landed,
            wasted = self.hits_wasted,
            damage_dealt = self.damage_dealt,
            bites = self.bites_taken,
            damage_taken = self.damage_taken,
            skipped = self.attacks_skipped,
            chases = self.chases,
            player_killed = self.player_killed,
            "Arena summary"
        );
    }
}

impl EventHandler for ArenaStats {
    fn handle(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Spawned { .. } => self.spawned += 1,
            EngineEvent::StateChanged { to, .. } => {
                if *to == StateTag::Chasing {
                    self.chases += 1;
                }
            },
            EngineEvent::PlayerStruck {
                damage, player_died, ..
            } => {
                self.bites_taken += 1;
                self.damage_taken += u64::from(*damage);
                self.player_killed |= *player_died;
            },
            EngineEvent::AttackSkipped { .. } => self.attacks_skipped += 1,
            EngineEvent::Damaged { outcome, .. } => match outcome {
                DamageOutcome::Damaged { dealt, .. } | DamageOutcome::Killed { dealt } => {
                    self.hits_landed += 1;
                    self.damage_dealt += u64::from(*dealt);
                },
                DamageOutcome::Ignored | DamageOutcome::AlreadyDead => self.hits_wasted += 1,
            },
            EngineEvent::Died {
                id,
                species,
                xp_reward,
            } => {
                self.kills += 1;
                self.xp_awarded += u64::from(*xp_reward);
                debug!(%id, species = species.display_name(), "Creature down");
            },
            EngineEvent::Despawned { .. } => self.despawned += 1,
        }
    }
}
