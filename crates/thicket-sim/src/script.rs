//! A scripted player that patrols the arena and fights back.

use glam::Vec2;
use thicket_common::EntityId;
use thicket_gameplay::{Cooldown, DamageOutcome, DamageSource, NpcManager, NpcResult, PlayerState};
use tracing::debug;

use crate::config::SimConfig;

/// Every third bow shot is fully charged.
const CHARGE_EVERY: u32 = 3;

/// Drives a [`PlayerState`] around a patrol loop.
#[derive(Debug)]
pub struct ScriptedPlayer {
    /// The player the creatures see
    pub player: PlayerState,
    patrol: Vec<Vec2>,
    next_waypoint: usize,
    speed: f32,
    swing: Cooldown,
    swing_interval: f32,
    sword_reach: f32,
    bow_range: f32,
    shots: u32,
}

impl ScriptedPlayer {
    /// Creates a player at the first waypoint.
    #[must_use]
    pub fn new(config: &SimConfig, patrol: &[Vec2]) -> Self {
        let start = patrol.first().copied().unwrap_or(Vec2::ZERO);
        Self {
            player: PlayerState::new(start)
                .with_level(config.player_level)
                .with_health(config.player_health),
            patrol: patrol.to_vec(),
            next_waypoint: 1 % patrol.len().max(1),
            speed: config.player_speed,
            swing: Cooldown::ready(),
            swing_interval: config.swing_interval,
            sword_reach: config.sword_reach,
            bow_range: config.bow_range,
            shots: 0,
        }
    }

    /// Walks toward the next waypoint.
    pub fn walk(&mut self, dt: f32) {
        self.swing.advance(dt);
        let Some(&target) = self.patrol.get(self.next_waypoint) else {
            return;
        };
        let to_target = target - self.player.position;
        let step = self.speed * dt;
        if to_target.length() <= step {
            self.player.position = target;
            self.next_waypoint = (self.next_waypoint + 1) % self.patrol.len();
        } else {
            self.player.position += to_target.normalize_or_zero() * step;
        }
    }

    /// Attacks the nearest living creature in range, if the swing is ready.
    pub fn engage(&mut self, npcs: &mut NpcManager) -> NpcResult<Option<(EntityId, DamageOutcome)>> {
        if !self.swing.is_ready() || self.player.is_dead() {
            return Ok(None);
        }
        let position = self.player.position;
        let nearest = npcs
            .in_range(position, self.bow_range)
            .into_iter()
            .filter_map(|id| npcs.get(id).map(|npc| (id, npc.position().distance(position))))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let Some((target, distance)) = nearest else {
            return Ok(None);
        };

        let source = if distance <= self.sword_reach {
            DamageSource::Sword
        } else {
            self.shots += 1;
            if self.shots % CHARGE_EVERY == 0 {
                DamageSource::ChargedArrow
            } else {
                DamageSource::Arrow
            }
        };

        let outcome = npcs.strike(target, source, &mut self.player)?;
        self.swing.start(self.swing_interval);
        debug!(%target, ?source, ?outcome, "Player attack");
        Ok(Some((target, outcome)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thicket_gameplay::{EngineTuning, Species};

    fn config() -> SimConfig {
        SimConfig::default()
    }

    #[test]
    fn test_walks_the_patrol_loop() {
        let patrol = [Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)];
        let mut script = ScriptedPlayer::new(&config(), &patrol);
        assert_eq!(script.player.position, Vec2::ZERO);

        // 40 px/s: 0.25 s reaches the second waypoint and turns back
        script.walk(0.25);
        assert_eq!(script.player.position, Vec2::new(10.0, 0.0));
        script.walk(0.125);
        assert!((script.player.position.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_engage_picks_weapon_by_distance() {
        let mut npcs = NpcManager::new(EngineTuning::default().with_seed(1));
        let wolf = npcs.spawn(Species::Wolf, Vec2::new(10.0, 0.0));
        let mut script = ScriptedPlayer::new(&config(), &[Vec2::ZERO]);

        let first = script.engage(&mut npcs).expect("wolf exists");
        assert_eq!(
            first,
            Some((wolf, DamageOutcome::Damaged { dealt: 30, remaining: 70 }))
        );

        // Swing on cooldown
        assert_eq!(script.engage(&mut npcs).expect("wolf exists"), None);

        // Walks to (-60, 0): 70 px away, bow range
        script.player.position = Vec2::new(-100.0, 0.0);
        script.walk(1.0);
        let second = script.engage(&mut npcs).expect("wolf exists");
        assert_eq!(
            second,
            Some((wolf, DamageOutcome::Damaged { dealt: 21, remaining: 49 }))
        );
    }

    #[test]
    fn test_engage_ignores_distant_creatures() {
        let mut npcs = NpcManager::new(EngineTuning::default());
        npcs.spawn(Species::Bear, Vec2::new(500.0, 500.0));
        let mut script = ScriptedPlayer::new(&config(), &[Vec2::ZERO]);
        assert_eq!(script.engage(&mut npcs).expect("no error"), None);
    }
}
