//! Creature lifecycle: spawning, ticking, player hits, death and removal.
//!
//! [`NpcManager`] owns every creature plus the behavior RNG and the event
//! bus. It is the only code that marks a creature dead, and it grants the
//! XP reward in the same step, so the reward can never be paid twice.

use ahash::AHashMap;
use glam::Vec2;
use thicket_common::EntityId;
use thiserror::Error;
use tracing::{debug, info};

use crate::ai::StateTag;
use crate::combat::{CombatError, DamageOutcome, DamageSource};
use crate::config::EngineTuning;
use crate::events::{EngineEvent, EventBus};
use crate::npc::{AttackResolution, Npc, NpcView, TickReport};
use crate::player::PlayerLink;
use crate::spatial::{self, CollisionMap};
use crate::species::{Species, SpeciesRegistry};

/// Error types for creature management.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NpcError {
    /// Creature not found
    #[error("NPC not found: {0}")]
    NotFound(EntityId),
    /// Creature already registered
    #[error("NPC already registered: {0}")]
    AlreadyRegistered(EntityId),
    /// The collision map refuses the spawn position
    #[error("cannot spawn {species:?} at ({x}, {y}): position is blocked")]
    SpawnBlocked {
        /// Species that was requested
        species: Species,
        /// X in pixels
        x: f32,
        /// Y in pixels
        y: f32,
    },
}

/// Result type for creature management.
pub type NpcResult<T> = Result<T, NpcError>;

/// Applies a player hit to a creature.
///
/// Damage is scaled by the player's level. On the killing blow the creature
/// is marked dead and the player receives the creature's XP reward.
pub fn resolve_player_strike<P: PlayerLink + ?Sized>(
    npc: &mut Npc,
    source: DamageSource,
    player: &mut P,
) -> DamageOutcome {
    let damage = npc.profile().damage.resolve(source, player.level());
    let outcome = npc.absorb_hit(damage);
    if outcome.is_kill() && npc.mark_dead() {
        let xp = npc.profile().xp_reward;
        player.gain_xp(xp);
        info!(id = %npc.id(), species = npc.species().display_name(), xp, "NPC killed");
    }
    outcome
}

/// Owns and drives every creature.
#[derive(Debug)]
pub struct NpcManager {
    npcs: AHashMap<EntityId, Npc>,
    /// Spawn order, so ticks and RNG draws are reproducible
    order: Vec<EntityId>,
    registry: SpeciesRegistry,
    tuning: EngineTuning,
    rng: fastrand::Rng,
    events: EventBus,
}

impl Default for NpcManager {
    fn default() -> Self {
        Self::new(EngineTuning::default())
    }
}

impl NpcManager {
    /// Creates an empty manager with built-in species profiles.
    #[must_use]
    pub fn new(tuning: EngineTuning) -> Self {
        let rng = tuning
            .rng_seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        Self {
            npcs: AHashMap::new(),
            order: Vec::new(),
            registry: SpeciesRegistry::builtin(),
            events: EventBus::new(tuning.event_capacity),
            tuning,
            rng,
        }
    }

    /// Uses custom species profiles for future spawns.
    #[must_use]
    pub fn with_registry(mut self, registry: SpeciesRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Engine tuning in use.
    #[must_use]
    pub const fn tuning(&self) -> &EngineTuning {
        &self.tuning
    }

    /// Event bus carrying everything that happened since the last drain.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Returns the number of creatures, dead or alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.npcs.len()
    }

    /// Returns whether there are no creatures.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.npcs.is_empty()
    }

    /// Gets a creature.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Npc> {
        self.npcs.get(&id)
    }

    /// Spawns a creature without consulting the collision map.
    pub fn spawn(&mut self, species: Species, position: Vec2) -> EntityId {
        let npc = Npc::new(EntityId::new(), species, self.registry.get(species), position);
        let id = npc.id();
        self.insert(npc);
        id
    }

    /// Spawns a creature if its footprint fits at `position`.
    pub fn spawn_checked<M: CollisionMap + ?Sized>(
        &mut self,
        species: Species,
        position: Vec2,
        map: &M,
    ) -> NpcResult<EntityId> {
        let footprint = self.registry.get(species).footprint;
        if !map.allows(position, footprint) {
            return Err(NpcError::SpawnBlocked {
                species,
                x: position.x,
                y: position.y,
            });
        }
        Ok(self.spawn(species, position))
    }

    /// Adds an existing creature.
    pub fn register(&mut self, npc: Npc) -> NpcResult<()> {
        if self.npcs.contains_key(&npc.id()) {
            return Err(NpcError::AlreadyRegistered(npc.id()));
        }
        self.insert(npc);
        Ok(())
    }

    fn insert(&mut self, npc: Npc) {
        let id = npc.id();
        debug!(%id, species = npc.species().display_name(), position = ?npc.position(), "NPC spawned");
        self.events.publish(EngineEvent::Spawned {
            id,
            species: npc.species(),
            position: npc.position(),
        });
        self.order.push(id);
        self.npcs.insert(id, npc);
    }

    /// Ticks every creature once, in spawn order.
    pub fn update_all<P, M>(&mut self, dt: f32, player: &mut P, map: &M) -> Vec<(EntityId, TickReport)>
    where
        P: PlayerLink + ?Sized,
        M: CollisionMap + ?Sized,
    {
        let mut reports = Vec::with_capacity(self.order.len());
        for id in &self.order {
            let Some(npc) = self.npcs.get_mut(id) else {
                continue;
            };
            if npc.is_dead() {
                continue;
            }
            let report = npc.update(dt, player, map, &mut self.rng, &self.tuning);
            publish_report(&self.events, *id, &report);
            reports.push((*id, report));
        }
        reports
    }

    /// Applies a player hit to a creature.
    pub fn strike<P: PlayerLink + ?Sized>(
        &mut self,
        id: EntityId,
        source: DamageSource,
        player: &mut P,
    ) -> NpcResult<DamageOutcome> {
        let npc = self.npcs.get_mut(&id).ok_or(NpcError::NotFound(id))?;
        let before = npc.state().tag();
        let outcome = resolve_player_strike(npc, source, player);

        self.events.publish(EngineEvent::Damaged { id, source, outcome });
        if outcome.is_kill() {
            self.events.publish(EngineEvent::StateChanged {
                id,
                from: before,
                to: StateTag::Dead,
            });
            self.events.publish(EngineEvent::Died {
                id,
                species: npc.species(),
                xp_reward: npc.profile().xp_reward,
            });
        }
        Ok(outcome)
    }

    /// IDs of creatures that died and are waiting to be removed.
    #[must_use]
    pub fn dead_ids(&self) -> Vec<EntityId> {
        self.order
            .iter()
            .filter(|id| self.npcs.get(*id).is_some_and(Npc::is_dead))
            .copied()
            .collect()
    }

    /// Removes every dead creature and returns them.
    pub fn remove_dead(&mut self) -> Vec<Npc> {
        self.dead_ids()
            .into_iter()
            .filter_map(|id| self.despawn(id).ok())
            .collect()
    }

    /// Removes a creature.
    pub fn despawn(&mut self, id: EntityId) -> NpcResult<Npc> {
        let npc = self.npcs.remove(&id).ok_or(NpcError::NotFound(id))?;
        self.order.retain(|other| *other != id);
        self.events.publish(EngineEvent::Despawned { id });
        Ok(npc)
    }

    /// Returns iterator over all creatures in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &Npc> {
        self.order.iter().filter_map(|id| self.npcs.get(id))
    }

    /// Gets all living creatures within `range` pixels of a position.
    #[must_use]
    pub fn in_range(&self, position: Vec2, range: f32) -> Vec<EntityId> {
        self.iter()
            .filter(|npc| !npc.is_dead() && spatial::within_range(npc.position(), position, range))
            .map(Npc::id)
            .collect()
    }

    /// Gets all creatures of a species.
    #[must_use]
    pub fn of_species(&self, species: Species) -> Vec<EntityId> {
        self.iter()
            .filter(|npc| npc.species() == species)
            .map(Npc::id)
            .collect()
    }

    /// Render snapshots of every creature.
    #[must_use]
    pub fn views(&self) -> Vec<NpcView> {
        self.iter().map(Npc::view).collect()
    }

    /// Number of creatures still alive.
    #[must_use]
    pub fn living_count(&self) -> usize {
        self.npcs.values().filter(|npc| !npc.is_dead()).count()
    }
}

fn publish_report(events: &EventBus, id: EntityId, report: &TickReport) {
    if let Some((from, to)) = report.transition {
        events.publish(EngineEvent::StateChanged { id, from, to });
    }
    match &report.attack {
        Some(AttackResolution::Landed { damage, player_died }) => {
            events.publish(EngineEvent::PlayerStruck {
                id,
                damage: *damage,
                player_died: *player_died,
            });
        },
        Some(AttackResolution::Skipped(err)) => {
            let capability = match err {
                CombatError::MissingCapability { capability } => (*capability).to_string(),
                other => other.to_string(),
            };
            events.publish(EngineEvent::AttackSkipped { id, capability });
        },
        None => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerState;
    use crate::spatial::TileGrid;

    fn manager() -> NpcManager {
        NpcManager::new(EngineTuning::default().with_seed(17))
    }

    #[test]
    fn test_spawn_and_get() {
        let mut npcs = manager();
        let wolf = npcs.spawn(Species::Wolf, Vec2::new(32.0, 32.0));
        let bear = npcs.spawn(Species::Bear, Vec2::new(96.0, 32.0));

        assert_eq!(npcs.len(), 2);
        assert_eq!(npcs.get(wolf).map(Npc::species), Some(Species::Wolf));
        assert_eq!(npcs.get(bear).map(|n| n.health().max()), Some(180));
        assert_eq!(npcs.of_species(Species::Bear), vec![bear]);
        assert_eq!(npcs.living_count(), 2);

        let events = npcs.events().drain();
        assert!(matches!(events[0], EngineEvent::Spawned { species: Species::Wolf, .. }));
    }

    #[test]
    fn test_spawn_checked_rejects_walls() {
        let map = TileGrid::from_layout(&["####", "#..#", "####"], 16.0).expect("layout");
        let mut npcs = manager();
        assert!(npcs.spawn_checked(Species::Wolf, Vec2::new(16.0, 16.0), &map).is_ok());
        assert!(matches!(
            npcs.spawn_checked(Species::Wolf, Vec2::new(0.0, 0.0), &map),
            Err(NpcError::SpawnBlocked { species: Species::Wolf, .. })
        ));
        // 24x24 bear doesn't fit a 32x16 room
        assert!(npcs.spawn_checked(Species::Bear, Vec2::new(16.0, 16.0), &map).is_err());
    }

    #[test]
    fn test_register_duplicate() {
        let mut npcs = manager();
        let npc = Npc::new(EntityId::new(), Species::Snake, Species::Snake.profile(), Vec2::ZERO);
        npcs.register(npc.clone()).expect("first registration");
        assert_eq!(npcs.register(npc.clone()), Err(NpcError::AlreadyRegistered(npc.id())));
    }

    #[test]
    fn test_strike_kills_once_and_grants_xp() {
        let mut npcs = manager();
        let mut player = PlayerState::new(Vec2::ZERO);
        let wolf = npcs.spawn(Species::Wolf, Vec2::new(32.0, 32.0));

        let hit = npcs.strike(wolf, DamageSource::Sword, &mut player).expect("wolf exists");
        assert_eq!(hit, DamageOutcome::Damaged { dealt: 30, remaining: 70 });

        let second = npcs
            .strike(wolf, DamageSource::ChargedArrow, &mut player)
            .expect("wolf exists");
        assert_eq!(second, DamageOutcome::Damaged { dealt: 48, remaining: 22 });
        let third = npcs.strike(wolf, DamageSource::ChargedArrow, &mut player).expect("wolf exists");
        assert_eq!(third, DamageOutcome::Killed { dealt: 22 });
        assert_eq!(player.total_xp(), 50);

        let again = npcs.strike(wolf, DamageSource::Sword, &mut player).expect("wolf exists");
        assert_eq!(again, DamageOutcome::AlreadyDead);
        assert_eq!(player.total_xp(), 50);
        assert_eq!(npcs.dead_ids(), vec![wolf]);
        assert_eq!(npcs.living_count(), 0);

        let died = npcs
            .events()
            .drain()
            .into_iter()
            .filter(|e| matches!(e, EngineEvent::Died { .. }))
            .count();
        assert_eq!(died, 1);
    }

    #[test]
    fn test_strike_missing_npc() {
        let mut npcs = manager();
        let mut player = PlayerState::new(Vec2::ZERO);
        let ghost = EntityId::from_raw(999_999);
        assert_eq!(
            npcs.strike(ghost, DamageSource::Sword, &mut player),
            Err(NpcError::NotFound(ghost))
        );
    }

    #[test]
    fn test_remove_dead() {
        let mut npcs = manager();
        let mut player = PlayerState::new(Vec2::ZERO).with_level(10);
        let beetle = npcs.spawn(Species::Beetle, Vec2::new(32.0, 32.0));
        let wolf = npcs.spawn(Species::Wolf, Vec2::new(64.0, 32.0));

        // 30 * 14 / 5 = 84 > 40
        assert!(npcs.strike(beetle, DamageSource::Sword, &mut player).expect("beetle").is_kill());

        let removed = npcs.remove_dead();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id(), beetle);
        assert!(npcs.get(beetle).is_none());
        assert!(npcs.get(wolf).is_some());
        assert_eq!(npcs.despawn(beetle).map(|n| n.id()), Err(NpcError::NotFound(beetle)));
    }

    #[test]
    fn test_dead_are_skipped_by_update() {
        let map = TileGrid::open(16, 16, 16.0).expect("valid grid");
        let mut npcs = manager();
        let mut player = PlayerState::new(Vec2::new(40.0, 32.0)).with_level(20);
        let wolf = npcs.spawn(Species::Wolf, Vec2::new(32.0, 32.0));
        npcs.strike(wolf, DamageSource::ChargedArrow, &mut player).expect("wolf");

        let before = npcs.get(wolf).cloned();
        let reports = npcs.update_all(0.016, &mut player, &map);
        assert!(reports.is_empty());
        assert_eq!(npcs.get(wolf).cloned(), before);
    }

    #[test]
    fn test_queries() {
        let map = TileGrid::open(16, 16, 16.0).expect("valid grid");
        let mut npcs = manager();
        let near = npcs.spawn(Species::Snake, Vec2::new(16.0, 16.0));
        let far = npcs.spawn(Species::Beetle, Vec2::new(200.0, 200.0));
        assert_eq!(npcs.in_range(Vec2::ZERO, 40.0), vec![near]);

        let mut player = PlayerState::new(Vec2::new(240.0, 16.0));
        npcs.update_all(0.016, &mut player, &map);
        let views = npcs.views();
        assert_eq!(views.len(), 2);
        assert_eq!(views[1].id, far);
        assert!(views.iter().all(|v| v.animation_time > 0.0));
    }

    #[test]
    fn test_update_publishes_transitions() {
        let map = TileGrid::open(16, 16, 16.0).expect("valid grid");
        let mut npcs = manager();
        let wolf = npcs.spawn(Species::Wolf, Vec2::new(32.0, 32.0));
        let mut player = PlayerState::new(Vec2::new(64.0, 32.0));
        npcs.events().drain();

        npcs.update_all(0.016, &mut player, &map);
        let events = npcs.events().drain();
        assert_eq!(
            events,
            vec![EngineEvent::StateChanged {
                id: wolf,
                from: StateTag::Idle,
                to: StateTag::Chasing,
            }]
        );
    }
}
