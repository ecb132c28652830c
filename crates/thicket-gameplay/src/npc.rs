//! Creature entity and its per-tick update.
//!
//! One [`Npc`] tick runs in a fixed order:
//!
//! 1. sanitize `dt` and advance the timer bank
//! 2. measure the player (using last tick's positions) and run [`decide`]
//! 3. turn the state into a [`MoveIntent`] and integrate it
//! 4. resolve the attack sequence's damage window
//!
//! Death is applied by the lifecycle manager, never by the entity itself.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thicket_common::EntityId;
use tracing::{debug, warn};

use crate::ai::{decide, AiState, Decision, Direction, Perception, StateTag};
use crate::combat::{apply_damage, deliver_to_player, AttackEvent, CombatError, DamageOutcome, DamageSource, Health};
use crate::config::EngineTuning;
use crate::movement::{integrate, MoveIntent, MoveOutcome};
use crate::player::PlayerLink;
use crate::spatial::CollisionMap;
use crate::species::{Species, SpeciesProfile};
use crate::timers::TimerBank;

/// What happened to a creature's attack this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttackResolution {
    /// Damage reached the player
    Landed {
        /// Damage dealt
        damage: u32,
        /// Whether the player died
        player_died: bool,
    },
    /// The damage window opened but the player could not be hurt
    Skipped(CombatError),
}

/// Summary of one tick, consumed by the lifecycle manager.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// State change, if any
    pub transition: Option<(StateTag, StateTag)>,
    /// Movement resolution
    pub movement: MoveOutcome,
    /// Attack resolution, if the damage window was evaluated
    pub attack: Option<AttackResolution>,
}

impl TickReport {
    fn inert() -> Self {
        Self {
            transition: None,
            movement: MoveOutcome::Stationary,
            attack: None,
        }
    }
}

/// Everything a renderer needs to draw a creature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NpcView {
    /// Creature ID
    pub id: EntityId,
    /// Species
    pub species: Species,
    /// Top-left corner in pixels
    pub position: Vec2,
    /// AI state
    pub state: StateTag,
    /// Facing
    pub facing: Direction,
    /// Whether the creature moved last tick
    pub is_moving: bool,
    /// Seconds of animation played; only grows while alive
    pub animation_time: f32,
    /// Current attack frame while attacking
    pub attack_frame: Option<u32>,
    /// Whether the hurt flash is showing
    pub hurt_flash: bool,
    /// Health as a fraction of maximum
    pub health_fraction: f32,
}

/// Clamps `dt` into `0..=max_frame_dt`, treating garbage as zero.
pub fn sanitize_dt(dt: f32, tuning: &EngineTuning) -> f32 {
    if !dt.is_finite() || dt < 0.0 {
        warn!(dt, "Invalid frame delta, treating as zero");
        return 0.0;
    }
    dt.min(tuning.max_frame_dt)
}

/// A creature driven by the shared state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    id: EntityId,
    species: Species,
    profile: SpeciesProfile,
    position: Vec2,
    facing: Direction,
    health: Health,
    state: AiState,
    timers: TimerBank,
    is_moving: bool,
    animation_time: f32,
    dead: bool,
}

impl Npc {
    /// Creates an idle creature at full health.
    #[must_use]
    pub fn new(id: EntityId, species: Species, profile: SpeciesProfile, position: Vec2) -> Self {
        let mut timers = TimerBank::new();
        timers.state.restart(profile.idle_dwell.base);
        Self {
            id,
            species,
            health: Health::full(profile.max_health),
            profile,
            position,
            facing: Direction::default(),
            state: AiState::Idle,
            timers,
            is_moving: false,
            animation_time: 0.0,
            dead: false,
        }
    }

    /// Sets the initial facing.
    #[must_use]
    pub fn with_facing(mut self, facing: Direction) -> Self {
        self.facing = facing;
        self
    }

    /// Entity ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Species.
    #[must_use]
    pub const fn species(&self) -> Species {
        self.species
    }

    /// Tuning in use.
    #[must_use]
    pub const fn profile(&self) -> &SpeciesProfile {
        &self.profile
    }

    /// Top-left corner in pixels.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Facing direction.
    #[must_use]
    pub const fn facing(&self) -> Direction {
        self.facing
    }

    /// Health.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// AI state.
    #[must_use]
    pub const fn state(&self) -> &AiState {
        &self.state
    }

    /// Timers.
    #[must_use]
    pub const fn timers(&self) -> &TimerBank {
        &self.timers
    }

    /// Whether the creature moved last tick.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.is_moving
    }

    /// Seconds of animation played.
    #[must_use]
    pub const fn animation_time(&self) -> f32 {
        self.animation_time
    }

    /// Whether the creature has died.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Render snapshot.
    #[must_use]
    pub fn view(&self) -> NpcView {
        let attack_frame = match &self.state {
            AiState::Attacking(sequence) => Some(sequence.frame(&self.profile)),
            _ => None,
        };
        NpcView {
            id: self.id,
            species: self.species,
            position: self.position,
            state: self.state.tag(),
            facing: self.facing,
            is_moving: self.is_moving,
            animation_time: self.animation_time,
            attack_frame,
            hurt_flash: self.timers.hurt_flash.is_active(),
            health_fraction: self.health.fraction(),
        }
    }

    /// Runs one tick.
    pub fn update<P, M>(
        &mut self,
        dt: f32,
        player: &mut P,
        map: &M,
        rng: &mut fastrand::Rng,
        tuning: &EngineTuning,
    ) -> TickReport
    where
        P: PlayerLink + ?Sized,
        M: CollisionMap + ?Sized,
    {
        if self.dead {
            return TickReport::inert();
        }

        let dt = sanitize_dt(dt, tuning);
        self.timers.advance(dt);
        self.animation_time += dt;

        let target = player.position();
        let perception = Perception::between(self.position, target, map.tile_size());
        let transition = self.think(perception, dt, rng);
        let movement = self.steer(target, dt, map, rng, tuning);
        let attack = self.strike_window(player);

        TickReport {
            transition,
            movement,
            attack,
        }
    }

    fn think(
        &mut self,
        perception: Perception,
        dt: f32,
        rng: &mut fastrand::Rng,
    ) -> Option<(StateTag, StateTag)> {
        match decide(&self.state, perception, &self.timers.state, &self.profile, rng) {
            Decision::Enter(next) => {
                let from = self.state.tag();
                self.enter(next, rng);
                let to = self.state.tag();
                debug!(id = %self.id, %from, %to, tiles = perception.tile_distance, "State transition");
                Some((from, to))
            },
            Decision::RestartDwell => {
                self.timers.state.restart(self.profile.idle_dwell.sample(rng));
                None
            },
            Decision::Stay => {
                if let AiState::Attacking(sequence) = &mut self.state {
                    sequence.advance(dt);
                }
                None
            },
        }
    }

    fn enter(&mut self, next: AiState, rng: &mut fastrand::Rng) {
        let duration = match next {
            AiState::Idle => self.profile.idle_dwell.sample(rng),
            AiState::Wandering { direction } => {
                self.facing = direction;
                self.profile.wander_duration.sample(rng)
            },
            AiState::Chasing | AiState::Attacking(_) | AiState::Dead => 0.0,
        };
        self.timers.state.restart(duration);
        self.state = next;
    }

    fn steer<M: CollisionMap + ?Sized>(
        &mut self,
        target: Vec2,
        dt: f32,
        map: &M,
        rng: &mut fastrand::Rng,
        tuning: &EngineTuning,
    ) -> MoveOutcome {
        let state = self.state;
        let intent = match state {
            AiState::Wandering { direction } => MoveIntent::Walk {
                direction,
                speed: self.profile.wander_speed,
            },
            AiState::Chasing => {
                self.face(target);
                MoveIntent::Pursue {
                    target,
                    speed: self.profile.chase_speed,
                }
            },
            AiState::Attacking(_) => {
                self.face(target);
                MoveIntent::Stay
            },
            AiState::Idle | AiState::Dead => MoveIntent::Stay,
        };

        let previous = self.position;
        let movement = integrate(previous, self.profile.footprint, intent, dt, map, tuning);
        self.position = movement.position;
        self.is_moving = movement.outcome.moved();

        // A sliding chaser faces the axis it actually travelled along.
        if movement.outcome == MoveOutcome::Slid {
            if let Some(direction) = Direction::from_vec2(movement.position - previous) {
                self.facing = direction;
            }
        }

        if movement.outcome == MoveOutcome::Blocked {
            if let AiState::Wandering { direction } = state {
                let direction = direction.random_other(rng);
                self.state = AiState::Wandering { direction };
                self.facing = direction;
            }
        }
        movement.outcome
    }

    fn face(&mut self, target: Vec2) {
        if let Some(direction) = Direction::from_vec2(target - self.position) {
            self.facing = direction;
        }
    }

    fn strike_window<P: PlayerLink + ?Sized>(&mut self, player: &mut P) -> Option<AttackResolution> {
        let AiState::Attacking(sequence) = &mut self.state else {
            return None;
        };
        if sequence.damage_applied()
            || !sequence.in_hit_window(&self.profile)
            || !self.timers.attack_cooldown.is_ready()
        {
            return None;
        }

        let event = AttackEvent {
            damage: self.profile.damage.resolve(DamageSource::Melee, player.level()),
            source: self.id,
        };
        sequence.mark_applied();
        match deliver_to_player(player.damage_sink(), event) {
            Ok(player_died) => {
                self.timers.attack_cooldown.start(self.profile.attack_cooldown);
                Some(AttackResolution::Landed {
                    damage: event.damage,
                    player_died,
                })
            },
            Err(err) => {
                warn!(id = %self.id, %err, "Attack skipped");
                Some(AttackResolution::Skipped(err))
            },
        }
    }

    /// Applies an incoming hit, honoring the invulnerability window.
    pub(crate) fn absorb_hit(&mut self, amount: u32) -> DamageOutcome {
        if self.dead || self.health.is_depleted() {
            return DamageOutcome::AlreadyDead;
        }
        if self.timers.invulnerability.is_active() {
            return DamageOutcome::Ignored;
        }
        let outcome = apply_damage(&mut self.health, amount);
        if outcome.changed_health() {
            self.timers.hurt_flash.start(self.profile.hurt_flash);
            self.timers.invulnerability.start(self.profile.invulnerability);
        }
        outcome
    }

    /// Moves the creature into its terminal state. Returns `false` if it was
    /// already dead.
    pub(crate) fn mark_dead(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.state = AiState::Dead;
        self.is_moving = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AttackSequence;
    use crate::player::{DamageSink, PlayerState};
    use crate::spatial::TileGrid;

    const DT: f32 = 0.05;

    struct Ghost {
        position: Vec2,
        xp: u32,
    }

    impl PlayerLink for Ghost {
        fn position(&self) -> Vec2 {
            self.position
        }

        fn level(&self) -> u32 {
            1
        }

        fn damage_sink(&mut self) -> Option<&mut dyn DamageSink> {
            None
        }

        fn gain_xp(&mut self, amount: u32) {
            self.xp += amount;
        }
    }

    fn arena() -> TileGrid {
        TileGrid::open(20, 20, 16.0).expect("valid grid")
    }

    fn wolf_at(position: Vec2) -> Npc {
        Npc::new(EntityId::new(), Species::Wolf, SpeciesProfile::wolf(), position)
    }

    fn tick<P: PlayerLink>(npc: &mut Npc, player: &mut P, rng: &mut fastrand::Rng) -> TickReport {
        npc.update(DT, player, &arena(), rng, &EngineTuning::default())
    }

    #[test]
    fn test_new_npc() {
        let npc = wolf_at(Vec2::new(32.0, 32.0)).with_facing(Direction::Left);
        assert_eq!(npc.state(), &AiState::Idle);
        assert_eq!(npc.health().current(), 100);
        assert_eq!(npc.facing(), Direction::Left);
        assert!(!npc.is_dead());
        assert!((npc.timers().state.duration() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_detection_at_exactly_three_tiles() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut npc = wolf_at(Vec2::new(64.0, 64.0));
        let mut player = PlayerState::new(Vec2::new(112.0, 64.0));

        let report = tick(&mut npc, &mut player, &mut rng);
        assert_eq!(report.transition, Some((StateTag::Idle, StateTag::Chasing)));
        assert_eq!(npc.state(), &AiState::Chasing);
        assert!(npc.is_moving());
        assert_eq!(npc.facing(), Direction::Right);
    }

    #[test]
    fn test_no_detection_just_beyond_three_tiles() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut npc = wolf_at(Vec2::new(64.0, 64.0));
        let mut player = PlayerState::new(Vec2::new(112.16, 64.0));

        tick(&mut npc, &mut player, &mut rng);
        assert!(matches!(npc.state().tag(), StateTag::Idle | StateTag::Wandering));
    }

    #[test]
    fn test_attack_applies_damage_once_per_cooldown() {
        let mut rng = fastrand::Rng::with_seed(5);
        let mut npc = wolf_at(Vec2::new(64.0, 64.0));
        let mut player = PlayerState::new(Vec2::new(74.0, 64.0));

        let mut hits = Vec::new();
        let mut elapsed = 0.0;
        while elapsed < 2.0 {
            let report = tick(&mut npc, &mut player, &mut rng);
            elapsed += DT;
            if let Some(AttackResolution::Landed { damage, .. }) = report.attack {
                hits.push((elapsed, damage));
            }
        }

        assert!(hits.len() >= 2, "expected repeated attacks, got {hits:?}");
        assert!(hits.iter().all(|(_, damage)| *damage == 25));
        for pair in hits.windows(2) {
            assert!(pair[1].0 - pair[0].0 >= 1.0 - 1e-3, "hits too close: {hits:?}");
        }
        assert_eq!(player.health().current(), 100 - 25 * hits.len() as u32);
    }

    #[test]
    fn test_damage_frame_with_active_cooldown_is_ignored() {
        let mut npc = wolf_at(Vec2::new(64.0, 64.0));
        let mut sequence = AttackSequence::start();
        sequence.advance(0.25);
        npc.state = AiState::Attacking(sequence);
        npc.timers.attack_cooldown.start(0.5);

        let mut player = PlayerState::new(Vec2::new(70.0, 64.0));
        assert_eq!(npc.strike_window(&mut player), None);
        assert_eq!(player.health().current(), 100);

        npc.timers.attack_cooldown.advance(0.5);
        assert!(matches!(
            npc.strike_window(&mut player),
            Some(AttackResolution::Landed { damage: 25, .. })
        ));
        // Same sequence: flag blocks a second application
        npc.timers.attack_cooldown.advance(5.0);
        assert_eq!(npc.strike_window(&mut player), None);
        assert_eq!(player.health().current(), 75);
    }

    #[test]
    fn test_missing_damage_capability_is_reported() {
        let mut npc = wolf_at(Vec2::new(64.0, 64.0));
        let mut sequence = AttackSequence::start();
        sequence.advance(0.2);
        npc.state = AiState::Attacking(sequence);

        let mut ghost = Ghost {
            position: Vec2::new(70.0, 64.0),
            xp: 0,
        };
        let resolution = npc.strike_window(&mut ghost);
        assert_eq!(
            resolution,
            Some(AttackResolution::Skipped(CombatError::MissingCapability {
                capability: "take_damage"
            }))
        );
        assert!(npc.timers().attack_cooldown.is_ready());
        assert_eq!(ghost.xp, 0);
    }

    #[test]
    fn test_sliding_chaser_faces_its_travel() {
        let mut rng = fastrand::Rng::with_seed(3);
        // Flush with the top edge; the player is mostly above it
        let mut npc = wolf_at(Vec2::new(64.0, 0.0));
        let mut player = PlayerState::new(Vec2::new(50.0, -40.0));

        let report = tick(&mut npc, &mut player, &mut rng);
        assert_eq!(npc.state(), &AiState::Chasing);
        assert_eq!(report.movement, MoveOutcome::Slid);
        assert!(npc.position().x < 64.0);
        assert_eq!(npc.position().y, 0.0);
        assert_eq!(npc.facing(), Direction::Left);
    }

    #[test]
    fn test_interrupted_attack_returns_to_chase() {
        let mut rng = fastrand::Rng::with_seed(2);
        let mut npc = wolf_at(Vec2::new(64.0, 64.0));
        npc.state = AiState::Attacking(AttackSequence::start());

        let mut player = PlayerState::new(Vec2::new(100.0, 64.0));
        let report = tick(&mut npc, &mut player, &mut rng);
        assert_eq!(report.transition, Some((StateTag::Attacking, StateTag::Chasing)));
    }

    #[test]
    fn test_wanderer_turns_at_walls() {
        let mut rng = fastrand::Rng::with_seed(9);
        let mut npc = wolf_at(Vec2::new(0.0, 100.0));
        npc.enter(
            AiState::Wandering {
                direction: Direction::Left,
            },
            &mut rng,
        );
        npc.timers.state.restart(10.0);

        let mut player = PlayerState::new(Vec2::new(300.0, 300.0));
        let report = tick(&mut npc, &mut player, &mut rng);
        assert_eq!(report.movement, MoveOutcome::Blocked);
        match npc.state() {
            AiState::Wandering { direction } => {
                assert_ne!(*direction, Direction::Left);
                assert_eq!(npc.facing(), *direction);
            },
            other => panic!("expected wandering, got {other:?}"),
        }
    }

    #[test]
    fn test_dead_npc_is_inert() {
        let mut rng = fastrand::Rng::with_seed(1);
        let mut npc = wolf_at(Vec2::new(64.0, 64.0));
        assert!(npc.absorb_hit(500).is_kill());
        assert!(npc.mark_dead());
        assert!(!npc.mark_dead());

        let before = npc.clone();
        let mut player = PlayerState::new(Vec2::new(70.0, 64.0));
        let report = tick(&mut npc, &mut player, &mut rng);
        assert_eq!(report, TickReport::inert());
        assert_eq!(npc, before);
        assert_eq!(npc.absorb_hit(10), DamageOutcome::AlreadyDead);
        assert_eq!(npc.health().current(), 0);
        assert_eq!(npc.view().state, StateTag::Dead);
    }

    #[test]
    fn test_invulnerability_and_hurt_flash() {
        let mut profile = SpeciesProfile::wolf();
        profile.invulnerability = 0.3;
        let mut npc = Npc::new(EntityId::new(), Species::Wolf, profile, Vec2::new(64.0, 64.0));

        assert!(matches!(npc.absorb_hit(30), DamageOutcome::Damaged { remaining: 70, .. }));
        assert!(npc.view().hurt_flash);
        assert_eq!(npc.absorb_hit(30), DamageOutcome::Ignored);

        npc.timers.advance(0.3);
        assert!(!npc.view().hurt_flash);
        assert!(matches!(npc.absorb_hit(30), DamageOutcome::Damaged { remaining: 40, .. }));
    }

    #[test]
    fn test_bad_dt_is_sanitized() {
        let tuning = EngineTuning::default();
        assert_eq!(sanitize_dt(-1.0, &tuning), 0.0);
        assert_eq!(sanitize_dt(f32::NAN, &tuning), 0.0);
        assert_eq!(sanitize_dt(10.0, &tuning), tuning.max_frame_dt);
        assert_eq!(sanitize_dt(0.016, &tuning), 0.016);
    }

    #[test]
    fn test_animation_time_advances_while_alive() {
        let mut rng = fastrand::Rng::with_seed(4);
        let mut npc = wolf_at(Vec2::new(64.0, 64.0));
        let mut player = PlayerState::new(Vec2::new(300.0, 300.0));
        let mut last = npc.view().animation_time;
        for _ in 0..10 {
            tick(&mut npc, &mut player, &mut rng);
            let now = npc.view().animation_time;
            assert!(now > last);
            last = now;
        }
    }
}
