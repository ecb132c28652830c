//! Creature species and their tuning profiles.
//!
//! All four creatures run the same state machine; what makes a bear feel
//! different from a beetle is the numbers in its [`SpeciesProfile`].
//! Profiles can be overridden from RON data through [`SpeciesRegistry`].

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::combat::DamageTable;
use crate::spatial::Footprint;

/// Errors raised while loading species data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeciesError {
    /// RON could not be parsed
    #[error("failed to parse species data: {0}")]
    Parse(String),
    /// A profile has inconsistent values
    #[error("invalid profile for {species:?}: {reason}")]
    Invalid {
        /// Offending species
        species: Species,
        /// What is wrong
        reason: &'static str,
    },
}

/// Creature kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    /// Fast pack hunter
    Wolf,
    /// Slow, tough, hits hard
    Bear,
    /// Low and quick to strike
    Snake,
    /// Small and weak
    Beetle,
}

impl Species {
    /// Get display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Wolf => "Wolf",
            Self::Bear => "Bear",
            Self::Snake => "Snake",
            Self::Beetle => "Beetle",
        }
    }

    /// Get all species.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Wolf, Self::Bear, Self::Snake, Self::Beetle]
    }

    /// Built-in profile for this species.
    #[must_use]
    pub fn profile(self) -> SpeciesProfile {
        match self {
            Self::Wolf => SpeciesProfile::wolf(),
            Self::Bear => SpeciesProfile::bear(),
            Self::Snake => SpeciesProfile::snake(),
            Self::Beetle => SpeciesProfile::beetle(),
        }
    }
}

/// A duration drawn uniformly from `base - jitter ..= base + jitter`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Jittered {
    /// Center value in seconds
    pub base: f32,
    /// Maximum deviation in seconds
    pub jitter: f32,
}

impl Jittered {
    /// Creates a jittered duration.
    #[must_use]
    pub const fn new(base: f32, jitter: f32) -> Self {
        Self { base, jitter }
    }

    /// Draws a sample, never negative.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> f32 {
        let offset = (rng.f32() * 2.0 - 1.0) * self.jitter;
        (self.base + offset).max(0.0)
    }
}

/// Every tunable number of a creature.
///
/// Speeds are in pixels per reference frame (see
/// [`EngineTuning::reference_fps`](crate::config::EngineTuning)); durations
/// are in seconds; the attack range is in pixels and the detection range in
/// tiles. Fields missing from RON data take the wolf's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesProfile {
    /// Starting and maximum health
    pub max_health: u32,
    /// Speed while wandering
    pub wander_speed: f32,
    /// Speed while chasing
    pub chase_speed: f32,
    /// Detection range in tiles
    pub detection_tiles: f32,
    /// Attack range in pixels
    pub attack_range: f32,
    /// Minimum time between two damage applications
    pub attack_cooldown: f32,
    /// Frames in one attack sequence
    pub attack_frames: u32,
    /// Length of one attack frame
    pub frame_duration: f32,
    /// Frame index at which the attack deals damage
    pub damage_frame: u32,
    /// Base damage per source
    pub damage: DamageTable,
    /// How long an idle creature waits before considering a wander
    pub idle_dwell: Jittered,
    /// How long a wander lasts
    pub wander_duration: Jittered,
    /// Chance (0..=1) that a finished dwell turns into a wander
    pub wander_chance: f32,
    /// XP granted to the player on death
    pub xp_reward: u32,
    /// Collision box
    pub footprint: Footprint,
    /// How long the hurt flash shows after a hit
    pub hurt_flash: f32,
    /// How long hits are ignored after a hit
    pub invulnerability: f32,
}

impl Default for SpeciesProfile {
    fn default() -> Self {
        Self::wolf()
    }
}

impl SpeciesProfile {
    /// Wolf: the reference creature.
    #[must_use]
    pub fn wolf() -> Self {
        Self {
            max_health: 100,
            wander_speed: 0.5,
            chase_speed: 1.5,
            detection_tiles: 3.0,
            attack_range: 20.0,
            attack_cooldown: 1.0,
            attack_frames: 4,
            frame_duration: 0.1,
            damage_frame: 2,
            damage: DamageTable::default(),
            idle_dwell: Jittered::new(2.0, 1.0),
            wander_duration: Jittered::new(2.0, 1.0),
            wander_chance: 0.6,
            xp_reward: 50,
            footprint: Footprint::new(16.0, 16.0),
            hurt_flash: 0.2,
            invulnerability: 0.0,
        }
    }

    /// Bear: slow windup, heavy hits.
    #[must_use]
    pub fn bear() -> Self {
        Self {
            max_health: 180,
            wander_speed: 0.4,
            chase_speed: 1.1,
            attack_range: 24.0,
            attack_cooldown: 1.5,
            attack_frames: 6,
            frame_duration: 0.12,
            damage_frame: 3,
            damage: DamageTable {
                melee: 35,
                ..DamageTable::default()
            },
            idle_dwell: Jittered::new(3.0, 1.5),
            wander_duration: Jittered::new(2.5, 1.0),
            wander_chance: 0.4,
            xp_reward: 90,
            footprint: Footprint::new(24.0, 24.0),
            ..Self::wolf()
        }
    }

    /// Snake: short reach, quick strikes.
    #[must_use]
    pub fn snake() -> Self {
        Self {
            max_health: 60,
            wander_speed: 0.3,
            chase_speed: 1.0,
            attack_range: 16.0,
            attack_cooldown: 0.8,
            damage: DamageTable {
                melee: 15,
                ..DamageTable::default()
            },
            idle_dwell: Jittered::new(2.5, 1.0),
            wander_duration: Jittered::new(1.5, 0.5),
            wander_chance: 0.5,
            xp_reward: 30,
            footprint: Footprint::new(16.0, 8.0),
            ..Self::wolf()
        }
    }

    /// Beetle: weak and slow.
    #[must_use]
    pub fn beetle() -> Self {
        Self {
            max_health: 40,
            wander_speed: 0.35,
            chase_speed: 0.9,
            attack_range: 14.0,
            attack_cooldown: 1.2,
            attack_frames: 3,
            frame_duration: 0.15,
            damage_frame: 1,
            damage: DamageTable {
                melee: 10,
                ..DamageTable::default()
            },
            idle_dwell: Jittered::new(1.5, 0.5),
            wander_duration: Jittered::new(3.0, 1.0),
            wander_chance: 0.7,
            xp_reward: 20,
            footprint: Footprint::new(12.0, 12.0),
            ..Self::wolf()
        }
    }

    /// Total length of one attack sequence.
    #[must_use]
    pub fn attack_duration(&self) -> f32 {
        self.attack_frames as f32 * self.frame_duration
    }

    /// Attack frame shown after `elapsed` seconds of the sequence.
    #[must_use]
    pub fn frame_at(&self, elapsed: f32) -> u32 {
        if self.frame_duration <= 0.0 {
            return self.attack_frames.saturating_sub(1);
        }
        let frame = (elapsed.max(0.0) / self.frame_duration).floor() as u32;
        frame.min(self.attack_frames.saturating_sub(1))
    }

    /// Checks that the numbers are usable.
    pub fn validate(&self, species: Species) -> Result<(), SpeciesError> {
        let invalid = |reason| Err(SpeciesError::Invalid { species, reason });
        if self.max_health == 0 {
            return invalid("max_health must be positive");
        }
        if self.attack_frames == 0 {
            return invalid("attack_frames must be positive");
        }
        if self.damage_frame >= self.attack_frames {
            return invalid("damage_frame must be below attack_frames");
        }
        if !(self.frame_duration.is_finite() && self.frame_duration > 0.0) {
            return invalid("frame_duration must be positive");
        }
        let non_negative = [
            self.wander_speed,
            self.chase_speed,
            self.detection_tiles,
            self.attack_range,
            self.attack_cooldown,
            self.hurt_flash,
            self.invulnerability,
            self.footprint.width,
            self.footprint.height,
        ];
        if non_negative.iter().any(|v| !(v.is_finite() && *v >= 0.0)) {
            return invalid("speeds, ranges, durations and footprint must be finite and non-negative");
        }
        if !(0.0..=1.0).contains(&self.wander_chance) {
            return invalid("wander_chance must be within 0..=1");
        }
        Ok(())
    }
}

/// Profiles by species, with built-ins as the fallback.
#[derive(Debug, Clone)]
pub struct SpeciesRegistry {
    profiles: AHashMap<Species, SpeciesProfile>,
}

impl Default for SpeciesRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SpeciesRegistry {
    /// Registry holding the built-in profile of every species.
    #[must_use]
    pub fn builtin() -> Self {
        let profiles = Species::all()
            .into_iter()
            .map(|species| (species, species.profile()))
            .collect();
        Self { profiles }
    }

    /// Parses RON of the form `{ Wolf: (max_health: 120), Bear: (...) }` and
    /// layers it over the built-ins.
    pub fn from_ron_str(source: &str) -> Result<Self, SpeciesError> {
        let overrides: HashMap<Species, SpeciesProfile> =
            ron::from_str(source).map_err(|e| SpeciesError::Parse(e.to_string()))?;

        let mut registry = Self::builtin();
        for (species, profile) in overrides {
            registry.insert(species, profile)?;
        }
        Ok(registry)
    }

    /// Replaces one species' profile after validating it.
    pub fn insert(&mut self, species: Species, profile: SpeciesProfile) -> Result<(), SpeciesError> {
        profile.validate(species)?;
        self.profiles.insert(species, profile);
        Ok(())
    }

    /// Profile for a species.
    #[must_use]
    pub fn get(&self, species: Species) -> SpeciesProfile {
        self.profiles
            .get(&species)
            .cloned()
            .unwrap_or_else(|| species.profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles_are_valid() {
        for species in Species::all() {
            species
                .profile()
                .validate(species)
                .expect("built-in profile should be valid");
        }
    }

    #[test]
    fn test_wolf_canonical_values() {
        let wolf = Species::Wolf.profile();
        assert_eq!(wolf.max_health, 100);
        assert_eq!(wolf.damage.melee, 25);
        assert_eq!(wolf.damage.sword, 30);
        assert_eq!(wolf.damage.arrow, 21);
        assert_eq!(wolf.damage.charged_arrow, 48);
        assert_eq!(wolf.xp_reward, 50);
        assert_eq!(wolf.detection_tiles, 3.0);
        assert!((wolf.attack_duration() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_species_differ() {
        let bear = Species::Bear.profile();
        let beetle = Species::Beetle.profile();
        assert!(bear.max_health > beetle.max_health);
        assert!(bear.damage.melee > beetle.damage.melee);
        assert_eq!(Species::Snake.display_name(), "Snake");
    }

    #[test]
    fn test_frame_at() {
        let wolf = SpeciesProfile::wolf();
        assert_eq!(wolf.frame_at(0.0), 0);
        assert_eq!(wolf.frame_at(0.15), 1);
        assert_eq!(wolf.frame_at(0.25), 2);
        assert_eq!(wolf.frame_at(5.0), 3);
        assert_eq!(wolf.frame_at(-1.0), 0);
    }

    #[test]
    fn test_jittered_sample_in_range() {
        let mut rng = fastrand::Rng::with_seed(7);
        let dwell = Jittered::new(2.0, 0.5);
        for _ in 0..200 {
            let v = dwell.sample(&mut rng);
            assert!((1.5..=2.5).contains(&v));
        }
        assert!(Jittered::new(0.1, 5.0).sample(&mut rng) >= 0.0);
    }

    #[test]
    fn test_validate_rejects_bad_profiles() {
        let mut profile = SpeciesProfile::wolf();
        profile.damage_frame = 4;
        assert!(matches!(
            profile.validate(Species::Wolf),
            Err(SpeciesError::Invalid { .. })
        ));

        let mut profile = SpeciesProfile::wolf();
        profile.chase_speed = f32::NAN;
        assert!(profile.validate(Species::Wolf).is_err());

        let mut profile = SpeciesProfile::wolf();
        profile.wander_chance = 1.5;
        assert!(profile.validate(Species::Wolf).is_err());
    }

    #[test]
    fn test_registry_from_ron() {
        let registry = SpeciesRegistry::from_ron_str(
            "{ Bear: (max_health: 250, xp_reward: 120), Beetle: (chase_speed: 2.0) }",
        )
        .expect("RON should parse");

        let bear = registry.get(Species::Bear);
        assert_eq!(bear.max_health, 250);
        assert_eq!(bear.xp_reward, 120);
        // Untouched species keep their built-in profile
        assert_eq!(registry.get(Species::Snake), SpeciesProfile::snake());
        assert_eq!(registry.get(Species::Beetle).chase_speed, 2.0);
    }

    #[test]
    fn test_registry_rejects_invalid_ron() {
        assert!(matches!(
            SpeciesRegistry::from_ron_str("{ Wolf: (max_health: \"lots\") }"),
            Err(SpeciesError::Parse(_))
        ));
        assert!(matches!(
            SpeciesRegistry::from_ron_str("{ Wolf: (attack_frames: 0) }"),
            Err(SpeciesError::Invalid { .. })
        ));
    }
}
