//! AI state machine for creatures.
//!
//! Every creature is in exactly one [`AiState`]. Each tick [`decide`] looks at
//! how far away the player is and at the state timer and returns a
//! [`Decision`]; the entity then applies it (see `Npc::update`). `decide` only
//! reads, so the same inputs always yield the same decision for a given RNG
//! state.
//!
//! ```text
//!   Idle ──dwell──▶ Wandering ──duration──▶ Idle
//!    │                 │
//!    └──player ≤ detection──▶ Chasing ◀──out of range / sequence done── Attacking
//!                            │   ▲                                          ▲
//!                            │   └──────────────────────────────────────────┘
//!                            └──player > detection──▶ Idle      (≤ attack range)
//! ```
//!
//! `Dead` is reachable from any state and never left.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::spatial;
use crate::species::SpeciesProfile;
use crate::timers::Timer;

/// Facing direction. `Down` is +y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Facing up
    Up,
    /// Facing down (default)
    #[default]
    Down,
    /// Facing left
    Left,
    /// Facing right
    Right,
}

impl Direction {
    /// All four directions.
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// Convert direction to a unit vector.
    #[must_use]
    pub fn to_vec2(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }

    /// Direction of the dominant axis of a vector.
    #[must_use]
    pub fn from_vec2(v: Vec2) -> Option<Self> {
        if v.x == 0.0 && v.y == 0.0 {
            return None;
        }

        if v.x.abs() > v.y.abs() {
            if v.x > 0.0 {
                Some(Direction::Right)
            } else {
                Some(Direction::Left)
            }
        } else if v.y > 0.0 {
            Some(Direction::Down)
        } else {
            Some(Direction::Up)
        }
    }

    /// Uniformly random direction.
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        Self::ALL[rng.usize(..Self::ALL.len())]
    }

    /// Uniformly random direction other than `self`.
    pub fn random_other(self, rng: &mut fastrand::Rng) -> Self {
        let pick = rng.usize(..Self::ALL.len() - 1);
        Self::ALL
            .into_iter()
            .filter(|d| *d != self)
            .nth(pick)
            .unwrap_or(self)
    }
}

/// Progress through one attack sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AttackSequence {
    elapsed: f32,
    damage_applied: bool,
}

impl AttackSequence {
    /// A fresh sequence at frame 0 with no damage applied.
    #[must_use]
    pub const fn start() -> Self {
        Self {
            elapsed: 0.0,
            damage_applied: false,
        }
    }

    /// Seconds since the sequence began.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Whether this sequence already dealt its damage.
    #[must_use]
    pub const fn damage_applied(&self) -> bool {
        self.damage_applied
    }

    /// Adds `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// Records that damage was dealt.
    pub fn mark_applied(&mut self) {
        self.damage_applied = true;
    }

    /// Current frame index.
    #[must_use]
    pub fn frame(&self, profile: &SpeciesProfile) -> u32 {
        profile.frame_at(self.elapsed)
    }

    /// Whether the damage frame has been reached.
    #[must_use]
    pub fn in_hit_window(&self, profile: &SpeciesProfile) -> bool {
        self.frame(profile) >= profile.damage_frame
    }

    /// Whether every frame has played.
    #[must_use]
    pub fn is_complete(&self, profile: &SpeciesProfile) -> bool {
        self.elapsed >= profile.attack_duration()
    }
}

/// AI state with per-state data.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AiState {
    /// Standing still
    #[default]
    Idle,
    /// Walking in a fixed direction
    Wandering {
        /// Heading
        direction: Direction,
    },
    /// Moving toward the player
    Chasing,
    /// Playing an attack sequence
    Attacking(AttackSequence),
    /// Terminal
    Dead,
}

impl AiState {
    /// State tag without payload.
    #[must_use]
    pub const fn tag(&self) -> StateTag {
        match self {
            Self::Idle => StateTag::Idle,
            Self::Wandering { .. } => StateTag::Wandering,
            Self::Chasing => StateTag::Chasing,
            Self::Attacking(_) => StateTag::Attacking,
            Self::Dead => StateTag::Dead,
        }
    }

    /// Whether this is the terminal state.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        matches!(self, Self::Dead)
    }
}

/// Payload-free state name, for renderers, events and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateTag {
    /// Idle
    Idle,
    /// Wandering
    Wandering,
    /// Chasing
    Chasing,
    /// Attacking
    Attacking,
    /// Dead
    Dead,
}

impl StateTag {
    /// Get display name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Wandering => "wandering",
            Self::Chasing => "chasing",
            Self::Attacking => "attacking",
            Self::Dead => "dead",
        }
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What a creature knows about the player at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perception {
    /// Distance in pixels
    pub distance: f32,
    /// Distance in tiles
    pub tile_distance: f32,
}

impl Perception {
    /// Measures the distance between a creature and the player.
    #[must_use]
    pub fn between(npc: Vec2, player: Vec2, tile_size: f32) -> Self {
        Self {
            distance: spatial::distance(npc, player),
            tile_distance: spatial::tile_distance(npc, player, tile_size),
        }
    }

    /// Whether the player is inside the detection range (inclusive).
    #[must_use]
    pub fn detects(&self, profile: &SpeciesProfile) -> bool {
        self.tile_distance <= profile.detection_tiles
    }

    /// Whether the player is inside the attack range (inclusive).
    #[must_use]
    pub fn in_attack_range(&self, profile: &SpeciesProfile) -> bool {
        self.distance <= profile.attack_range
    }
}

/// Result of evaluating the state machine for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Keep the current state
    Stay,
    /// Stay idle but draw a new dwell time
    RestartDwell,
    /// Switch to a new state
    Enter(AiState),
}

/// Evaluates the transition rules for one tick.
///
/// `timer` is the state timer; its duration is the dwell (idle) or wander
/// duration drawn when the state was entered.
pub fn decide(
    state: &AiState,
    perception: Perception,
    timer: &Timer,
    profile: &SpeciesProfile,
    rng: &mut fastrand::Rng,
) -> Decision {
    match state {
        AiState::Dead => Decision::Stay,
        AiState::Idle => {
            if perception.detects(profile) {
                Decision::Enter(AiState::Chasing)
            } else if timer.finished() {
                if rng.f32() < profile.wander_chance {
                    Decision::Enter(AiState::Wandering {
                        direction: Direction::random(rng),
                    })
                } else {
                    Decision::RestartDwell
                }
            } else {
                Decision::Stay
            }
        },
        AiState::Wandering { .. } => {
            if perception.detects(profile) {
                Decision::Enter(AiState::Chasing)
            } else if timer.finished() {
                Decision::Enter(AiState::Idle)
            } else {
                Decision::Stay
            }
        },
        AiState::Chasing => {
            if !perception.detects(profile) {
                Decision::Enter(AiState::Idle)
            } else if perception.in_attack_range(profile) {
                Decision::Enter(AiState::Attacking(AttackSequence::start()))
            } else {
                Decision::Stay
            }
        },
        AiState::Attacking(sequence) => {
            if !perception.in_attack_range(profile) || sequence.is_complete(profile) {
                Decision::Enter(AiState::Chasing)
            } else {
                Decision::Stay
            }
        },
    }
}
