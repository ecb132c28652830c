//! Movement integration against the collision oracle.
//!
//! A state produces a [`MoveIntent`]; [`integrate`] turns it into a
//! candidate position, clamps it to the map bounds, and commits it only if
//! the oracle accepts the footprint there. Chasers that are blocked try each
//! axis on its own before giving up (wall sliding). Wanderers just report
//! the block so the caller can pick another heading.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ai::Direction;
use crate::config::EngineTuning;
use crate::spatial::{CollisionMap, Footprint};

/// What a state wants to do with the entity's position this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveIntent {
    /// Don't move
    Stay,
    /// Walk in a fixed direction, stopping at obstacles
    Walk {
        /// Heading
        direction: Direction,
        /// Pixels per reference frame
        speed: f32,
    },
    /// Head toward a point, sliding along obstacles
    Pursue {
        /// Target position
        target: Vec2,
        /// Pixels per reference frame
        speed: f32,
    },
}

impl MoveIntent {
    /// Whether blocked movement should fall back to single-axis moves.
    #[must_use]
    pub const fn slides(&self) -> bool {
        matches!(self, Self::Pursue { .. })
    }

    fn velocity(&self, from: Vec2) -> Vec2 {
        match *self {
            Self::Stay => Vec2::ZERO,
            Self::Walk { direction, speed } => direction.to_vec2() * speed,
            Self::Pursue { target, speed } => (target - from).normalize_or_zero() * speed,
        }
    }
}

/// How the integrator resolved a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// Nothing to do
    Stationary,
    /// Full move committed
    Moved,
    /// Only one axis of the move was committed
    Slid,
    /// The move was refused; position unchanged
    Blocked,
    /// The candidate was not finite; position unchanged
    Reverted,
}

impl MoveOutcome {
    /// Whether the position changed.
    #[must_use]
    pub const fn moved(self) -> bool {
        matches!(self, Self::Moved | Self::Slid)
    }
}

/// Resolved position after integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Movement {
    /// Committed position (the previous one when nothing was committed)
    pub position: Vec2,
    /// Displacement that was attempted
    pub attempted: Vec2,
    /// Resolution
    pub outcome: MoveOutcome,
}

/// Keeps a footprint inside the map, `margin` pixels from each edge.
#[must_use]
pub fn clamp_to_bounds<M: CollisionMap + ?Sized>(
    position: Vec2,
    footprint: Footprint,
    map: &M,
    margin: f32,
) -> Vec2 {
    let max_x = map.width() - footprint.width - margin;
    let max_y = map.height() - footprint.height - margin;
    // min/max rather than clamp: a footprint wider than the map has max < min.
    Vec2::new(
        position.x.min(max_x).max(margin),
        position.y.min(max_y).max(margin),
    )
}

/// Applies a move intent for `dt` seconds.
pub fn integrate<M: CollisionMap + ?Sized>(
    position: Vec2,
    footprint: Footprint,
    intent: MoveIntent,
    dt: f32,
    map: &M,
    tuning: &EngineTuning,
) -> Movement {
    let attempted = intent.velocity(position) * dt * tuning.reference_fps;
    let stay = |outcome| Movement {
        position,
        attempted,
        outcome,
    };

    if attempted == Vec2::ZERO {
        return stay(MoveOutcome::Stationary);
    }

    let raw = position + attempted;
    if !raw.is_finite() {
        warn!(?position, ?attempted, "Non-finite candidate position, reverting");
        return stay(MoveOutcome::Reverted);
    }

    let accepts = |candidate: Vec2| {
        let candidate = clamp_to_bounds(candidate, footprint, map, tuning.boundary_margin);
        (candidate != position && map.allows(candidate, footprint)).then_some(candidate)
    };

    if let Some(next) = accepts(raw) {
        return Movement {
            position: next,
            attempted,
            outcome: MoveOutcome::Moved,
        };
    }

    if intent.slides() {
        let horizontal = Vec2::new(raw.x, position.y);
        let vertical = Vec2::new(position.x, raw.y);
        for candidate in [horizontal, vertical] {
            if let Some(next) = accepts(candidate) {
                return Movement {
                    position: next,
                    attempted,
                    outcome: MoveOutcome::Slid,
                };
            }
        }
    }

    stay(MoveOutcome::Blocked)
}
