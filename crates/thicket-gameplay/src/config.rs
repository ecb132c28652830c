//! Engine tuning shared by every creature.

use serde::{Deserialize, Serialize};
use thicket_common::ConfigError;

/// Global knobs of the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    /// Frame rate that speeds are expressed against. A speed of 1.5 moves
    /// 1.5 px per frame at this rate.
    pub reference_fps: f32,
    /// Distance kept from the map edge, in pixels
    pub boundary_margin: f32,
    /// Largest `dt` accepted by a single tick, in seconds
    pub max_frame_dt: f32,
    /// Seed for the behavior RNG (None = random)
    pub rng_seed: Option<u64>,
    /// Capacity of the event bus
    pub event_capacity: usize,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            reference_fps: 60.0,
            boundary_margin: 0.0,
            max_frame_dt: 0.25,
            rng_seed: None,
            event_capacity: 1024,
        }
    }
}

impl EngineTuning {
    /// Parses tuning from TOML, then validates it.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let mut tuning: Self = toml::from_str(source).map_err(|e| ConfigError::Parse {
            format: "toml",
            message: e.to_string(),
        })?;
        tuning.check()?;
        tuning.validate();
        Ok(tuning)
    }

    /// Rejects values that cannot be clamped into something meaningful.
    pub fn check(&self) -> Result<(), ConfigError> {
        let finite = [
            ("reference_fps", self.reference_fps),
            ("boundary_margin", self.boundary_margin),
            ("max_frame_dt", self.max_frame_dt),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::OutOfRange {
                    field,
                    value: f64::from(value),
                });
            }
        }
        Ok(())
    }

    /// Clamps values to sensible ranges.
    pub fn validate(&mut self) {
        self.reference_fps = self.reference_fps.clamp(1.0, 1000.0);
        self.boundary_margin = self.boundary_margin.clamp(0.0, 64.0);
        self.max_frame_dt = self.max_frame_dt.clamp(0.001, 1.0);
        self.event_capacity = self.event_capacity.clamp(16, 65_536);
    }

    /// Sets the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let tuning = EngineTuning::default();
        assert_eq!(tuning.reference_fps, 60.0);
        assert_eq!(tuning.event_capacity, 1024);
        assert_eq!(tuning.rng_seed, None);
        assert_eq!(tuning.with_seed(7).rng_seed, Some(7));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let tuning = EngineTuning::from_toml_str("boundary_margin = 2.0\nrng_seed = 42\n")
            .expect("valid toml");
        assert_eq!(tuning.boundary_margin, 2.0);
        assert_eq!(tuning.rng_seed, Some(42));
        assert_eq!(tuning.reference_fps, 60.0);
    }

    #[test]
    fn test_validation_clamps() {
        let tuning = EngineTuning::from_toml_str("reference_fps = 0.0\nmax_frame_dt = 9.0\n")
            .expect("valid toml");
        assert_eq!(tuning.reference_fps, 1.0);
        assert_eq!(tuning.max_frame_dt, 1.0);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(matches!(
            EngineTuning::from_toml_str("reference_fps = \"fast\""),
            Err(ConfigError::Parse { format: "toml", .. })
        ));
        assert!(matches!(
            EngineTuning::from_toml_str("boundary_margin = nan"),
            Err(ConfigError::OutOfRange {
                field: "boundary_margin",
                ..
            })
        ));
    }
}
