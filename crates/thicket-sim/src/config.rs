//! Simulator configuration.
//!
//! Loaded from `thicket.toml`. A missing or broken file falls back to the
//! defaults so the arena always runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thicket_common::{ThicketError, ThicketResult};
use thicket_gameplay::{EngineTuning, SpeciesRegistry};
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "thicket.toml";

/// Simulator parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Run ===
    /// Number of ticks to simulate
    pub ticks: u32,
    /// Ticks per simulated second
    pub tick_rate: f32,

    // === Player ===
    /// Starting level
    pub player_level: u32,
    /// Starting health
    pub player_health: u32,
    /// Walking speed in pixels per second
    pub player_speed: f32,
    /// Seconds between two swings or shots
    pub swing_interval: f32,
    /// Sword reach in pixels
    pub sword_reach: f32,
    /// Bow range in pixels
    pub bow_range: f32,

    // === Content ===
    /// Optional RON file overriding species profiles
    pub species_file: Option<PathBuf>,

    // === Output ===
    /// Optional JSON-lines file receiving every engine event
    pub event_log: Option<PathBuf>,

    // === Engine ===
    /// Engine tuning
    pub engine: EngineTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: 3_600,
            tick_rate: 60.0,

            player_level: 1,
            player_health: 400,
            player_speed: 40.0,
            swing_interval: 0.5,
            sword_reach: 24.0,
            bow_range: 72.0,

            species_file: None,

            event_log: None,

            engine: EngineTuning::default().with_seed(7_171),
        }
    }
}

impl SimConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match toml::from_str::<Self>(&contents) {
            Ok(mut config) => {
                if let Err(e) = config.engine.check() {
                    warn!("Invalid engine settings, using engine defaults: {e}");
                    config.engine = EngineTuning::default();
                }
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(10.0, 240.0);
        self.player_level = self.player_level.clamp(1, 99);
        self.player_health = self.player_health.max(1);
        self.player_speed = self.player_speed.clamp(0.0, 500.0);
        self.swing_interval = self.swing_interval.clamp(0.05, 10.0);
        self.sword_reach = self.sword_reach.clamp(1.0, 128.0);
        self.bow_range = self.bow_range.clamp(self.sword_reach, 512.0);
        self.engine.validate();
    }

    /// Seconds per tick.
    #[must_use]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate
    }

    /// Species profiles: built-ins, overridden by `species_file` if set.
    pub fn species(&self) -> ThicketResult<SpeciesRegistry> {
        let Some(path) = &self.species_file else {
            return Ok(SpeciesRegistry::builtin());
        };
        let source = fs::read_to_string(path)?;
        let registry = SpeciesRegistry::from_ron_str(&source)
            .map_err(|e| ThicketError::Content(format!("{}: {e}", path.display())))?;
        info!("Loaded species profiles from {}", path.display());
        Ok(registry)
    }
}
