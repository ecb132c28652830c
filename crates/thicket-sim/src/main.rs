//! # Thicket Arena
//!
//! Headless runner for the Thicket creature engine.
//!
//! Builds the built-in arena, spawns one of each creature, and lets a
//! scripted player patrol and fight for a fixed number of ticks:
//! - Config: `thicket.toml` (or the path given as the first argument)
//! - Logging: `RUST_LOG` on top of the default `thicket=info`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod arena;
mod config;
mod event_log;
mod script;
mod sim;
mod stats;

use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{SimConfig, CONFIG_FILE};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("thicket=info".parse()?))
        .init();

    info!("Thicket arena starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let config = SimConfig::load_from(&path);
    if !path.exists() {
        if let Err(e) = config.save_to(&path) {
            warn!("Failed to write default config: {e}");
        }
    }

    let summary = sim::run(&config)?;
    info!(
        ticks = summary.ticks,
        kills = summary.stats.kills,
        level = summary.player_level,
        health = summary.player_health,
        xp = summary.player_xp,
        survivors = summary.survivors,
        "Thicket arena finished"
    );
    Ok(())
}
