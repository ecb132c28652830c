//! Fixed-step arena loop.

use anyhow::{Context, Result};
use thicket_gameplay::{CollisionMap, EventHandler, NpcManager, PlayerLink};
use tracing::{info, warn};

use crate::arena;
use crate::config::SimConfig;
use crate::event_log::EventLog;
use crate::script::ScriptedPlayer;
use crate::stats::ArenaStats;

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Ticks actually simulated
    pub ticks: u32,
    /// Event totals
    pub stats: ArenaStats,
    /// Player level at the end
    pub player_level: u32,
    /// Player health at the end
    pub player_health: u32,
    /// Player XP earned over the run
    pub player_xp: u32,
    /// Creatures still alive
    pub survivors: usize,
}

/// Runs the built-in arena.
pub fn run(config: &SimConfig) -> Result<RunSummary> {
    let map = arena::build_map().context("built-in arena layout is invalid")?;
    let registry = config.species().context("failed to load species profiles")?;
    let mut npcs = NpcManager::new(config.engine.clone()).with_registry(registry);
    arena::populate(&mut npcs, &map).context("failed to populate arena")?;

    let mut script = ScriptedPlayer::new(config, &arena::PATROL);
    let mut stats = ArenaStats::new();
    let mut log = EventLog::create(config.event_log.as_deref()).context("failed to open event log")?;
    let dt = config.dt();
    info!(
        ticks = config.ticks,
        dt,
        width = map.width(),
        height = map.height(),
        creatures = npcs.len(),
        "Arena ready"
    );

    let mut ticks = 0;
    while ticks < config.ticks {
        ticks += 1;
        script.walk(dt);
        npcs.update_all(dt, &mut script.player, &map);
        script.engage(&mut npcs)?;
        npcs.remove_dead();
        for event in npcs.events().drain() {
            stats.handle(&event);
            log.handle(&event);
        }

        if script.player.is_dead() {
            warn!(tick = ticks, "Player was killed");
            break;
        }
        if npcs.is_empty() {
            info!(tick = ticks, "Arena cleared");
            break;
        }
    }

    log.flush().context("failed to flush event log")?;
    stats.log_summary();
    Ok(RunSummary {
        ticks,
        stats,
        player_level: script.player.level(),
        player_health: script.player.health().current(),
        player_xp: script.player.total_xp(),
        survivors: npcs.living_count(),
    })
}
