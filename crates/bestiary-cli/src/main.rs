//! Bestiary runner.
//!
//! Builds a world, either generated from the configuration or loaded from a
//! save file, runs it for a while with an ASCII map on stdout, then saves
//! the survivors.
//!
//! Environment:
//! - `BESTIARY_CONFIG`: JSON world configuration (defaults otherwise)
//! - `BESTIARY_LOAD`: population file to start from instead of generating
//! - `BESTIARY_SAVE`: file the survivors are written to
//! - `BESTIARY_RUN_SECS`: run duration in seconds (default 10)
//! - `RUST_LOG`: log filter

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bestiary_core::persistence;
use bestiary_core::{
    EntityFactory, FightManager, GridRenderer, LogObserver, Notifier, World, WorldConfig,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_RUN_SECS: u64 = 10;

/// Logs one line per living unit under `roster`. Returns how many were logged.
fn log_roster(roster: &'static str, world: &World) -> usize {
    let living: Vec<_> = world.snapshot().into_iter().filter(|s| s.alive).collect();
    tracing::info!(roster, count = living.len(), "roster");
    for unit in &living {
        tracing::info!(roster, unit = %unit, "roster entry");
    }
    living.len()
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bestiary=info,bestiary_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = match std::env::var("BESTIARY_CONFIG") {
        Ok(path) => WorldConfig::from_path(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        Err(_) => WorldConfig::default(),
    };
    let run_for = match std::env::var("BESTIARY_RUN_SECS") {
        Ok(secs) => secs
            .parse()
            .with_context(|| format!("BESTIARY_RUN_SECS is not a number of seconds: {secs}"))?,
        Err(_) => DEFAULT_RUN_SECS,
    };

    let world = match std::env::var("BESTIARY_LOAD") {
        Ok(path) => {
            let factory = EntityFactory::new(config.bounds);
            let report = persistence::load_from_path(&path, &factory)
                .with_context(|| format!("failed to load population from {path}"))?;
            if !report.is_complete() {
                tracing::warn!(
                    path = %path,
                    loaded = report.entities.len(),
                    expected = report.expected,
                    "population partially loaded"
                );
            }
            World::with_entities(config.clone(), report.into_entities())
        }
        Err(_) => World::generate(config.clone()),
    };

    log_roster("starting", &world);

    let mut notifier = Notifier::new();
    notifier.subscribe(Arc::new(LogObserver));
    let renderer = GridRenderer::new(config.bounds, config.grid_size, io::stdout());

    tracing::info!(
        population = world.entities().len(),
        seconds = run_for,
        "starting bestiary"
    );
    let mut running = world
        .start(FightManager::with_standard_rules(notifier), Box::new(renderer))
        .context("failed to start world threads")?;
    std::thread::sleep(Duration::from_secs(run_for));
    running.stop();
    let stats = running.stats();
    let world = running.into_world();

    tracing::info!(
        survivors = world.alive_count(),
        kills = stats.kills,
        stale = stats.stale,
        discarded = stats.discarded,
        "run finished"
    );
    log_roster("survivor", &world);

    if let Ok(path) = std::env::var("BESTIARY_SAVE") {
        let saved = persistence::save_to_path(world.entities(), &path)
            .with_context(|| format!("failed to save survivors to {path}"))?;
        tracing::info!(path = %path, saved, "survivors saved");
    }

    Ok(())
}
