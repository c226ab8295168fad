//! The periodic activities that drive a running world.
//!
//! Each activity is split into a single-tick step function, which tests can
//! call directly, and a loop that repeats the step until the stop signal
//! fires. Loops sleep on the [`Shutdown`] listener, so they stop within one
//! tick interval.

use std::sync::Arc;
use std::time::Duration;

use glam::IVec2;
use rand::Rng;
use rayon::prelude::*;

use crate::entity::{Bounds, Entity, EntitySnapshot};
use crate::fight::{FightEvent, FightQueue};
use crate::render::Renderer;
use crate::shutdown::Shutdown;

/// Moves every living entity by a random step in `[-max_step, max_step]` on
/// each axis. Returns the number of entities moved.
///
/// Dead entities are skipped without drawing from `rng`, so the random
/// stream only depends on who is still alive.
pub fn step_movers<R: Rng + ?Sized>(
    entities: &[Arc<Entity>],
    rng: &mut R,
    bounds: Bounds,
    max_step: i32,
) -> usize {
    let max_step = max_step.max(0);
    let mut moved = 0;
    for entity in entities {
        if !entity.is_alive() {
            continue;
        }
        let delta = IVec2::new(
            rng.gen_range(-max_step..=max_step),
            rng.gen_range(-max_step..=max_step),
        );
        entity.move_by(delta, bounds);
        moved += 1;
    }
    moved
}

/// Finds every ordered pair of distinct living entities within `proximity`.
///
/// Each entity is snapshotted once, under its own lock and never together
/// with another entity's lock; the pair test then runs on the snapshots in
/// parallel. Events come back ordered by attacker, then defender, in
/// population order.
#[must_use]
pub fn scan_fights(entities: &[Arc<Entity>], proximity: u32) -> Vec<FightEvent> {
    let alive: Vec<(&Arc<Entity>, EntitySnapshot)> = entities
        .iter()
        .map(|entity| (entity, entity.snapshot()))
        .filter(|(_, snapshot)| snapshot.alive)
        .collect();

    alive
        .par_iter()
        .flat_map_iter(|(attacker, here)| {
            alive
                .iter()
                .filter(move |(_, there)| there.id != here.id && here.is_close(there, proximity))
                .filter_map(move |(defender, _)| {
                    FightEvent::new(Arc::clone(attacker), Arc::clone(defender))
                })
        })
        .collect()
}

/// Snapshots every entity, dead or alive, in population order.
#[must_use]
pub fn snapshot_all(entities: &[Arc<Entity>]) -> Vec<EntitySnapshot> {
    entities.iter().map(|entity| entity.snapshot()).collect()
}

pub(super) fn run_mover<R: Rng>(
    entities: &[Arc<Entity>],
    mut rng: R,
    bounds: Bounds,
    max_step: i32,
    interval: Duration,
    shutdown: &Shutdown,
) {
    let mut ticks: u64 = 0;
    loop {
        step_movers(entities, &mut rng, bounds, max_step);
        ticks += 1;
        if !shutdown.wait(interval) {
            break;
        }
    }
    tracing::debug!(ticks, "mover stopped");
}

pub(super) fn run_detector(
    entities: &[Arc<Entity>],
    queue: &FightQueue,
    proximity: u32,
    interval: Duration,
    shutdown: &Shutdown,
) {
    let mut submitted: u64 = 0;
    loop {
        for event in scan_fights(entities, proximity) {
            if queue.submit(event) {
                submitted += 1;
            }
        }
        if !shutdown.wait(interval) {
            break;
        }
    }
    tracing::debug!(submitted, "detector stopped");
}

pub(super) fn run_renderer(
    entities: &[Arc<Entity>],
    renderer: &mut dyn Renderer,
    interval: Duration,
    shutdown: &Shutdown,
) {
    let mut frames: u64 = 0;
    loop {
        renderer.render(&snapshot_all(entities));
        frames += 1;
        if !shutdown.wait(interval) {
            break;
        }
    }
    tracing::debug!(frames, "renderer stopped");
}
