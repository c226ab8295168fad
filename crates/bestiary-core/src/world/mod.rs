//! World orchestration.
//!
//! A [`World`] owns the entity population. [`World::start`] launches four
//! named threads that share it:
//!
//! 1. **Fight manager**: the single consumer of the fight queue
//! 2. **Mover**: random walk of every living entity, clamped to the bounds
//! 3. **Detector**: proximity scan, submitting fight events
//! 4. **Renderer**: periodic snapshot frames handed to a [`Renderer`]
//!
//! The returned [`RunningWorld`] walks the lifecycle
//! `Running -> Stopping -> Stopped`: stopping fires one shared stop signal,
//! then joins every thread.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use bestiary_core::config::WorldConfig;
//! use bestiary_core::entity::EntitySnapshot;
//! use bestiary_core::fight::FightManager;
//! use bestiary_core::observer::{FightLog, Notifier};
//! use bestiary_core::world::{World, WorldStatus};
//!
//! let config = WorldConfig { population: 20, ..WorldConfig::default() };
//! let log = Arc::new(FightLog::new());
//! let mut notifier = Notifier::new();
//! notifier.subscribe(log.clone());
//!
//! let world = World::generate(config);
//! let mut running = world
//!     .start(
//!         FightManager::with_standard_rules(notifier),
//!         Box::new(|_: &[EntitySnapshot]| {}),
//!     )
//!     .unwrap();
//! std::thread::sleep(Duration::from_millis(100));
//! running.stop();
//!
//! assert_eq!(running.status(), WorldStatus::Stopped);
//! ```

mod activities;

pub use activities::{scan_fights, snapshot_all, step_movers};

use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;
use crate::entity::{Entity, EntityFactory, EntitySnapshot};
use crate::fight::{FightManager, FightQueue, FightStats};
use crate::render::Renderer;
use crate::shutdown::{self, ShutdownTrigger};

// ChaCha stream for movement; population generation uses stream 0.
const MOVER_STREAM: u64 = 1;

/// Lifecycle of a running world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorldStatus {
    /// All activities are running
    Running,
    /// The stop signal has fired; activities are being joined
    Stopping,
    /// Every activity has exited
    Stopped,
}

impl fmt::Display for WorldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "Running"),
            Self::Stopping => write!(f, "Stopping"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

/// An entity population and the configuration it runs under.
///
/// Cloning a world is cheap and shares the same entities.
#[derive(Debug, Clone)]
pub struct World {
    config: WorldConfig,
    entities: Arc<[Arc<Entity>]>,
}

impl World {
    /// Adopts an existing population, e.g. one loaded from a save file.
    #[must_use]
    pub fn with_entities(config: WorldConfig, entities: Vec<Arc<Entity>>) -> Self {
        Self {
            config,
            entities: entities.into(),
        }
    }

    /// Generates `config.population` random entities from `config.seed`.
    #[must_use]
    pub fn generate(config: WorldConfig) -> Self {
        let factory = EntityFactory::new(config.bounds);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let entities = factory.populate(&mut rng, config.population);
        tracing::info!(population = entities.len(), seed = config.seed, "world generated");
        Self::with_entities(config, entities)
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns the population, dead entities included.
    #[must_use]
    pub fn entities(&self) -> &[Arc<Entity>] {
        &self.entities
    }

    /// Snapshots every entity, one at a time.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        snapshot_all(&self.entities)
    }

    /// Counts living entities.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.entities.iter().filter(|e| e.is_alive()).count()
    }

    /// Launches the fight manager and the three activities.
    ///
    /// Observers must already be registered on `manager`'s notifier.
    ///
    /// # Errors
    ///
    /// Returns the OS error if a thread cannot be spawned. Threads that did
    /// start are stopped and joined before returning.
    pub fn start(
        self,
        manager: FightManager,
        mut renderer: Box<dyn Renderer>,
    ) -> std::io::Result<RunningWorld> {
        let (trigger, shutdown) = shutdown::channel();
        let manager = Arc::new(manager);
        let mut running = RunningWorld {
            world: self.clone(),
            manager: Arc::clone(&manager),
            status: WorldStatus::Running,
            trigger: Some(trigger),
            workers: Vec::with_capacity(4),
        };

        {
            let shutdown = shutdown.clone();
            running.spawn("fight-manager", move || manager.run(&shutdown))?;
        }

        {
            let entities = Arc::clone(&self.entities);
            let shutdown = shutdown.clone();
            let bounds = self.config.bounds;
            let max_step = self.config.max_step;
            let interval = self.config.move_interval();
            let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
            rng.set_stream(MOVER_STREAM);
            running.spawn("mover", move || {
                activities::run_mover(&entities, rng, bounds, max_step, interval, &shutdown);
            })?;
        }

        {
            let entities = Arc::clone(&self.entities);
            let shutdown = shutdown.clone();
            let queue = running.queue();
            let proximity = self.config.proximity_distance;
            let interval = self.config.detect_interval();
            running.spawn("detector", move || {
                activities::run_detector(&entities, &queue, proximity, interval, &shutdown);
            })?;
        }

        {
            let entities = Arc::clone(&self.entities);
            let interval = self.config.render_interval();
            running.spawn("renderer", move || {
                activities::run_renderer(&entities, renderer.as_mut(), interval, &shutdown);
            })?;
        }

        tracing::info!(population = self.entities.len(), "world running");
        Ok(running)
    }
}

/// Handle to a world whose activities are running.
///
/// Dropping the handle stops the world.
pub struct RunningWorld {
    world: World,
    manager: Arc<FightManager>,
    status: WorldStatus,
    trigger: Option<ShutdownTrigger>,
    workers: Vec<(&'static str, JoinHandle<()>)>,
}

impl fmt::Debug for RunningWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningWorld")
            .field("status", &self.status)
            .field("population", &self.world.entities.len())
            .field(
                "workers",
                &self.workers.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl RunningWorld {
    fn spawn<F>(&mut self, name: &'static str, body: F) -> std::io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name(format!("bestiary-{name}"))
            .spawn(move || {
                let _span = tracing::info_span!("activity", name).entered();
                body();
            })?;
        self.workers.push((name, handle));
        Ok(())
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn status(&self) -> WorldStatus {
        self.status
    }

    /// The world being simulated.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// A submit handle for the world's fight queue.
    #[must_use]
    pub fn queue(&self) -> FightQueue {
        self.manager.queue()
    }

    /// Fight manager counters.
    #[must_use]
    pub fn stats(&self) -> FightStats {
        self.manager.stats()
    }

    /// Fires the stop signal and joins every activity.
    ///
    /// Idempotent. Events still queued are discarded. A thread that
    /// panicked is logged, not propagated.
    pub fn stop(&mut self) {
        if self.status == WorldStatus::Stopped {
            return;
        }

        self.status = WorldStatus::Stopping;
        tracing::info!(status = %self.status, "stopping world");
        if let Some(trigger) = self.trigger.take() {
            trigger.fire();
        }

        for (name, handle) in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!(activity = name, "activity panicked");
            }
        }

        self.status = WorldStatus::Stopped;
        let stats = self.manager.stats();
        tracing::info!(
            status = %self.status,
            alive = self.world.alive_count(),
            kills = stats.kills,
            stale = stats.stale,
            discarded = stats.discarded,
            "world stopped"
        );
    }

    /// Stops the world and returns it.
    #[must_use]
    pub fn into_world(mut self) -> World {
        self.stop();
        self.world.clone()
    }
}

impl Drop for RunningWorld {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Bounds, Kind};
    use crate::observer::Notifier;
    use glam::IVec2;

    #[test]
    fn generate_respects_population_and_bounds() {
        let config = WorldConfig {
            population: 25,
            bounds: Bounds::new(30, 40),
            ..WorldConfig::default()
        };
        let world = World::generate(config);
        assert_eq!(world.entities().len(), 25);
        assert_eq!(world.alive_count(), 25);
        assert!(world
            .snapshot()
            .iter()
            .all(|s| Bounds::new(30, 40).contains(s.position)));
    }

    #[test]
    fn generate_is_reproducible() {
        let kinds = |world: &World| {
            world
                .snapshot()
                .iter()
                .map(|s| (s.kind, s.position))
                .collect::<Vec<_>>()
        };
        let a = World::generate(WorldConfig::default());
        let b = World::generate(WorldConfig::default());
        assert_eq!(kinds(&a), kinds(&b));
    }

    #[test]
    fn with_entities_keeps_order() {
        let factory = EntityFactory::new(Bounds::default());
        let entities = vec![
            factory.create(Kind::Dragon, IVec2::new(1, 1)).unwrap(),
            factory.create(Kind::Knight, IVec2::new(2, 2)).unwrap(),
        ];
        let world = World::with_entities(WorldConfig::default(), entities);
        let kinds: Vec<_> = world.snapshot().iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![Kind::Dragon, Kind::Knight]);
    }

    #[test]
    fn status_display() {
        assert_eq!(WorldStatus::Running.to_string(), "Running");
        assert_eq!(WorldStatus::Stopping.to_string(), "Stopping");
        assert_eq!(WorldStatus::Stopped.to_string(), "Stopped");
    }

    #[test]
    fn start_then_stop_joins_everything() {
        let world = World::generate(WorldConfig {
            population: 10,
            ..WorldConfig::default()
        });
        let mut running = world
            .start(
                FightManager::with_standard_rules(Notifier::new()),
                Box::new(|_: &[EntitySnapshot]| {}),
            )
            .unwrap();
        assert_eq!(running.status(), WorldStatus::Running);

        running.stop();
        assert_eq!(running.status(), WorldStatus::Stopped);

        running.stop();
        assert_eq!(running.status(), WorldStatus::Stopped);
    }
}
