//! Fight manager: the single authority over death.
//!
//! Detectors only *propose* fights by submitting [`FightEvent`]s to a
//! [`FightQueue`]. One [`FightManager`] consumer processes them in FIFO
//! order, and it is the only code path in the simulation that kills. This
//! serialization is what rules out double kills and two attackers "winning"
//! against the same victim.
//!
//! # Processing
//!
//! For each event, in submission order:
//! 1. If either participant is already dead, the event is stale and dropped
//! 2. The [`Resolver`] decides whether the defender dies
//! 3. On a kill, the defender is marked dead and observers are notified
//!
//! Combat is one-directional: the attacker never dies from its own event.
//! A mutual kill needs the reverse-ordered event to be processed as well,
//! and since the first kill makes that event stale, it never happens.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bestiary_core::entity::{Bounds, EntityFactory, Kind};
//! use bestiary_core::fight::{FightEvent, FightManager, FightResolution};
//! use bestiary_core::observer::{FightLog, Notifier};
//! use glam::IVec2;
//!
//! let factory = EntityFactory::new(Bounds::default());
//! let knight = factory.create(Kind::Knight, IVec2::new(10, 10)).unwrap();
//! let dragon = factory.create(Kind::Dragon, IVec2::new(12, 11)).unwrap();
//!
//! let log = Arc::new(FightLog::new());
//! let mut notifier = Notifier::new();
//! notifier.subscribe(log.clone());
//! let manager = FightManager::with_standard_rules(notifier);
//!
//! let event = FightEvent::new(knight.clone(), dragon.clone()).unwrap();
//! assert_eq!(manager.process(event), FightResolution::DefenderKilled);
//! assert!(knight.is_alive());
//! assert!(!dragon.is_alive());
//! assert_eq!(log.len(), 1);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{select, Receiver, Sender};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::observer::{CombatOutcome, Notifier};
use crate::resolver::{CombatResolver, Resolver};
use crate::shutdown::Shutdown;

/// A proposed fight between two distinct entities.
#[derive(Debug, Clone)]
pub struct FightEvent {
    attacker: Arc<Entity>,
    defender: Arc<Entity>,
}

impl FightEvent {
    /// Creates an event, or `None` if both sides are the same entity.
    #[must_use]
    pub fn new(attacker: Arc<Entity>, defender: Arc<Entity>) -> Option<Self> {
        (attacker.id() != defender.id()).then_some(Self { attacker, defender })
    }

    /// The entity that starts the fight.
    #[must_use]
    pub fn attacker(&self) -> &Arc<Entity> {
        &self.attacker
    }

    /// The entity being attacked.
    #[must_use]
    pub fn defender(&self) -> &Arc<Entity> {
        &self.defender
    }
}

/// What processing one event did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FightResolution {
    /// A participant was already dead; nothing happened
    Stale,
    /// The rule table spared the defender; nothing happened
    DefenderSurvived,
    /// The defender was killed and observers were notified
    DefenderKilled,
}

/// Counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightStats {
    /// Events accepted by the queue
    pub submitted: u64,
    /// Events taken off the queue and processed
    pub processed: u64,
    /// Processed events dropped because a participant was dead
    pub stale: u64,
    /// Processed events that killed their defender
    pub kills: u64,
    /// Events still queued when the manager stopped
    pub discarded: u64,
}

#[derive(Debug, Default)]
struct FightCounters {
    submitted: AtomicU64,
    processed: AtomicU64,
    stale: AtomicU64,
    kills: AtomicU64,
    discarded: AtomicU64,
}

impl FightCounters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn snapshot(&self) -> FightStats {
        FightStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            kills: self.kills.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable submit handle for the fight queue.
///
/// Submission never blocks: the queue is an unbounded channel.
#[derive(Debug, Clone)]
pub struct FightQueue {
    sender: Sender<FightEvent>,
    counters: Arc<FightCounters>,
}

impl FightQueue {
    /// Appends `event` to the queue.
    ///
    /// Returns `false` if the fight manager no longer exists; the event is
    /// dropped in that case.
    pub fn submit(&self, event: FightEvent) -> bool {
        if self.sender.send(event).is_ok() {
            FightCounters::bump(&self.counters.submitted, 1);
            true
        } else {
            tracing::trace!("fight queue closed, event dropped");
            false
        }
    }
}

/// Single-consumer actor that turns fight events into deaths.
///
/// The manager is built explicitly and handed to the world; there is no
/// global instance. Observers must be registered on the [`Notifier`] before
/// it is passed in.
pub struct FightManager {
    sender: Sender<FightEvent>,
    receiver: Receiver<FightEvent>,
    resolver: Arc<dyn Resolver>,
    notifier: Notifier,
    counters: Arc<FightCounters>,
}

impl std::fmt::Debug for FightManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FightManager")
            .field("pending", &self.receiver.len())
            .field("notifier", &self.notifier)
            .field("stats", &self.counters.snapshot())
            .finish_non_exhaustive()
    }
}

impl FightManager {
    /// Creates a manager with an empty queue.
    #[must_use]
    pub fn new(resolver: Arc<dyn Resolver>, notifier: Notifier) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            sender,
            receiver,
            resolver,
            notifier,
            counters: Arc::new(FightCounters::default()),
        }
    }

    /// Creates a manager using [`CombatResolver::standard`].
    #[must_use]
    pub fn with_standard_rules(notifier: Notifier) -> Self {
        Self::new(Arc::new(CombatResolver::standard()), notifier)
    }

    /// Returns a submit handle for detectors.
    #[must_use]
    pub fn queue(&self) -> FightQueue {
        FightQueue {
            sender: self.sender.clone(),
            counters: Arc::clone(&self.counters),
        }
    }

    /// Convenience for `self.queue().submit(event)`.
    pub fn submit(&self, event: FightEvent) -> bool {
        self.queue().submit(event)
    }

    /// Number of events waiting to be processed.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Current counter values.
    #[must_use]
    pub fn stats(&self) -> FightStats {
        self.counters.snapshot()
    }

    /// Resolves one event and applies its outcome.
    ///
    /// Only call this from one thread at a time per world; that thread is the
    /// one place deaths are decided.
    pub fn process(&self, event: FightEvent) -> FightResolution {
        FightCounters::bump(&self.counters.processed, 1);
        let FightEvent { attacker, defender } = event;

        if !attacker.is_alive() || !defender.is_alive() {
            return self.stale(&attacker, &defender);
        }

        if !self.resolver.resolve(attacker.kind(), defender.kind()) {
            return FightResolution::DefenderSurvived;
        }

        // Something outside the queue may have killed the defender since the
        // liveness check.
        if !defender.kill() {
            return self.stale(&attacker, &defender);
        }

        FightCounters::bump(&self.counters.kills, 1);
        tracing::debug!(
            attacker = %attacker.id(),
            attacker_kind = %attacker.kind(),
            defender = %defender.id(),
            defender_kind = %defender.kind(),
            "defender killed"
        );
        self.notifier.notify(&CombatOutcome {
            attacker,
            defender,
            attacker_won: true,
        });
        FightResolution::DefenderKilled
    }

    fn stale(&self, attacker: &Entity, defender: &Entity) -> FightResolution {
        FightCounters::bump(&self.counters.stale, 1);
        tracing::trace!(
            attacker = %attacker.id(),
            defender = %defender.id(),
            "stale fight event discarded"
        );
        FightResolution::Stale
    }

    /// Processes every event currently queued, on the calling thread.
    ///
    /// Returns the number of events processed.
    pub fn process_pending(&self) -> usize {
        self.receiver
            .try_iter()
            .map(|event| self.process(event))
            .count()
    }

    /// Runs the consumer loop until `shutdown` fires.
    ///
    /// Blocks on the queue rather than polling. Events still queued when the
    /// stop signal arrives are discarded, not resolved.
    pub fn run(&self, shutdown: &Shutdown) {
        tracing::debug!("fight manager started");
        loop {
            select! {
                recv(self.receiver) -> event => match event {
                    Ok(event) => {
                        self.process(event);
                    }
                    Err(_) => break,
                },
                recv(shutdown.receiver()) -> _ => break,
            }
        }

        let discarded = self.receiver.try_iter().count() as u64;
        FightCounters::bump(&self.counters.discarded, discarded);
        tracing::debug!(discarded, "fight manager stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, Kind};
    use crate::observer::FightLog;
    use glam::IVec2;

    fn entity(id: u64, kind: Kind) -> Arc<Entity> {
        Arc::new(Entity::new(EntityId::new(id), kind, IVec2::ZERO))
    }

    fn logged_manager() -> (FightManager, Arc<FightLog>) {
        let log = Arc::new(FightLog::new());
        let mut notifier = Notifier::new();
        notifier.subscribe(log.clone());
        (FightManager::with_standard_rules(notifier), log)
    }

    mod fight_event_tests {
        use super::*;

        #[test]
        fn rejects_self_fight() {
            let knight = entity(1, Kind::Knight);
            assert!(FightEvent::new(knight.clone(), knight).is_none());
        }

        #[test]
        fn keeps_order() {
            let event = FightEvent::new(entity(1, Kind::Knight), entity(2, Kind::Dragon)).unwrap();
            assert_eq!(event.attacker().id(), EntityId::new(1));
            assert_eq!(event.defender().id(), EntityId::new(2));
        }
    }

    mod process_tests {
        use super::*;

        #[test]
        fn kill_notifies_once() {
            let (manager, log) = logged_manager();
            let knight = entity(1, Kind::Knight);
            let dragon = entity(2, Kind::Dragon);

            let resolution = manager.process(FightEvent::new(knight.clone(), dragon.clone()).unwrap());

            assert_eq!(resolution, FightResolution::DefenderKilled);
            assert!(knight.is_alive());
            assert!(!dragon.is_alive());
            let records = log.take_records();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].attacker.kind, Kind::Knight);
            assert_eq!(records[0].defender.kind, Kind::Dragon);
            assert!(records[0].attacker_won);
        }

        #[test]
        fn survivor_is_untouched() {
            let (manager, log) = logged_manager();
            let dragon = entity(1, Kind::Dragon);
            let black_knight = entity(2, Kind::BlackKnight);

            let resolution =
                manager.process(FightEvent::new(dragon.clone(), black_knight.clone()).unwrap());

            assert_eq!(resolution, FightResolution::DefenderSurvived);
            assert!(dragon.is_alive());
            assert!(black_knight.is_alive());
            assert!(log.is_empty());
        }

        #[test]
        fn dead_defender_is_stale() {
            let (manager, log) = logged_manager();
            let knight = entity(1, Kind::Knight);
            let dragon = entity(2, Kind::Dragon);
            dragon.kill();

            let resolution = manager.process(FightEvent::new(knight, dragon).unwrap());

            assert_eq!(resolution, FightResolution::Stale);
            assert!(log.is_empty());
        }

        #[test]
        fn dead_attacker_is_stale() {
            let (manager, log) = logged_manager();
            let knight = entity(1, Kind::Knight);
            let dragon = entity(2, Kind::Dragon);
            knight.kill();

            let resolution = manager.process(FightEvent::new(knight, dragon.clone()).unwrap());

            assert_eq!(resolution, FightResolution::Stale);
            assert!(dragon.is_alive());
            assert!(log.is_empty());
        }

        #[test]
        fn stats_track_outcomes() {
            let (manager, _log) = logged_manager();
            let knight = entity(1, Kind::Knight);
            let dragon = entity(2, Kind::Dragon);

            manager.submit(FightEvent::new(knight.clone(), dragon.clone()).unwrap());
            manager.submit(FightEvent::new(knight.clone(), dragon.clone()).unwrap());
            manager.submit(FightEvent::new(dragon, knight).unwrap());
            assert_eq!(manager.pending(), 3);
            assert_eq!(manager.process_pending(), 3);

            let stats = manager.stats();
            assert_eq!(stats.submitted, 3);
            assert_eq!(stats.processed, 3);
            assert_eq!(stats.kills, 1);
            assert_eq!(stats.stale, 2);
        }
    }

    mod run_tests {
        use super::*;
        use crate::shutdown;
        use std::time::{Duration, Instant};

        #[test]
        fn run_processes_until_stopped() {
            let (manager, log) = logged_manager();
            let manager = Arc::new(manager);
            let queue = manager.queue();
            let (trigger, shutdown) = shutdown::channel();

            let worker = {
                let manager = Arc::clone(&manager);
                std::thread::spawn(move || manager.run(&shutdown))
            };

            let knight = entity(1, Kind::Knight);
            let dragon = entity(2, Kind::Dragon);
            assert!(queue.submit(FightEvent::new(knight, dragon.clone()).unwrap()));

            let deadline = Instant::now() + Duration::from_secs(5);
            while dragon.is_alive() && Instant::now() < deadline {
                std::thread::sleep(Duration::from_millis(1));
            }

            trigger.fire();
            worker.join().unwrap();

            assert!(!dragon.is_alive());
            assert_eq!(log.len(), 1);
        }

        #[test]
        fn queued_events_are_discarded_on_stop() {
            let (manager, log) = logged_manager();
            let (trigger, shutdown) = shutdown::channel();
            trigger.fire();

            let dragon = entity(2, Kind::Dragon);
            manager.submit(FightEvent::new(entity(1, Kind::Knight), dragon.clone()).unwrap());

            // Both channels are ready, so select may take either branch first.
            manager.run(&shutdown);

            let stats = manager.stats();
            assert_eq!(stats.processed + stats.discarded, 1);
            if stats.discarded == 1 {
                assert!(dragon.is_alive());
                assert!(log.is_empty());
            }
        }

        #[test]
        fn submit_after_manager_dropped_returns_false() {
            let (manager, _log) = logged_manager();
            let queue = manager.queue();
            drop(manager);

            let event = FightEvent::new(entity(1, Kind::Knight), entity(2, Kind::Dragon)).unwrap();
            assert!(!queue.submit(event));
        }
    }
}
