//! Fight observers.
//!
//! The fight manager reports every kill through a [`Notifier`], which fans
//! the [`CombatOutcome`] out to the registered [`FightObserver`]s. Reporting
//! is kept apart from resolution so logging or telemetry can be attached
//! without touching combat logic.
//!
//! # Failure Isolation
//!
//! Observers run synchronously on the fight manager's thread. A panicking
//! observer is caught, logged, and skipped; the remaining observers still
//! run and the fight manager keeps going.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bestiary_core::observer::{FightLog, Notifier};
//!
//! let log = Arc::new(FightLog::new());
//! let mut notifier = Notifier::new();
//! notifier.subscribe(log.clone());
//! notifier.subscribe(Arc::new(|outcome: &bestiary_core::observer::CombatOutcome| {
//!     println!("{} fought {}", outcome.attacker.kind(), outcome.defender.kind());
//! }));
//!
//! assert_eq!(notifier.len(), 2);
//! assert!(log.is_empty());
//! ```

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntitySnapshot};

/// The result of one resolved fight, handed to observers.
#[derive(Debug, Clone)]
pub struct CombatOutcome {
    /// The entity that started the fight
    pub attacker: Arc<Entity>,
    /// The entity that was attacked
    pub defender: Arc<Entity>,
    /// `true` when the defender was killed
    pub attacker_won: bool,
}

/// Receives combat outcomes.
///
/// Implemented for any `Fn(&CombatOutcome) + Send + Sync` closure, so simple
/// listeners need no dedicated type.
pub trait FightObserver: Send + Sync {
    /// Called once per kill, on the fight manager's thread.
    fn on_fight(&self, outcome: &CombatOutcome);
}

impl<F> FightObserver for F
where
    F: Fn(&CombatOutcome) + Send + Sync,
{
    fn on_fight(&self, outcome: &CombatOutcome) {
        self(outcome);
    }
}

/// Ordered list of observers.
///
/// Registration is append-only and happens while the notifier is still owned
/// by whoever is setting up the world; once the fight manager is running it
/// only holds a shared reference, so the list is read-only for the rest of
/// the simulation.
#[derive(Clone, Default)]
pub struct Notifier {
    observers: Vec<Arc<dyn FightObserver>>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("observers", &format!("[{} observers]", self.observers.len()))
            .finish()
    }
}

impl Notifier {
    /// Creates a notifier with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    /// Appends an observer. Observers are notified in registration order.
    pub fn subscribe(&mut self, observer: Arc<dyn FightObserver>) {
        self.observers.push(observer);
    }

    /// Returns the number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns true if no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Delivers `outcome` to every observer in registration order.
    ///
    /// Returns the number of observers that panicked.
    pub fn notify(&self, outcome: &CombatOutcome) -> usize {
        let mut failures = 0;
        for (index, observer) in self.observers.iter().enumerate() {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| observer.on_fight(outcome)));
            if let Err(payload) = delivered {
                failures += 1;
                tracing::error!(
                    observer = index,
                    attacker = %outcome.attacker.id(),
                    defender = %outcome.defender.id(),
                    reason = panic_message(payload.as_ref()),
                    "fight observer panicked"
                );
            }
        }
        failures
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Observer that writes one structured log line per kill.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl FightObserver for LogObserver {
    fn on_fight(&self, outcome: &CombatOutcome) {
        if !outcome.attacker_won {
            return;
        }
        let attacker = outcome.attacker.snapshot();
        let defender = outcome.defender.snapshot();
        tracing::info!(
            attacker = %attacker,
            defender = %defender,
            attacker_id = %attacker.id,
            defender_id = %defender.id,
            "murder"
        );
    }
}

/// Snapshot form of a [`CombatOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightRecord {
    /// Attacker state at notification time
    pub attacker: EntitySnapshot,
    /// Defender state at notification time
    pub defender: EntitySnapshot,
    /// `true` when the defender was killed
    pub attacker_won: bool,
}

impl From<&CombatOutcome> for FightRecord {
    fn from(outcome: &CombatOutcome) -> Self {
        Self {
            attacker: outcome.attacker.snapshot(),
            defender: outcome.defender.snapshot(),
            attacker_won: outcome.attacker_won,
        }
    }
}

/// Observer that keeps every outcome in memory.
///
/// The record list is protected by a `Mutex` so the log can be read from
/// any thread while the fight manager is appending to it.
#[derive(Debug, Default)]
pub struct FightLog {
    records: Mutex<Vec<FightRecord>>,
}

impl FightLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<FightRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drains and returns all recorded outcomes, oldest first.
    pub fn take_records(&self) -> Vec<FightRecord> {
        std::mem::take(&mut *self.lock())
    }

    /// Returns a copy of all recorded outcomes without draining them.
    #[must_use]
    pub fn records(&self) -> Vec<FightRecord> {
        self.lock().clone()
    }

    /// Returns the number of recorded outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl FightObserver for FightLog {
    fn on_fight(&self, outcome: &CombatOutcome) {
        self.lock().push(FightRecord::from(outcome));
    }
}
