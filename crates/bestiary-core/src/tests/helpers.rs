//! Test setup utilities.

use std::sync::Arc;

use glam::IVec2;

use crate::entity::{Bounds, Entity, EntityFactory, Kind};
use crate::fight::FightManager;
use crate::observer::{FightLog, FightRecord, Notifier};
use crate::resolver::{CombatResolver, Resolver};

/// Factory over the default 100 x 100 world.
pub fn test_factory() -> EntityFactory {
    EntityFactory::new(Bounds::default())
}

/// Spawns one entity, panicking if the position is out of bounds.
pub fn spawn_at(factory: &EntityFactory, kind: Kind, x: i32, y: i32) -> Arc<Entity> {
    factory
        .create(kind, IVec2::new(x, y))
        .expect("test position in bounds")
}

/// A fight manager with the standard rules, reporting to a fresh log.
pub fn logged_manager() -> (FightManager, Arc<FightLog>) {
    let log = Arc::new(FightLog::new());
    let mut notifier = Notifier::new();
    notifier.subscribe(log.clone());
    (FightManager::with_standard_rules(notifier), log)
}

/// Checks a finished run against its fight log.
///
/// Every dead entity must appear exactly once as a defender, every logged
/// kill must be allowed by the standard rules, and nobody dies without a
/// logged kill.
pub fn assert_log_matches_deaths(entities: &[Arc<Entity>], records: &[FightRecord]) {
    let rules = CombatResolver::standard();
    for record in records {
        assert!(record.attacker_won);
        assert!(
            rules.resolve(record.attacker.kind, record.defender.kind),
            "{} may not kill {}",
            record.attacker.kind,
            record.defender.kind
        );
        assert!(!record.defender.alive);
    }

    for entity in entities {
        let deaths = records
            .iter()
            .filter(|record| record.defender.id == entity.id())
            .count();
        let expected = usize::from(!entity.is_alive());
        assert_eq!(deaths, expected, "entity {} died {deaths} times", entity.id());
    }
}
