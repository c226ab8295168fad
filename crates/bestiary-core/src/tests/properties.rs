//! Property tests.

use glam::IVec2;
use proptest::prelude::*;

use crate::entity::{within_distance, Bounds, Entity, EntityFactory, EntityId, EntityRecord, Kind};
use crate::persistence;
use crate::resolver::{CombatResolver, Resolver};

fn any_kind() -> impl Strategy<Value = Kind> {
    prop::sample::select(Kind::ALL.to_vec())
}

fn any_record(bounds: Bounds) -> impl Strategy<Value = EntityRecord> {
    (any_kind(), 0..=bounds.max_x, 0..=bounds.max_y)
        .prop_map(|(kind, x, y)| EntityRecord::new(kind, x, y))
}

proptest! {
    #[test]
    fn resolver_is_total_and_deterministic(attacker in any_kind(), defender in any_kind()) {
        let rules = CombatResolver::standard();
        let first = rules.resolve(attacker, defender);
        prop_assert_eq!(first, rules.resolve(attacker, defender));
        prop_assert_eq!(first, rules.table()[attacker.index()][defender.index()]);
    }

    #[test]
    fn black_knight_always_wins(defender in any_kind()) {
        prop_assert!(CombatResolver::standard().resolve(Kind::BlackKnight, defender));
    }

    #[test]
    fn movement_never_leaves_bounds(
        max_x in 0..200i32,
        max_y in 0..200i32,
        start in (0..200i32, 0..200i32),
        steps in prop::collection::vec((any::<i32>(), any::<i32>()), 1..20),
    ) {
        let bounds = Bounds::new(max_x, max_y);
        let start = bounds.clamp(IVec2::new(start.0, start.1));
        let entity = Entity::new(EntityId::new(0), Kind::Knight, start);
        for (dx, dy) in steps {
            let position = entity.move_by(IVec2::new(dx, dy), bounds);
            prop_assert!(bounds.contains(position));
            prop_assert_eq!(position, entity.position());
        }
    }

    #[test]
    fn distance_is_symmetric(
        a in (-1000..1000i32, -1000..1000i32),
        b in (-1000..1000i32, -1000..1000i32),
        distance in 0..500u32,
    ) {
        let (a, b) = (IVec2::new(a.0, a.1), IVec2::new(b.0, b.1));
        prop_assert_eq!(within_distance(a, b, distance), within_distance(b, a, distance));
        prop_assert!(within_distance(a, a, distance));
    }

    #[test]
    fn saved_population_loads_back(records in prop::collection::vec(any_record(Bounds::default()), 0..30)) {
        let factory = EntityFactory::new(Bounds::default());
        let entities: Vec<_> = records
            .iter()
            .map(|record| factory.from_record(record).unwrap())
            .collect();

        let mut saved = Vec::new();
        persistence::save(&entities, &mut saved).unwrap();
        let report = persistence::load(saved.as_slice(), &factory).unwrap();

        prop_assert!(report.is_complete());
        let loaded: Vec<_> = report
            .entities
            .iter()
            .map(|entity| EntityRecord::from(&entity.snapshot()))
            .collect();
        prop_assert_eq!(loaded, records);
    }
}
