use bestiary_core::entity::{Bounds, EntityFactory};
use bestiary_core::world::{scan_fights, step_movers};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn bench_scan_default_world(c: &mut Criterion) {
    // Default world: 50 units on 100 x 100, proximity 40
    let factory = EntityFactory::new(Bounds::default());
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let entities = factory.populate(&mut rng, 50);

    c.bench_function("scan_fights_50", |b| {
        b.iter(|| black_box(scan_fights(&entities, black_box(40))))
    });
}

fn bench_scan_large_world(c: &mut Criterion) {
    let factory = EntityFactory::new(Bounds::new(1000, 1000));
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let entities = factory.populate(&mut rng, 1000);

    c.bench_function("scan_fights_1000", |b| {
        b.iter(|| black_box(scan_fights(&entities, black_box(40))))
    });
}

fn bench_move_step(c: &mut Criterion) {
    let bounds = Bounds::default();
    let factory = EntityFactory::new(bounds);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let entities = factory.populate(&mut rng, 50);

    c.bench_function("step_movers_50", |b| {
        b.iter(|| black_box(step_movers(&entities, &mut rng, bounds, 10)))
    });
}

criterion_group!(benches, bench_scan_default_world, bench_scan_large_world, bench_move_step);
criterion_main!(benches);
