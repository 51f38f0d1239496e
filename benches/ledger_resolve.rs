use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use tng_dataset::{identity::ObjectIdentity, ledger::AssignmentLedger, split::Split};

const CAMERAS: [&str; 4] = ["v0", "v1", "v2", "v3"];

/// Random stream of (object, camera, split) requests over `objects` distinct galaxies.
fn make_requests(rng: &mut StdRng, objects: i32, samples: usize) -> Vec<(ObjectIdentity, &'static str, Split)> {
    (0..samples)
        .map(|_| {
            let subhalo = rng.random_range(0..objects);
            let snapnum = rng.random_range(50..100);
            let identity = ObjectIdentity::new("SUBARU_HSC.G", "IllustrisTNG", "TNG50", snapnum, subhalo);
            let camera = CAMERAS[rng.random_range(0..CAMERAS.len())];
            let split = Split::ALL[rng.random_range(0..3)];
            (identity, camera, split)
        })
        .collect()
}

/// Mostly fresh objects: every resolve inserts a binding.
fn bench_fresh_objects(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xDEADBEEF);

    c.bench_function("ledger_resolve/fresh_objects", |b| {
        b.iter_batched(
            || make_requests(&mut rng, i32::MAX, 10_000),
            |requests| {
                let mut ledger = AssignmentLedger::new();
                for (identity, camera, split) in &requests {
                    black_box(ledger.resolve(identity, camera, *split));
                }
                black_box(ledger.len())
            },
            BatchSize::LargeInput,
        )
    });
}

/// Small population seen many times: mostly rejects and same-split repeats.
fn bench_hot_objects(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xBADF00D);

    c.bench_function("ledger_resolve/hot_objects", |b| {
        b.iter_batched(
            || make_requests(&mut rng, 200, 10_000),
            |requests| {
                let mut ledger = AssignmentLedger::new();
                for (identity, camera, split) in &requests {
                    black_box(ledger.resolve(identity, camera, *split));
                }
                black_box(ledger.sighting_count())
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_fresh_objects, bench_hot_objects
);
criterion_main!(benches);
