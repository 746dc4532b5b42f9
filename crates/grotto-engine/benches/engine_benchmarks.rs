//! Engine hot paths: cave generation, field of view, A* and a full turn.
//!
//! Run with: `cargo bench --bench engine_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_pcg::Pcg64;

use grotto_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A default-sized cave from a fixed seed.
fn cave(seed: u64) -> GameMap {
    GameMap::generate(&EngineConfig::default(), Pcg64::seed_from_u64(seed))
        .expect("default config should generate a cave")
}

/// Two floor cells of `map` that are far apart in scan order.
fn far_pair(map: &GameMap) -> (Point, Point) {
    let floors: Vec<Point> = map
        .cells()
        .filter(|&(_, c)| c == Cell::Floor)
        .map(|(p, _)| p)
        .collect();
    (floors[0], floors[floors.len() - 1])
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_generation(c: &mut Criterion) {
    let config = EngineConfig::default();
    let mut seed = 0u64;
    c.bench_function("cave_generation_80x19", |b| {
        b.iter(|| {
            seed += 1;
            let map = GameMap::generate(&config, Pcg64::seed_from_u64(seed)).unwrap();
            black_box(map.floor_count());
        });
    });
}

fn bench_fov(c: &mut Criterion) {
    let map = cave(1);
    let (origin, _) = far_pair(&map);
    let bounds = Bounds {
        width: map.width(),
        height: map.height(),
    };

    let mut group = c.benchmark_group("fov_radius");
    for radius in [4, 10, 20] {
        group.bench_with_input(BenchmarkId::from_parameter(radius), &radius, |b, &r| {
            b.iter(|| {
                let fov = Fov::compute(origin, r, bounds, |p| map.is_walkable(p));
                black_box(fov.len());
            });
        });
    }
    group.finish();

    let open = GameMap::open(80, 19);
    c.bench_function("fov_open_room_r10", |b| {
        b.iter(|| {
            let fov = Fov::compute(Point::new(40, 9), 10, bounds, |p| open.is_walkable(p));
            black_box(fov.len());
        });
    });
}

fn bench_astar(c: &mut Criterion) {
    let map = cave(2);
    let store = EntityStore::new();
    let pather = AiPather {
        map: &map,
        store: &store,
        blocked_step_cost: 8,
    };
    let (from, to) = far_pair(&map);

    c.bench_function("astar_across_cave", |b| {
        b.iter(|| {
            let path = astar_path(&pather, black_box(from), black_box(to));
            black_box(path.len());
        });
    });
}

fn bench_turn(c: &mut Criterion) {
    let game = Game::with_seed(3).expect("seeded session");
    c.bench_function("wait_turn_full_level", |b| {
        b.iter_batched(
            || game.clone(),
            |mut g| {
                let _ = black_box(g.act(Intent::Wait));
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let game = Game::with_seed(4).expect("seeded session");
    c.bench_function("snapshot_capture_and_hash", |b| {
        b.iter(|| black_box(game.capture_snapshot().hash));
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_generation,
    bench_fov,
    bench_astar,
    bench_turn,
    bench_snapshot,
);
criterion_main!(benches);
