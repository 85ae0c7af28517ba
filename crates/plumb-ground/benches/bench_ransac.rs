use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};

use plumb_ground::{detect_ground, fit_plane, GroundParams, GroundStrategy, RansacParams};

// noisy floor with a fifth of the points scattered above it
fn noisy_floor(n: usize) -> Vec<[f64; 3]> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    (0..n)
        .map(|i| {
            let x = rng.random_range(0.0..10.0);
            let y = rng.random_range(0.0..10.0);
            let z = if i % 5 == 0 {
                rng.random_range(0.5..5.0)
            } else {
                rng.random_range(-0.01..0.01)
            };
            [x, y, z]
        })
        .collect()
}

fn bench_fit_plane(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_plane");
    let params = RansacParams::default();

    for num_points in [1_000, 10_000, 100_000] {
        let points = noisy_floor(num_points);
        group.bench_with_input(
            BenchmarkId::new("ransac", num_points),
            &points,
            |b, points| b.iter(|| black_box(fit_plane(points, &params))),
        );
    }

    group.finish();
}

fn bench_detect_ground(c: &mut Criterion) {
    let mut group = c.benchmark_group("detect_ground");
    let points = noisy_floor(50_000);

    for strategy in [
        GroundStrategy::LowestBand,
        GroundStrategy::HeightPercentile,
        GroundStrategy::FullRansac,
        GroundStrategy::MultiAxisFit,
        GroundStrategy::PcaFallback,
    ] {
        let params = GroundParams {
            strategy,
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::new(strategy.to_string(), points.len()),
            &points,
            |b, points| b.iter(|| black_box(detect_ground(points, &params))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_fit_plane, bench_detect_ground);
criterion_main!(benches);
