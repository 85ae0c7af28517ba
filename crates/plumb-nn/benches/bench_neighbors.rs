use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{Rng, SeedableRng};

use plumb_nn::{NeighborCounter, PairwiseCounter, VoxelCounter};

fn random_points(n: usize) -> Vec<[f64; 3]> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    (0..n)
        .map(|_| {
            [
                rng.random_range(0.0..10.0),
                rng.random_range(0.0..10.0),
                rng.random_range(0.0..10.0),
            ]
        })
        .collect()
}

fn bench_neighbors(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_neighbors");

    for num_points in [1_000, 5_000, 20_000] {
        let points = random_points(num_points);
        let radius = 0.5;

        group.bench_with_input(
            BenchmarkId::new("pairwise", num_points),
            &points,
            |b, points| b.iter(|| black_box(PairwiseCounter.count_neighbors(points, radius))),
        );

        #[cfg(feature = "kdtree")]
        group.bench_with_input(
            BenchmarkId::new("kdtree", num_points),
            &points,
            |b, points| {
                b.iter(|| black_box(plumb_nn::KdTreeCounter.count_neighbors(points, radius)))
            },
        );

        group.bench_with_input(
            BenchmarkId::new("voxel", num_points),
            &points,
            |b, points| b.iter(|| black_box(VoxelCounter.count_neighbors(points, radius))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_neighbors);
criterion_main!(benches);
