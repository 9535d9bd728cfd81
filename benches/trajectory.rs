//! Trajectory Benchmarks
//!
//! Measures path generation cost for typical camera corrections at the step
//! sizes the controller uses.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;

use camera_pilot::cursor::{plan, TrajectoryConfig};
use camera_pilot::geometry::Point;

/// Benchmark full path generation by travel distance
fn bench_plan_by_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("trajectory_plan_distance");
    let config = TrajectoryConfig::default();
    let start = Point::new(960, 540);

    for distance in [50, 235, 600, 1500] {
        group.throughput(Throughput::Elements(distance as u64));
        group.bench_with_input(BenchmarkId::from_parameter(distance), &distance, |b, &d| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                let path = plan(
                    start,
                    Point::new(start.x + d, start.y),
                    config.params_for_step(20.0),
                    StdRng::seed_from_u64(seed),
                )
                .unwrap();
                black_box(path)
            });
        });
    }

    group.finish();
}

/// Benchmark the effect of the step cap on a fixed move
fn bench_plan_by_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("trajectory_plan_step");
    let config = TrajectoryConfig::default();
    let start = Point::new(960, 540);
    let destination = Point::new(1195, 435);

    for step in [13.0, 15.0, 20.0, 40.0] {
        group.bench_with_input(BenchmarkId::from_parameter(step), &step, |b, &step| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                let path = plan(
                    start,
                    destination,
                    config.params_for_step(step),
                    StdRng::seed_from_u64(seed),
                )
                .unwrap();
                black_box(path.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan_by_distance, bench_plan_by_step);
criterion_main!(benches);
