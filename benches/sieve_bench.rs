//! Benchmarks for sieve evaluation and offline cloud rendering
//!
//! Run with: cargo bench --bench sieve_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use xenakis::cloud::{CloudFields, StochasticCloud};
use xenakis::field::ProbabilityField;
use xenakis::scheduler::{breathing_intensity, PoissonScheduler};
use xenakis::sieve::{Clause, Sieve};

fn layered_sieve() -> Sieve {
    Sieve::new(vec![
        Clause::union(5, &[0, 2]).unwrap(),
        Clause::union(7, &[1, 4]).unwrap(),
        Clause::intersection(3, &[0, 1]).unwrap(),
        Clause::complement(11, &[6]).unwrap(),
    ])
}

/// Benchmark sieve generation over growing windows
fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("sieve_generate");
    let sieve = layered_sieve();

    for width in [128i64, 1024, 8192] {
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, &w| {
            b.iter(|| sieve.generate(black_box(0), black_box(w)))
        });
    }

    group.finish();
}

fn bench_tile(c: &mut Criterion) {
    let sieve = layered_sieve();
    c.bench_function("sieve_tile_1024", |b| {
        b.iter(|| sieve.tile_sequence(black_box(1024), 48, 84))
    });
}

/// Benchmark a 60 second offline render with sieve quantisation
fn bench_cloud_render(c: &mut Criterion) {
    let allowed = layered_sieve().generate(36, 96);

    c.bench_function("cloud_render_60s", |b| {
        b.iter(|| {
            let fields = CloudFields {
                pitch: ProbabilityField::normal(66.0, 12.0, 1).unwrap(),
                duration: ProbabilityField::exponential(2.0, 2).unwrap(),
                velocity: ProbabilityField::normal(90.0, 25.0, 3).unwrap(),
                channel: ProbabilityField::categorical(&[0.0, 1.0], Some(&[3.0, 1.0]), 4).unwrap(),
            };
            let scheduler =
                PoissonScheduler::seeded(breathing_intensity(0.5, 6.0, 10.0), 6.0, 5).unwrap();
            let mut cloud = StochasticCloud::new(fields, scheduler)
                .with_allowed_pitches(allowed.iter().copied());
            black_box(cloud.render_offline(0.0, 60.0))
        })
    });
}

criterion_group!(benches, bench_generate, bench_tile, bench_cloud_render);
criterion_main!(benches);
