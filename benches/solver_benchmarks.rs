//! Solver benchmarks.
//!
//! Occupancy recurrences cost O(states) decimal operations; these groups
//! track how evaluation time grows with capacity, population and servers.
//!
//! Run with: cargo bench --bench solver_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qtheory::prelude::*;

fn bench_finite_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("finite_capacity");
    group.sample_size(50);
    let precision = Precision::default();

    for k in [50_u32, 500, 5000] {
        // Overloaded buffer forces weight rescaling on the deep end
        group.bench_with_input(BenchmarkId::new("mm1k_overloaded", k), &k, |b, &k| {
            let model = Mm1k::new(3.0, 2.0, f64::from(k));
            b.iter(|| black_box(model.evaluate(&precision)));
        });
        group.bench_with_input(BenchmarkId::new("mmsk", k), &k, |b, &k| {
            let model = Mmsk::new(9.0, 1.0, 10.0, f64::from(k));
            b.iter(|| black_box(model.evaluate(&precision)));
        });
    }

    group.finish();
}

fn bench_finite_population(c: &mut Criterion) {
    let mut group = c.benchmark_group("finite_population");
    group.sample_size(50);
    let precision = Precision::default();

    for n in [20_u32, 200, 2000] {
        group.bench_with_input(BenchmarkId::new("mms_finite", n), &n, |b, &n| {
            let model = MmsFinite::new(0.01, 1.0, 10.0, f64::from(n));
            b.iter(|| black_box(model.evaluate(&precision)));
        });
    }

    group.finish();
}

fn bench_erlang_c(c: &mut Criterion) {
    let mut group = c.benchmark_group("erlang_c");
    let precision = Precision::default();

    for s in [2_u32, 10, 50] {
        group.bench_with_input(BenchmarkId::new("mms", s), &s, |b, &s| {
            let servers = f64::from(s);
            let model = Mms::new(0.8 * servers, 1.0, servers).with_time(0.5);
            b.iter(|| black_box(model.evaluate(&precision)));
        });
    }

    group.finish();
}

fn bench_priority(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority");
    let precision = Precision::default();
    let rates = vec![0.5; 8];

    group.bench_function("non_preemptive_8_classes", |b| {
        let model = PriorityNonPreemptive::new(rates.clone(), 1.0, 5.0);
        b.iter(|| black_box(model.evaluate(&precision)));
    });
    group.bench_function("preemptive_8_classes", |b| {
        let model = PriorityPreemptive::new(rates.clone(), 1.0, 5.0);
        b.iter(|| black_box(model.evaluate(&precision)));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_finite_capacity,
    bench_finite_population,
    bench_erlang_c,
    bench_priority
);
criterion_main!(benches);
