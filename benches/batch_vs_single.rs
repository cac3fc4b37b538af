use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geonear::{AssignOptions, AssignmentEngine, Config, GeoPoint, SpatialIndex};

fn scattered(n: usize, seed: u64) -> Vec<GeoPoint> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let a = (state >> 11) as f64 / (1u64 << 53) as f64;
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let b = (state >> 11) as f64 / (1u64 << 53) as f64;
            GeoPoint::new(-24.0 + a, -47.0 + b)
        })
        .collect()
}

fn bench_chunk_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("assign_chunk_size");

    let references = scattered(5_000, 1);
    let subjects = scattered(100_000, 2);
    let engine = AssignmentEngine::from_points(&references, &Config::default()).unwrap();
    group.throughput(Throughput::Elements(subjects.len() as u64));

    for chunk_size in [100, 1_000, 10_000, 100_000] {
        group.bench_with_input(
            BenchmarkId::new("chunked", chunk_size),
            &chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    engine
                        .assign(&subjects, AssignOptions::new(chunk_size))
                        .unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_assign_vs_single_lookups(c: &mut Criterion) {
    let mut group = c.benchmark_group("assign_vs_single");

    let references = scattered(5_000, 3);
    let index = SpatialIndex::build(&references);
    let engine = AssignmentEngine::from_points(&references, &Config::default()).unwrap();

    for size in [1_000, 10_000] {
        let subjects = scattered(size, 4);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("engine", size), &subjects, |b, subjects| {
            b.iter(|| engine.assign(subjects, engine.default_options()).unwrap())
        });

        group.bench_with_input(
            BenchmarkId::new("single_nearest", size),
            &subjects,
            |b, subjects| {
                b.iter(|| {
                    subjects
                        .iter()
                        .map(|s| index.nearest(s).unwrap())
                        .collect::<Vec<_>>()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_chunk_sizes, bench_assign_vs_single_lookups);
criterion_main!(benches);
