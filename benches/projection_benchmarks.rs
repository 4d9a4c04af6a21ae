use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vo2trend::chart::ChartSpec;
use vo2trend::{project, Gender, ProjectionRequest, Vo2MaxProjector};

/// Benchmarks for the per-request recompute path
fn bench_project(c: &mut Criterion) {
    let mut group = c.benchmark_group("Projection");

    for &start_age in &[10, 50, 100] {
        group.bench_with_input(
            BenchmarkId::new("project", start_age),
            &start_age,
            |b, &start_age| {
                b.iter(|| project(black_box(start_age), black_box(48.0), Gender::Male));
            },
        );
    }

    group.finish();
}

fn bench_full_request(c: &mut Criterion) {
    let request = ProjectionRequest::new(Gender::Female, 20, 48.0)
        .with_activities("run,hike,walk".parse().unwrap());

    c.bench_function("request_to_chart_spec", |b| {
        b.iter(|| {
            let projection = Vo2MaxProjector::run(black_box(&request));
            ChartSpec::from_projection(&projection)
        });
    });
}

criterion_group!(benches, bench_project, bench_full_request);
criterion_main!(benches);
