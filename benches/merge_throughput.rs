use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cwtail::backend::MemoryBackend;
use cwtail::engine::merge_batches;
use cwtail::fetcher::{EventFetcher, FetchWindow, ManualClock, StreamStrategy};
use cwtail::{LogEvent, LogTarget};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Per-target batches with jittered, individually sorted timestamps
fn create_batches(targets: usize, events_per_target: usize) -> Vec<(Arc<LogTarget>, Vec<LogEvent>)> {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    (0..targets)
        .map(|t| {
            let target = Arc::new(LogTarget::new(format!("/aws/lambda/service-{t}")));
            let mut timestamp = 1_700_000_000_000i64;
            let events = (0..events_per_target)
                .map(|i| {
                    timestamp += rng.gen_range(0..50);
                    LogEvent::new(timestamp, format!("INFO service-{t}: request {i} handled"))
                })
                .collect();
            (target, events)
        })
        .collect()
}

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_batches");
    group.sample_size(20);
    group.measurement_time(Duration::from_secs(3));

    for (targets, per_target) in [(2, 5_000), (5, 2_000), (10, 1_000)] {
        let batches = create_batches(targets, per_target);
        group.bench_with_input(
            BenchmarkId::new("targets", targets),
            &batches,
            |b, batches| {
                b.iter(|| black_box(merge_batches(batches.clone())));
            },
        );
    }

    group.finish();
}

fn bench_paginated_fetch(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("fetch");
    group.sample_size(10);

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for page_size in [100usize, 1_000, 10_000] {
        let backend = Arc::new(MemoryBackend::with_page_sizes(50, page_size));
        for i in 0..20_000 {
            let stream = format!("2024/03/01/[$LATEST]{:02}", i % 16);
            backend.push_event("/app", &stream, rng.gen_range(0..1_000_000), "m");
        }
        let fetcher = EventFetcher::with_clock(
            backend,
            StreamStrategy::default(),
            Arc::new(ManualClock::new(2_000_000)),
        );
        let target = LogTarget::new("/app");

        group.bench_with_input(
            BenchmarkId::new("page_size", page_size),
            &fetcher,
            |b, fetcher| {
                b.iter(|| {
                    let events = rt.block_on(fetcher.fetch(
                        &target,
                        "",
                        FetchWindow::new(0, None),
                        10_000,
                    ));
                    black_box(events)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_merge, bench_paginated_fetch);
criterion_main!(benches);
