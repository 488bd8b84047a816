use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cwtail::backend::{
    EventQuery, LogBackend, LogGroupInfo, LogStreamInfo, MemoryBackend, Page, RawEvent,
    StreamQuery,
};
use cwtail::engine::{shutdown, EnginePhase, TailEngine, TailOptions, TailOutcome};
use cwtail::fetcher::{EventFetcher, StreamStrategy};
use cwtail::render::RecordingSink;
use cwtail::resolver::Resolution;
use cwtail::{CwtailError, LogSet, LogTarget};

/// Event searches that take `delay` to answer
struct SlowSearch {
    inner: Arc<MemoryBackend>,
    delay: Duration,
}

#[async_trait]
impl LogBackend for SlowSearch {
    async fn list_log_groups(&self, next_token: Option<String>) -> cwtail::Result<Page<LogGroupInfo>> {
        self.inner.list_log_groups(next_token).await
    }

    async fn list_log_streams(&self, query: StreamQuery) -> cwtail::Result<Page<LogStreamInfo>> {
        self.inner.list_log_streams(query).await
    }

    async fn filter_events(&self, query: EventQuery) -> cwtail::Result<Page<RawEvent>> {
        tokio::time::sleep(self.delay).await;
        self.inner.filter_events(query).await
    }
}

fn single(group: &str) -> Resolution {
    Resolution::Single(LogTarget::new(group))
}

fn engine(
    backend: &Arc<MemoryBackend>,
    resolution: Resolution,
    options: TailOptions,
) -> (TailEngine, RecordingSink) {
    let sink = RecordingSink::new();
    let fetcher = EventFetcher::new(backend.clone(), StreamStrategy::default());
    let engine = TailEngine::new(fetcher, resolution, options, Box::new(sink.clone()));
    (engine, sink)
}

fn single_pass(since: i64) -> TailOptions {
    let mut options = TailOptions::new(since);
    options.keep_open = false;
    options
}

#[tokio::test]
async fn bounded_run_is_a_single_pass() {
    let backend = Arc::new(MemoryBackend::new());
    for ts in [10, 20, 150] {
        backend.push_event("/app", "s1", ts, &format!("event {ts}"));
    }

    let mut options = TailOptions::new(0);
    options.until = Some(100);
    let (mut engine, sink) = engine(&backend, single("/app"), options);

    let (_handle, mut signal) = shutdown::channel();
    let outcome = engine.run(&mut signal).await.unwrap();

    assert_eq!(outcome, TailOutcome::Completed);
    assert_eq!(engine.phase(), EnginePhase::Done);
    assert_eq!(engine.stats().cycles, 1);
    assert_eq!(engine.stats().sleeps, 0);
    assert_eq!(engine.watermark().get(), 20);

    let recording = sink.snapshot();
    assert_eq!(recording.timestamps(), vec![10, 20]);
    assert!(recording.finished);
    assert!(recording.log_set.is_none());

    let query = &backend.event_queries()[0];
    assert_eq!(query.end_time, 100);
    assert_eq!(query.start_time, 0);
}

#[tokio::test]
async fn disable_keep_open_stops_after_one_pass() {
    let backend = Arc::new(MemoryBackend::new());
    backend.push_event("/app", "s1", 10, "only");

    let (mut engine, sink) = engine(&backend, single("/app"), single_pass(0));
    let (_handle, mut signal) = shutdown::channel();

    assert_eq!(engine.run(&mut signal).await.unwrap(), TailOutcome::Completed);
    assert_eq!(engine.stats().sleeps, 0);
    assert_eq!(sink.snapshot().timestamps(), vec![10]);
}

#[tokio::test]
async fn event_at_watermark_is_not_rendered_again() {
    let backend = Arc::new(MemoryBackend::new());
    backend.push_event("/app", "s1", 10, "at since");
    backend.push_event("/app", "s1", 11, "after since");

    let (mut engine, sink) = engine(&backend, single("/app"), TailOptions::new(10));

    assert_eq!(engine.poll_once().await.unwrap(), 1);
    assert_eq!(engine.watermark().get(), 11);

    // the backend window starts at the watermark and hands event 11 back
    assert_eq!(engine.poll_once().await.unwrap(), 0);
    assert_eq!(backend.event_queries()[1].start_time, 11);
    assert_eq!(engine.watermark().get(), 11);

    let recording = sink.snapshot();
    assert_eq!(recording.batches.len(), 1);
    assert_eq!(recording.timestamps(), vec![11]);
}

#[tokio::test]
async fn log_set_results_merge_chronologically() {
    let backend = Arc::new(MemoryBackend::new());
    backend.push_event("/a", "s", 10, "a-10");
    backend.push_event("/a", "s", 30, "a-30");
    backend.push_event("/b", "s", 20, "b-20");
    backend.push_event("/b", "s", 25, "b-25");

    let set = LogSet {
        name: "pair".to_string(),
        targets: vec![LogTarget::new("/a"), LogTarget::with_alias("/b", "bee")],
    };
    let (mut engine, sink) = engine(&backend, Resolution::Set(set.clone()), single_pass(0));
    let (_handle, mut signal) = shutdown::channel();
    engine.run(&mut signal).await.unwrap();

    let recording = sink.snapshot();
    assert_eq!(recording.log_set, Some(set));
    assert_eq!(recording.timestamps(), vec![10, 20, 25, 30]);

    let sources: Vec<_> = recording.batches[0]
        .iter()
        .map(|event| event.source.as_ref().unwrap().label().to_string())
        .collect();
    assert_eq!(sources, vec!["/a", "bee", "bee", "/a"]);
    assert_eq!(engine.watermark().get(), 30);
}

#[tokio::test]
async fn equal_timestamps_keep_target_order() {
    let backend = Arc::new(MemoryBackend::new());
    backend.push_event("/first", "s", 10, "from first");
    backend.push_event("/second", "s", 10, "from second");

    let set = LogSet {
        name: "tie".to_string(),
        targets: vec![LogTarget::new("/first"), LogTarget::new("/second")],
    };
    let (mut engine, sink) = engine(&backend, Resolution::Set(set), single_pass(0));
    engine.poll_once().await.unwrap();

    let messages: Vec<_> = sink.snapshot().batches[0]
        .iter()
        .map(|event| event.message.clone())
        .collect();
    assert_eq!(messages, vec!["from first", "from second"]);
}

#[tokio::test]
async fn lifecycle_markers_advance_watermark_without_rendering() {
    let backend = Arc::new(MemoryBackend::new());
    backend.push_event("/aws/lambda/fn", "s", 30, "processing order 7");
    backend.push_event("/aws/lambda/fn", "s", 40, "END RequestId: 1f2e");
    backend.push_event(
        "/aws/lambda/fn",
        "s",
        41,
        "REPORT RequestId: 1f2e Duration: 3.1 ms",
    );

    let (mut engine, sink) = engine(&backend, single("/aws/lambda/fn"), single_pass(0));
    assert_eq!(engine.poll_once().await.unwrap(), 1);

    assert_eq!(sink.snapshot().timestamps(), vec![30]);
    assert_eq!(engine.watermark().get(), 41);
    assert_eq!(engine.stats().suppressed, 2);
}

#[tokio::test]
async fn only_markers_renders_nothing() {
    let backend = Arc::new(MemoryBackend::new());
    backend.push_event("/fn", "s", 5, "START RequestId: abc Version: $LATEST");

    let (mut engine, sink) = engine(&backend, single("/fn"), single_pass(0));
    assert_eq!(engine.poll_once().await.unwrap(), 0);

    assert!(sink.snapshot().batches.is_empty());
    assert_eq!(engine.watermark().get(), 5);
}

#[tokio::test]
async fn empty_poll_still_counts_a_cycle() {
    let backend = Arc::new(MemoryBackend::new());
    backend.push_event("/app", "s1", 10, "old");

    let (mut engine, sink) = engine(&backend, single("/app"), TailOptions::new(10));
    assert_eq!(engine.poll_once().await.unwrap(), 0);
    assert_eq!(engine.poll_once().await.unwrap(), 0);

    let stats = engine.stats();
    assert_eq!(stats.cycles, 2);
    assert_eq!(stats.rendered, 0);
    assert_eq!(stats.suppressed, 0);
    assert_eq!(engine.watermark().get(), 10);
    assert_eq!(engine.phase(), EnginePhase::Advance);
    assert!(sink.snapshot().batches.is_empty());
}

#[tokio::test]
async fn failed_fetch_leaves_watermark_untouched() {
    let backend = Arc::new(MemoryBackend::new());
    backend.push_event("/app", "s", 10, "first");

    let (mut engine, sink) = engine(&backend, single("/app"), TailOptions::new(0));
    engine.poll_once().await.unwrap();
    assert_eq!(engine.watermark().get(), 10);

    backend.push_event("/app", "s", 20, "second");
    backend.fail_next_requests(1);
    let err = engine.poll_once().await.unwrap_err();
    assert!(matches!(err, CwtailError::Backend { .. }));
    assert_eq!(engine.watermark().get(), 10);

    // a retry resumes from the same point without skipping anything
    assert_eq!(engine.poll_once().await.unwrap(), 1);
    assert_eq!(sink.snapshot().timestamps(), vec![10, 20]);
}

#[tokio::test]
async fn backend_error_ends_the_run_and_flushes() {
    let backend = Arc::new(MemoryBackend::new());
    backend.add_group("/app");
    backend.fail_next_requests(1);

    let (mut engine, sink) = engine(&backend, single("/app"), TailOptions::new(0));
    let (_handle, mut signal) = shutdown::channel();

    let err = engine.run(&mut signal).await.unwrap_err();
    assert_eq!(err.exit_code(), 1);
    assert!(sink.snapshot().finished);
    assert_eq!(engine.watermark().get(), 0);
}

#[tokio::test]
async fn unknown_group_is_a_backend_error() {
    let backend = Arc::new(MemoryBackend::new());
    let (mut engine, _sink) = engine(&backend, single("/missing"), single_pass(0));

    assert!(matches!(
        engine.poll_once().await,
        Err(CwtailError::Backend { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn keep_open_polls_until_interrupted() {
    let backend = Arc::new(MemoryBackend::new());
    backend.push_event("/app", "s", 10, "early");
    backend.schedule_event(1, "/app", "s", 50, "late arrival");

    let mut options = TailOptions::new(0);
    options.poll_interval = Duration::from_millis(1000);
    let (mut engine, sink) = engine(&backend, single("/app"), options);

    let (handle, mut signal) = shutdown::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        handle.trigger();
    });

    let outcome = engine.run(&mut signal).await.unwrap();
    assert_eq!(outcome, TailOutcome::Interrupted);
    assert_eq!(engine.phase(), EnginePhase::Done);

    let stats = engine.stats();
    assert!(stats.cycles >= 2);
    assert_eq!(stats.sleeps, stats.cycles);

    let recording = sink.snapshot();
    assert_eq!(recording.timestamps(), vec![10, 50]);
    assert!(recording.finished);
    assert_eq!(engine.watermark().get(), 50);
}

#[tokio::test]
async fn interrupt_before_first_fetch() {
    let backend = Arc::new(MemoryBackend::new());
    backend.push_event("/app", "s", 10, "never shown");

    let (mut engine, sink) = engine(&backend, single("/app"), TailOptions::new(0));
    let (handle, mut signal) = shutdown::channel();
    handle.trigger();

    assert_eq!(engine.run(&mut signal).await.unwrap(), TailOutcome::Interrupted);
    assert_eq!(engine.stats().cycles, 0);
    assert!(backend.event_queries().is_empty());
    assert!(sink.snapshot().finished);
}

#[tokio::test(start_paused = true)]
async fn interrupt_during_backend_call() {
    let inner = Arc::new(MemoryBackend::new());
    inner.push_event("/app", "s", 10, "arrives too late");

    let backend = Arc::new(SlowSearch {
        inner: Arc::clone(&inner),
        delay: Duration::from_secs(5),
    });
    let sink = RecordingSink::new();
    let fetcher = EventFetcher::new(backend, StreamStrategy::default());
    let mut engine = TailEngine::new(
        fetcher,
        single("/app"),
        TailOptions::new(0),
        Box::new(sink.clone()),
    );

    let (handle, mut signal) = shutdown::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.trigger();
    });

    let outcome = engine.run(&mut signal).await.unwrap();
    assert_eq!(outcome, TailOutcome::Interrupted);
    assert_eq!(engine.watermark().get(), 0);
    assert_eq!(engine.stats().cycles, 0);

    // the stream listing went out, the search was abandoned before it answered
    assert_eq!(inner.stream_queries().len(), 1);
    assert!(inner.event_queries().is_empty());

    let recording = sink.snapshot();
    assert!(recording.batches.is_empty());
    assert!(recording.finished);
}
