//! The tail engine.
//!
//! One owned loop drives every run:
//!
//! ```text
//! INIT -> FETCH -> RENDER -> ADVANCE -+-> SLEEP -> FETCH ...
//!                                     +-> DONE   (single pass: --to given or keep-open off)
//! ```
//!
//! FETCH queries every target with `lower = watermark`, merges set results into one
//! chronological sequence and drops events at or below the watermark (the backend may
//! redeliver them). RENDER hands the rest to the sink, minus invocation lifecycle markers.
//! ADVANCE moves the watermark to the newest event fetched, markers included. A failed fetch
//! returns before ADVANCE, so the watermark only ever reflects rendered events.

pub mod merge;
pub mod shutdown;
pub mod watermark;

use crate::error::Result;
use crate::event::{LogEvent, LogSet, LogTarget};
use crate::fetcher::{EventFetcher, FetchWindow};
use crate::render::EventSink;
use crate::resolver::Resolution;
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;

pub use merge::merge_batches;
pub use shutdown::{ShutdownHandle, ShutdownSignal};
pub use watermark::Watermark;

/// Pause between polls when keeping the tail open
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Where the engine is in its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Init,
    Fetch,
    Render,
    Advance,
    Sleep,
    Done,
}

/// How a run ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailOutcome {
    /// Single pass finished
    Completed,
    /// External cancellation while fetching or sleeping
    Interrupted,
}

/// Run parameters fixed at startup
#[derive(Debug, Clone)]
pub struct TailOptions {
    /// Backend-native filter syntax, passed through untouched
    pub filter_pattern: String,
    /// Initial watermark, epoch ms
    pub since: i64,
    /// Exclusive upper bound, epoch ms; forces a single pass
    pub until: Option<i64>,
    pub keep_open: bool,
    pub poll_interval: Duration,
    /// Events per backend page
    pub limit: i32,
}

impl TailOptions {
    pub fn new(since: i64) -> Self {
        Self {
            filter_pattern: String::new(),
            since,
            until: None,
            keep_open: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
            limit: crate::backend::MAX_EVENTS_PER_PAGE,
        }
    }

    /// Bounded runs and runs without keep-open stop after one pass
    pub fn is_single_pass(&self) -> bool {
        self.until.is_some() || !self.keep_open
    }
}

/// Counters describing what a run did so far
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TailStats {
    /// Completed FETCH -> RENDER -> ADVANCE cycles
    pub cycles: usize,
    /// Times the engine entered SLEEP
    pub sleeps: usize,
    /// Events handed to the sink
    pub rendered: usize,
    /// Lifecycle markers counted for the watermark but not drawn
    pub suppressed: usize,
}

enum Sources {
    Single(LogTarget),
    Set {
        log_set: LogSet,
        targets: Vec<Arc<LogTarget>>,
    },
}

/// Owns the watermark and the resolved targets for one run
pub struct TailEngine {
    fetcher: EventFetcher,
    sources: Sources,
    options: TailOptions,
    sink: Box<dyn EventSink>,
    watermark: Watermark,
    phase: EnginePhase,
    stats: TailStats,
}

impl TailEngine {
    pub fn new(
        fetcher: EventFetcher,
        resolution: Resolution,
        options: TailOptions,
        sink: Box<dyn EventSink>,
    ) -> Self {
        let sources = match resolution {
            Resolution::Single(target) => Sources::Single(target),
            Resolution::Set(log_set) => {
                let targets = log_set.targets.iter().cloned().map(Arc::new).collect();
                Sources::Set { log_set, targets }
            }
        };
        let watermark = Watermark::new(options.since);

        Self {
            fetcher,
            sources,
            options,
            sink,
            watermark,
            phase: EnginePhase::Init,
            stats: TailStats::default(),
        }
    }

    pub fn watermark(&self) -> Watermark {
        self.watermark
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn stats(&self) -> TailStats {
        self.stats
    }

    fn transition(&mut self, next: EnginePhase) {
        log::trace!("Engine phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    fn log_set(&self) -> Option<&LogSet> {
        match &self.sources {
            Sources::Single(_) => None,
            Sources::Set { log_set, .. } => Some(log_set),
        }
    }

    /// FETCH for every target, merged in chronological order
    async fn fetch_all(&self) -> Result<Vec<LogEvent>> {
        let window = FetchWindow::new(self.watermark.get(), self.options.until);
        let pattern = self.options.filter_pattern.as_str();
        let limit = self.options.limit;

        match &self.sources {
            Sources::Single(target) => self.fetcher.fetch(target, pattern, window, limit).await,
            Sources::Set { targets, .. } => {
                let fetches = targets.iter().map(|target| async move {
                    let events = self.fetcher.fetch(target, pattern, window, limit).await?;
                    Ok::<_, crate::error::CwtailError>((Arc::clone(target), events))
                });
                let batches = try_join_all(fetches).await?;
                Ok(merge_batches(batches))
            }
        }
    }

    /// One FETCH -> RENDER -> ADVANCE cycle. Returns the number of events drawn.
    pub async fn poll_once(&mut self) -> Result<usize> {
        self.transition(EnginePhase::Fetch);
        let fetched = self.fetch_all().await?;
        let fetched_count = fetched.len();

        let watermark = self.watermark;
        let fresh: Vec<LogEvent> = fetched
            .into_iter()
            .filter(|event| watermark.admits(event.timestamp))
            .collect();

        self.transition(EnginePhase::Render);
        let (markers, visible): (Vec<LogEvent>, Vec<LogEvent>) = fresh
            .into_iter()
            .partition(LogEvent::is_lifecycle_marker);
        if !visible.is_empty() {
            self.sink.render(&visible)?;
        }

        self.transition(EnginePhase::Advance);
        let previous = self.watermark.get();
        // Suppressed markers advance the watermark as well
        let moved = self.watermark.advance_past(&visible) | self.watermark.advance_past(&markers);
        log::debug!(
            "Fetched {} events, {} new, {} markers",
            fetched_count,
            visible.len() + markers.len(),
            markers.len()
        );
        if moved {
            log::trace!("Watermark {} -> {}", previous, self.watermark.get());
        }

        self.stats.cycles += 1;
        self.stats.rendered += visible.len();
        self.stats.suppressed += markers.len();
        Ok(visible.len())
    }

    fn stop(&mut self, outcome: TailOutcome) -> Result<TailOutcome> {
        self.transition(EnginePhase::Done);
        self.sink.finish()?;
        log::debug!("Tail finished: {:?}, {:?}", outcome, self.stats);
        Ok(outcome)
    }

    /// Drive the loop until a single pass completes, `shutdown` fires, or a fetch fails
    pub async fn run(&mut self, shutdown: &mut ShutdownSignal) -> Result<TailOutcome> {
        let log_set = self.log_set().cloned();
        log::debug!(
            "Tailing from {} with {:?}, single pass: {}",
            self.watermark.get(),
            self.fetcher.strategy(),
            self.options.is_single_pass()
        );
        self.sink.begin(log_set.as_ref())?;

        loop {
            let cycle = tokio::select! {
                biased;
                _ = shutdown.wait() => None,
                result = self.poll_once() => Some(result),
            };
            match cycle {
                None => return self.stop(TailOutcome::Interrupted),
                Some(Err(e)) => {
                    if let Err(flush_err) = self.sink.finish() {
                        log::warn!("Failed to flush output after error: {}", flush_err);
                    }
                    return Err(e);
                }
                Some(Ok(_)) => {}
            }

            if self.options.is_single_pass() {
                return self.stop(TailOutcome::Completed);
            }

            self.transition(EnginePhase::Sleep);
            self.stats.sleeps += 1;
            tokio::select! {
                biased;
                _ = shutdown.wait() => return self.stop(TailOutcome::Interrupted),
                _ = tokio::time::sleep(self.options.poll_interval) => {}
            }
        }
    }
}
