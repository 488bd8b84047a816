//! Event fetching for one log target.
//!
//! A fetch first enumerates the target's streams, then runs the paginated filtered-event
//! search over them and returns every matching event in `[lower, upper)` sorted by timestamp.
//!
//! In unbounded (tailing) mode the upper bound is re-read from the [`Clock`] on every
//! pagination round, so one fetch can pick up events that arrive while it is paginating.
//! In bounded mode the upper bound is fixed and the query runs exactly one pagination pass.

pub mod clock;
pub mod streams;

use crate::backend::{EventQuery, LogBackend, MAX_STREAMS_PER_QUERY};
use crate::error::Result;
use crate::event::{LogEvent, LogTarget};
use std::sync::Arc;

pub use clock::{Clock, ManualClock, SystemClock};
pub use streams::StreamStrategy;

/// Time bounds of one fetch, in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// Inclusive lower bound
    pub lower: i64,
    /// Exclusive upper bound; `None` means "now", re-evaluated per page
    pub upper: Option<i64>,
}

impl FetchWindow {
    pub fn new(lower: i64, upper: Option<i64>) -> Self {
        Self { lower, upper }
    }
}

/// Fetches events for single targets from a [`LogBackend`]
pub struct EventFetcher {
    backend: Arc<dyn LogBackend>,
    strategy: StreamStrategy,
    clock: Arc<dyn Clock>,
}

impl EventFetcher {
    pub fn new(backend: Arc<dyn LogBackend>, strategy: StreamStrategy) -> Self {
        Self::with_clock(backend, strategy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        backend: Arc<dyn LogBackend>,
        strategy: StreamStrategy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            strategy,
            clock,
        }
    }

    pub fn strategy(&self) -> StreamStrategy {
        self.strategy
    }

    /// Stream names of `target` worth querying for `window`, most recently active first
    pub async fn list_streams(&self, target: &LogTarget, window: &FetchWindow) -> Result<Vec<String>> {
        streams::list(self.backend.as_ref(), self.strategy, &target.name, window).await
    }

    /// Every event of `target` matching `filter_pattern` within `window`, oldest first.
    ///
    /// Events with equal timestamps keep the order the backend returned them in.
    pub async fn fetch(
        &self,
        target: &LogTarget,
        filter_pattern: &str,
        window: FetchWindow,
        limit: i32,
    ) -> Result<Vec<LogEvent>> {
        let streams = self.list_streams(target, &window).await?;
        if streams.is_empty() {
            log::debug!("No streams in window for {}, skipping search", target.name);
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        for chunk in streams.chunks(MAX_STREAMS_PER_QUERY) {
            self.search_streams(target, chunk, filter_pattern, window, limit, &mut events)
                .await?;
        }

        events.sort_by_key(|event: &LogEvent| event.timestamp);
        log::debug!(
            "Fetched {} events from {} ({} streams)",
            events.len(),
            target.name,
            streams.len()
        );
        Ok(events)
    }

    async fn search_streams(
        &self,
        target: &LogTarget,
        stream_names: &[String],
        filter_pattern: &str,
        window: FetchWindow,
        limit: i32,
        events: &mut Vec<LogEvent>,
    ) -> Result<()> {
        let mut next_token = None;
        let mut round = 0usize;
        loop {
            let end_time = window.upper.unwrap_or_else(|| self.clock.now_millis());
            if end_time <= window.lower {
                log::trace!("Empty window [{}, {}) for {}", window.lower, end_time, target.name);
                return Ok(());
            }

            round += 1;
            let page = self
                .backend
                .filter_events(EventQuery {
                    group: target.name.clone(),
                    stream_names: stream_names.to_vec(),
                    start_time: window.lower,
                    end_time,
                    filter_pattern: filter_pattern.to_owned(),
                    limit,
                    next_token,
                })
                .await?;

            log::trace!(
                "Search round {} on {}: {} events, more: {}",
                round,
                target.name,
                page.items.len(),
                page.next_token.is_some()
            );
            events.extend(
                page.items
                    .into_iter()
                    .map(|raw| LogEvent::new(raw.timestamp, raw.message)),
            );

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(()),
            }
        }
    }
}
