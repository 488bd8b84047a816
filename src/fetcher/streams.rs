//! Stream listing strategies.
//!
//! `Recent` asks for a single page of the most recently active streams: one request, but a
//! stream that stopped receiving events a while ago can be missed. `Paginated` walks the full
//! listing page by page. It stops after the first page that reaches back before the window and
//! skips pages whose streams all start after it; a kept page keeps all of its streams, since a
//! stream's last event time may lag behind its newest events.

use crate::backend::{LogBackend, LogStreamInfo, StreamQuery};
use crate::error::Result;
use crate::fetcher::FetchWindow;

/// Largest page the stream listing accepts
pub const MAX_STREAM_PAGE: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStrategy {
    /// One page of at most `limit` streams, newest activity first
    Recent { limit: i32 },
    /// Every page, stopping once streams go quiet before the window opens
    Paginated { page_size: i32 },
}

impl Default for StreamStrategy {
    fn default() -> Self {
        StreamStrategy::Recent {
            limit: MAX_STREAM_PAGE,
        }
    }
}

impl StreamStrategy {
    pub fn paginated() -> Self {
        StreamStrategy::Paginated {
            page_size: MAX_STREAM_PAGE,
        }
    }

    /// Full pagination when asked for explicitly or when a bounded window is tailed
    pub fn select(use_paginate: bool, bounded: bool) -> Self {
        if use_paginate || bounded {
            Self::paginated()
        } else {
            Self::default()
        }
    }
}

/// Whether a stream on a kept page can hold events inside the window.
///
/// Only the first event time is trusted: `last_event_time` is updated lazily by the service
/// and can lag behind events already searchable, so it never excludes a single stream.
fn may_hold_window_events(stream: &LogStreamInfo, window: &FetchWindow) -> bool {
    match (window.upper, stream.first_event_time) {
        (Some(upper), Some(first)) => first < upper,
        _ => true,
    }
}

/// True when every stream on the page only has activity at or after the window closes
fn starts_after_window(page: &[LogStreamInfo], window: &FetchWindow) -> bool {
    let Some(upper) = window.upper else {
        return false;
    };
    page.iter()
        .all(|stream| stream.first_event_time.map_or(false, |first| first >= upper))
}

pub(crate) async fn list(
    backend: &dyn LogBackend,
    strategy: StreamStrategy,
    group: &str,
    window: &FetchWindow,
) -> Result<Vec<String>> {
    match strategy {
        StreamStrategy::Recent { limit } => {
            let page = backend
                .list_log_streams(StreamQuery {
                    group: group.to_owned(),
                    page_size: limit,
                    next_token: None,
                })
                .await?;
            Ok(page.items.into_iter().map(|stream| stream.name).collect())
        }
        StreamStrategy::Paginated { page_size } => {
            list_paginated(backend, page_size, group, window).await
        }
    }
}

async fn list_paginated(
    backend: &dyn LogBackend,
    page_size: i32,
    group: &str,
    window: &FetchWindow,
) -> Result<Vec<String>> {
    let mut names = Vec::new();
    let mut next_token = None;
    let mut pages = 0usize;

    loop {
        let page = backend
            .list_log_streams(StreamQuery {
                group: group.to_owned(),
                page_size,
                next_token,
            })
            .await?;
        pages += 1;

        if starts_after_window(&page.items, window) {
            log::trace!("Skipping stream page {} of {}: newer than window", pages, group);
        } else {
            names.extend(
                page.items
                    .iter()
                    .filter(|stream| may_hold_window_events(stream, window))
                    .map(|stream| stream.name.clone()),
            );
        }

        // Pages are ordered by last activity, so once a page reaches back before the
        // window every later page is older still.
        let oldest_activity = page.items.iter().filter_map(|s| s.last_event_time).min();
        let reached_before_window = oldest_activity.map_or(true, |t| t < window.lower);

        match page.next_token {
            Some(token) if !reached_before_window => next_token = Some(token),
            _ => break,
        }
    }

    log::debug!(
        "Listed {} streams of {} in {} pages",
        names.len(),
        group,
        pages
    );
    Ok(names)
}
