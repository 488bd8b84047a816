//! Log backend abstraction.
//!
//! The tail engine never talks to CloudWatch directly: it sees a paginated catalog of log
//! groups, a paginated listing of each group's streams, and a paginated filtered-event search.
//! [`cloudwatch::CloudWatchBackend`] implements this against AWS, [`memory::MemoryBackend`]
//! against scripted in-process data.

pub mod cloudwatch;
pub mod memory;

use crate::error::Result;
use async_trait::async_trait;

pub use cloudwatch::CloudWatchBackend;
pub use memory::MemoryBackend;

/// Upper bound the backend accepts for a single page of events
pub const MAX_EVENTS_PER_PAGE: i32 = 10_000;

/// Maximum number of stream names accepted by one filtered-event query
pub const MAX_STREAMS_PER_QUERY: usize = 100;

/// One page of results plus the continuation token for the next page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

/// Catalog entry for a log group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogGroupInfo {
    pub name: String,
}

/// Stream metadata used to prune listings by activity window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStreamInfo {
    pub name: String,
    /// Timestamp of the oldest event, absent for streams without events
    pub first_event_time: Option<i64>,
    /// Timestamp of the newest event, absent for streams without events
    pub last_event_time: Option<i64>,
}

/// Stream listing request; results are always most-recently-active first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamQuery {
    pub group: String,
    pub page_size: i32,
    pub next_token: Option<String>,
}

/// Filtered-event search over a subset of a group's streams within `[start_time, end_time)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub group: String,
    pub stream_names: Vec<String>,
    pub start_time: i64,
    pub end_time: i64,
    pub filter_pattern: String,
    pub limit: i32,
    pub next_token: Option<String>,
}

/// Raw event as returned by the backend, before it is attributed to a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub timestamp: i64,
    pub message: String,
}

/// Collaborator contract the tail engine needs from a log-query service.
///
/// Every operation returns one page; callers own the pagination loop.
#[async_trait]
pub trait LogBackend: Send + Sync {
    /// List the log group catalog
    async fn list_log_groups(&self, next_token: Option<String>) -> Result<Page<LogGroupInfo>>;

    /// List streams of one group, ordered by last event time, newest first
    async fn list_log_streams(&self, query: StreamQuery) -> Result<Page<LogStreamInfo>>;

    /// Search events matching `filter_pattern` across the given streams
    async fn filter_events(&self, query: EventQuery) -> Result<Page<RawEvent>>;
}
