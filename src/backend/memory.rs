//! In-process backend over scripted data.
//!
//! Pagination tokens are plain offsets into the ordered result, so a query repeated with a
//! later `end_time` keeps earlier tokens valid as long as new events sort after the old ones.
//! Used by the integration tests and handy for exercising the engine without AWS.

use crate::backend::{
    EventQuery, LogBackend, LogGroupInfo, LogStreamInfo, Page, RawEvent, StreamQuery,
};
use crate::error::{CwtailError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct MemoryStream {
    events: Vec<RawEvent>,
}

impl MemoryStream {
    fn first_event_time(&self) -> Option<i64> {
        self.events.iter().map(|e| e.timestamp).min()
    }

    fn last_event_time(&self) -> Option<i64> {
        self.events.iter().map(|e| e.timestamp).max()
    }
}

#[derive(Debug)]
struct ScheduledArrival {
    after_queries: usize,
    group: String,
    stream: String,
    event: RawEvent,
}

#[derive(Debug, Default)]
struct State {
    groups: BTreeMap<String, BTreeMap<String, MemoryStream>>,
    event_queries: Vec<EventQuery>,
    stream_queries: Vec<StreamQuery>,
    pending_failures: usize,
    arrivals: Vec<ScheduledArrival>,
}

impl State {
    fn insert(&mut self, group: &str, stream: &str, event: RawEvent) {
        self.groups
            .entry(group.to_owned())
            .or_default()
            .entry(stream.to_owned())
            .or_default()
            .events
            .push(event);
    }

    fn deliver_arrivals(&mut self) {
        let served = self.event_queries.len();
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.arrivals)
            .into_iter()
            .partition(|arrival| arrival.after_queries <= served);
        self.arrivals = pending;
        for arrival in due {
            self.insert(&arrival.group, &arrival.stream, arrival.event);
        }
    }

    fn take_failure(&mut self, operation: &str) -> Result<()> {
        if self.pending_failures > 0 {
            self.pending_failures -= 1;
            return Err(CwtailError::backend(format!(
                "{operation}: injected failure"
            )));
        }
        Ok(())
    }
}

/// Scripted log backend
#[derive(Debug)]
pub struct MemoryBackend {
    state: Mutex<State>,
    group_page_size: usize,
    event_page_size: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_offset(token: Option<&str>) -> Result<usize> {
    match token {
        None => Ok(0),
        Some(token) => token
            .parse()
            .map_err(|_| CwtailError::backend(format!("invalid pagination token '{token}'"))),
    }
}

fn paginate<T: Clone>(items: &[T], offset: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let end = (offset + page_size).min(items.len());
    let start = offset.min(end);
    Page {
        items: items[start..end].to_vec(),
        next_token: (end < items.len()).then(|| end.to_string()),
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_page_sizes(50, 10_000)
    }

    /// Backend that splits group listings and event searches into pages of the given sizes
    pub fn with_page_sizes(group_page_size: usize, event_page_size: usize) -> Self {
        Self {
            state: Mutex::new(State::default()),
            group_page_size,
            event_page_size,
        }
    }

    /// Register an empty log group
    pub fn add_group(&self, group: &str) {
        self.state.lock().groups.entry(group.to_owned()).or_default();
    }

    /// Register an empty stream inside a group
    pub fn add_stream(&self, group: &str, stream: &str) {
        self.state
            .lock()
            .groups
            .entry(group.to_owned())
            .or_default()
            .entry(stream.to_owned())
            .or_default();
    }

    /// Append an event to `group`/`stream`, creating both as needed
    pub fn push_event(&self, group: &str, stream: &str, timestamp: i64, message: &str) {
        self.state.lock().insert(
            group,
            stream,
            RawEvent {
                timestamp,
                message: message.to_owned(),
            },
        );
    }

    /// Make an event visible once `after_queries` filtered-event queries have been served
    pub fn schedule_event(
        &self,
        after_queries: usize,
        group: &str,
        stream: &str,
        timestamp: i64,
        message: &str,
    ) {
        self.state.lock().arrivals.push(ScheduledArrival {
            after_queries,
            group: group.to_owned(),
            stream: stream.to_owned(),
            event: RawEvent {
                timestamp,
                message: message.to_owned(),
            },
        });
    }

    /// Fail the next `count` backend requests of any kind
    pub fn fail_next_requests(&self, count: usize) {
        self.state.lock().pending_failures = count;
    }

    /// Every filtered-event query served so far, in order
    pub fn event_queries(&self) -> Vec<EventQuery> {
        self.state.lock().event_queries.clone()
    }

    /// Every stream listing query served so far, in order
    pub fn stream_queries(&self) -> Vec<StreamQuery> {
        self.state.lock().stream_queries.clone()
    }
}

#[async_trait]
impl LogBackend for MemoryBackend {
    async fn list_log_groups(&self, next_token: Option<String>) -> Result<Page<LogGroupInfo>> {
        let mut state = self.state.lock();
        state.take_failure("DescribeLogGroups")?;

        let groups: Vec<LogGroupInfo> = state
            .groups
            .keys()
            .map(|name| LogGroupInfo { name: name.clone() })
            .collect();
        let offset = parse_offset(next_token.as_deref())?;
        Ok(paginate(&groups, offset, self.group_page_size))
    }

    async fn list_log_streams(&self, query: StreamQuery) -> Result<Page<LogStreamInfo>> {
        let mut state = self.state.lock();
        state.take_failure("DescribeLogStreams")?;
        state.stream_queries.push(query.clone());

        let streams = state.groups.get(&query.group).ok_or_else(|| {
            CwtailError::backend(format!(
                "DescribeLogStreams: log group '{}' does not exist",
                query.group
            ))
        })?;

        let mut infos: Vec<LogStreamInfo> = streams
            .iter()
            .map(|(name, stream)| LogStreamInfo {
                name: name.clone(),
                first_event_time: stream.first_event_time(),
                last_event_time: stream.last_event_time(),
            })
            .collect();
        // Most recently active first; streams without events sort last.
        infos.sort_by(|a, b| b.last_event_time.cmp(&a.last_event_time));

        let offset = parse_offset(query.next_token.as_deref())?;
        let page_size = usize::try_from(query.page_size).unwrap_or(1);
        Ok(paginate(&infos, offset, page_size))
    }

    async fn filter_events(&self, query: EventQuery) -> Result<Page<RawEvent>> {
        let mut state = self.state.lock();
        state.take_failure("FilterLogEvents")?;
        state.event_queries.push(query.clone());

        let streams = state.groups.get(&query.group).ok_or_else(|| {
            CwtailError::backend(format!(
                "FilterLogEvents: log group '{}' does not exist",
                query.group
            ))
        })?;

        let mut matching: Vec<RawEvent> = query
            .stream_names
            .iter()
            .filter_map(|name| streams.get(name))
            .flat_map(|stream| stream.events.iter())
            .filter(|event| event.timestamp >= query.start_time && event.timestamp < query.end_time)
            .filter(|event| {
                query.filter_pattern.is_empty() || event.message.contains(&query.filter_pattern)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|event| event.timestamp);

        let offset = parse_offset(query.next_token.as_deref())?;
        let limit = usize::try_from(query.limit).unwrap_or(1);
        let page = paginate(&matching, offset, self.event_page_size.min(limit));

        state.deliver_arrivals();
        Ok(page)
    }
}
