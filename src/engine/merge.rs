//! Multi-source merge.

use crate::event::{LogEvent, LogTarget};
use std::sync::Arc;

/// Tag each batch with its target, concatenate in the given order and stable-sort by
/// timestamp. Same-target order is preserved and cross-target ties resolve by batch order.
pub fn merge_batches(batches: Vec<(Arc<LogTarget>, Vec<LogEvent>)>) -> Vec<LogEvent> {
    let total = batches.iter().map(|(_, events)| events.len()).sum();
    let mut merged = Vec::with_capacity(total);
    for (target, events) in batches {
        merged.extend(
            events
                .into_iter()
                .map(|event| event.tagged(Arc::clone(&target))),
        );
    }
    merged.sort_by_key(|event| event.timestamp);
    merged
}
