//! The "already rendered" boundary.

use crate::event::LogEvent;

/// Timestamp (epoch ms) of the newest event already handed to the renderer, or the initial
/// `since` bound before anything was rendered. Never moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Watermark(i64);

impl Watermark {
    pub fn new(since: i64) -> Self {
        Self(since)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    /// Events at or below the watermark count as already rendered
    pub fn admits(self, timestamp: i64) -> bool {
        timestamp > self.0
    }

    /// Move to `newest` when it is ahead. Returns whether the watermark moved.
    pub fn advance(&mut self, newest: Option<i64>) -> bool {
        match newest {
            Some(timestamp) if timestamp > self.0 => {
                self.0 = timestamp;
                true
            }
            _ => false,
        }
    }

    /// Advance past every event of a batch
    pub fn advance_past(&mut self, events: &[LogEvent]) -> bool {
        self.advance(events.iter().map(|event| event.timestamp).max())
    }
}
