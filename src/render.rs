//! Rendering of merged event batches.
//!
//! The engine hands each filtered batch to an [`EventSink`]. [`terminal::TerminalRenderer`]
//! draws them with per-target colors; [`RecordingSink`] keeps them for inspection.

pub mod terminal;
pub mod theme;

use crate::error::Result;
use crate::event::{LogEvent, LogSet};
use parking_lot::Mutex;
use std::sync::Arc;

pub use terminal::TerminalRenderer;
pub use theme::Theme;

/// Consumer of rendered batches
pub trait EventSink: Send {
    /// Called once before the first batch; `log_set` is present when tailing a set
    fn begin(&mut self, _log_set: Option<&LogSet>) -> Result<()> {
        Ok(())
    }

    /// Draw one chronological batch. Never called with an empty batch.
    fn render(&mut self, events: &[LogEvent]) -> Result<()>;

    /// Flush pending output; called on completion and on interrupt
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Everything a [`RecordingSink`] saw
#[derive(Debug, Default, Clone)]
pub struct Recording {
    pub log_set: Option<LogSet>,
    pub batches: Vec<Vec<LogEvent>>,
    pub finished: bool,
}

impl Recording {
    /// Timestamps of every rendered event, in render order
    pub fn timestamps(&self) -> Vec<i64> {
        self.batches
            .iter()
            .flatten()
            .map(|event| event.timestamp)
            .collect()
    }
}

/// Sink that records batches behind a shared handle
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn snapshot(&self) -> Recording {
        self.recording.lock().clone()
    }
}

impl EventSink for RecordingSink {
    fn begin(&mut self, log_set: Option<&LogSet>) -> Result<()> {
        self.recording.lock().log_set = log_set.cloned();
        Ok(())
    }

    fn render(&mut self, events: &[LogEvent]) -> Result<()> {
        self.recording.lock().batches.push(events.to_vec());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.recording.lock().finished = true;
        Ok(())
    }
}
