//! Core data model: log targets, log sets and fetched events.

use serde::Deserialize;
use std::sync::Arc;

/// A resolved, addressable log group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct LogTarget {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl LogTarget {
    /// Target addressed by its exact name, without a display alias
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// Target with a display alias, as configured in a log set
    pub fn with_alias(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// Alias when one is configured and non-empty, otherwise the name
    pub fn label(&self) -> &str {
        match self.alias.as_deref() {
            Some(alias) if !alias.is_empty() => alias,
            _ => &self.name,
        }
    }
}

/// Named, ordered collection of targets tailed together as one merged stream.
///
/// Target names are unique within a set; `config` enforces this at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSet {
    pub name: String,
    pub targets: Vec<LogTarget>,
}

impl LogSet {
    /// Position of `name` within the set, used for stable color assignment
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.targets.iter().position(|target| target.name == name)
    }
}

/// One event returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub message: String,
    /// Originating target; only set when tailing a log set
    pub source: Option<Arc<LogTarget>>,
}

impl LogEvent {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the originating target
    pub fn tagged(mut self, source: Arc<LogTarget>) -> Self {
        self.source = Some(source);
        self
    }

    /// Invocation lifecycle markers are tracked for progress but never drawn.
    pub fn is_lifecycle_marker(&self) -> bool {
        is_lifecycle_marker(&self.message)
    }
}

const LIFECYCLE_MARKERS: [&str; 3] = ["START RequestId", "END RequestId", "REPORT RequestId"];

/// True when `message` is a start/end/report marker of a function invocation
pub fn is_lifecycle_marker(message: &str) -> bool {
    LIFECYCLE_MARKERS
        .iter()
        .any(|marker| message.contains(marker))
}
