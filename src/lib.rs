//! # cwtail - Terminal Tail for CloudWatch Logs
//!
//! Follows one log group, or a configured set of log groups merged into a single
//! chronological stream, printing new events as they arrive.
//!
//! ## Features
//!
//! - **Flexible time bounds**: `--since`/`--to` accept Go-style durations (`1h30m`) or
//!   absolute timestamps
//! - **Log sets**: named groups of log groups from a JSON configuration, rendered with
//!   per-target color indicators
//! - **Exactly-once output**: a timestamp watermark hides redelivered events across polls
//! - **Pluggable backend**: CloudWatch in production, an in-memory backend for tests
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and exit codes
//! - [`duration`] - Relative duration and absolute timestamp parsing
//! - [`event`] - Targets, log sets and events
//! - [`config`] - Log set configuration loading
//! - [`backend`] - Log backend abstraction with CloudWatch and in-memory implementations
//! - [`resolver`] - Identifier to target or log set resolution
//! - [`fetcher`] - Stream discovery and paginated event search for one target
//! - [`engine`] - The polling state machine, watermark and merge
//! - [`render`] - Terminal output
//! - [`cli`] / [`app`] - Command line surface and component wiring

// Core modules
pub mod duration;
pub mod error;
pub mod event;

// Configuration and data access
pub mod backend;
pub mod config;
pub mod fetcher;
pub mod resolver;

// Tailing and output
pub mod engine;
pub mod render;

// Entry points
pub mod app;
pub mod cli;

// Re-export commonly used types for convenience
pub use error::{CwtailError, Result};

// Public API surface for external usage
pub use app::Application;
pub use backend::LogBackend;
pub use engine::{TailEngine, TailOptions, TailOutcome};
pub use event::{LogEvent, LogSet, LogTarget};
pub use render::EventSink;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
