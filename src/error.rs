//! Error types and handling infrastructure for cwtail.
//!
//! This module provides a centralized error handling system using `thiserror` for
//! library error types. The binary adds context with `anyhow` at the composition root.
//!
//! ## Design Principles
//!
//! - **User-friendly messages**: Errors should say what input was rejected
//! - **Startup vs steady state**: Parser and resolver errors only happen before tailing starts
//! - **Exit codes**: Every error knows which process exit status it maps to

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for cwtail operations.
#[derive(Error, Debug)]
pub enum CwtailError {
    /// `--since`/`--to` matched neither the duration grammar nor the absolute format
    #[error("Invalid duration or timestamp '{input}': {reason}")]
    InvalidDuration { input: String, reason: String },

    /// Substring search over the log group catalog found nothing
    #[error("No log groups found matching '{identifier}'")]
    NoMatch { identifier: String },

    /// Operator answered the disambiguation prompt with something unusable
    #[error("Invalid selection '{input}': expected a number between 0 and {max}")]
    InvalidSelection { input: String, max: usize },

    /// `-s` named a log set that the configuration does not define
    #[error("Log set '{name}' not found in configuration")]
    UnknownLogSet { name: String },

    /// Conflicting or malformed command line arguments
    #[error("Usage error: {message}")]
    Usage { message: String },

    /// Any failure reported by the log backend (auth, throttling, pagination, transport)
    #[error("Backend request failed: {message}")]
    Backend { message: String },

    /// Configuration file exists (or was named explicitly) but could not be read
    #[error("Failed to read configuration file {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid JSON for the log set schema
    #[error("Failed to parse configuration file {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration parsed but violates an invariant
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Terminal or prompt I/O failures
    #[error("I/O operation failed: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Standard Result type for cwtail operations.
pub type Result<T> = std::result::Result<T, CwtailError>;

impl CwtailError {
    /// Create an InvalidDuration error for the rejected input
    pub fn invalid_duration(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a Backend error with a descriptive message
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a Usage error with a descriptive message
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Create an InvalidConfig error with a descriptive message
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Io error from an io::Error with additional context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage { .. } => 2,
            _ => 1,
        }
    }
}

impl From<std::io::Error> for CwtailError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: "terminal I/O failed".to_string(),
            source: err,
        }
    }
}
