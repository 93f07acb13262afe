//! Error handling for multiterm-rs
//!
//! This module defines the crate-wide error type and a Result alias. Errors
//! that belong to a single subsystem (`PipelineError`, `PatternError`) live
//! next to that subsystem and convert into [`MultitermError`] via `From`.

use crate::pipeline::error::{PatternError, PipelineError};
use thiserror::Error;

/// Main error type for multiterm-rs operations
#[derive(Error, Debug)]
pub enum MultitermError {
    /// Errors raised while wiring or driving the node graph
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Malformed byte-sequence pattern
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Payload too large for the 16-bit frame length field
    #[error("Frame payload of {len} bytes exceeds the maximum of {max}")]
    OversizeFrame { len: usize, max: usize },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<MultitermError>,
    },
}

impl MultitermError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        MultitermError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Result type alias for multiterm-rs operations
pub type Result<T> = std::result::Result<T, MultitermError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<MultitermError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
