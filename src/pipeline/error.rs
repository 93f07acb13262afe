//! Pipeline-specific error types.

use crate::pipeline::id::NodeId;
use crate::pipeline::port::{Port, PortDirection};
use thiserror::Error;

/// Errors that can occur while wiring or driving the node graph.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("Node '{node}' has no {direction:?} port '{port}'")]
    PortMismatch {
        node: String,
        port: Port,
        direction: PortDirection,
    },

    #[error("Node {0:?} is not a pollable source")]
    NotPollable(NodeId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Malformed byte-sequence pattern, reported at wiring time.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("Pattern is empty")]
    Empty,

    #[error("Unclosed '[' in pattern {pattern:?}")]
    UnclosedClass { pattern: Vec<u8> },

    #[error("Invalid class entry {entry:?}: expected a single byte or an ascending 'lo-hi' range")]
    InvalidClassEntry { entry: Vec<u8> },

    #[error("Bytes after the closing ']' in pattern {pattern:?}")]
    TrailingAfterClass { pattern: Vec<u8> },
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
