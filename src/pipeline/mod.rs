//! Node-based byte pipeline.
//!
//! Bytes flow between stages as chunks, each tagged with the identity of the
//! stage (or external source) that forwarded it. Stages register receivers
//! under a routing key and forward synchronously, depth-first.
//!
//! # Architecture
//!
//! ```text
//! [Keyboard] ──► [SeqCheck] ──► [Select] ──► [Linebuffer] ──► [Text]
//!                                  ▲                      └──► [Logfile]
//! [Serial] ────────────────────────┘
//!    └──► [Deframer] ──packet──► ...
//! ```
//!
//! # Design
//!
//! - **Enum dispatch on hot path**: `BuiltinNode` enum for all built-in stages.
//! - **Arena graph**: `NodeId` is an index; receiver lists are keyed by `Port`.
//! - **Single consumer**: one dispatcher thread owns the graph; the poller
//!   and UI post events to it over crossbeam channels.

pub mod bridge;
pub mod error;
pub mod executor;
pub mod graph;
pub mod id;
pub mod node;
pub mod nodes;
pub mod poller;
pub mod port;
pub mod runtime;

pub use bridge::{Event, InputHandle, PipelineBridge, RuntimeStats, SinkMessage};
pub use error::{PatternError, PipelineError, PipelineResult};
pub use executor::Dispatcher;
pub use graph::Graph;
pub use id::{NodeId, SenderId};
pub use node::{AnyNode, BuiltinNode, NodeCommand, NodeContext, NodePlugin};
pub use poller::Poller;
pub use port::{Port, PortDescriptor, PortDirection};
pub use runtime::{PipelineBuilder, Runtime};
