//! Devices at the edges of the node graph.
//!
//! - [`Transport`] - non-blocking byte device behind a serial stage
//! - [`MemoryTransport`] - in-process transport pair, for loopback and tests
//! - [`DisplaySink`] - coloured text output for text stages
//! - [`AnsiDisplay`] / [`ChannelDisplay`] - terminal and cross-thread displays

pub mod display;
pub mod transport;

pub use display::{AnsiDisplay, ChannelDisplay, Color, DisplaySink};
pub use transport::{lock_transport, shared, MemoryTransport, SharedTransport, Transport};
