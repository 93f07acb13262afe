//! # multiterm-rs: composable byte-stream pipeline
//!
//! A terminal for several serial ports at once, built from small stages:
//! keyboard input, serial devices, control-sequence detection, per-source
//! routing, line buffering, hex dumps, log files, and a length/checksum
//! framing codec that carries packets alongside plain text on one wire.
//!
//! ## Architecture
//!
//! - **Pipeline**: an arena graph of stages with synchronous, depth-first delivery
//! - **Matcher**: incremental byte-pattern matching for control sequences
//! - **Codec**: escape-based framing, decoded incrementally across chunks
//! - **Backend**: transports and display sinks at the graph's edges
//! - **Runtime**: a poller thread and a single dispatcher thread joined by
//!   crossbeam channels
//!
//! ## Example
//!
//! ```ignore
//! use multiterm_rs::{
//!     backend::{AnsiDisplay, Color},
//!     config::AppConfig,
//!     matcher::ByteSeq,
//!     pipeline::{nodes::*, Graph, Runtime},
//! };
//!
//! let mut graph = Graph::new();
//! let key = graph.add(KeyboardNode::new(), "key");
//! let quit = ByteSeq::new(b"\x1b\x1b")?
//!     .forward(false)
//!     .on_match(|_, ctx| ctx.request_stop());
//! let check = graph.add(SeqCheckNode::new().with(quit), "check");
//! let text = graph.add(TextNode::new(Color::WHITE, AnsiDisplay::stdout()), "");
//! graph.connect(key, check)?;
//! graph.connect(check, text)?;
//!
//! let runtime = Runtime::start(graph, &AppConfig::default().runtime)?;
//! let input = runtime.input(key, "keyboard");
//! input.send(b"hello\n")?;
//! runtime.wait()?;
//! ```

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod util;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{MultitermError, Result, ResultExt};
pub use matcher::ByteSeq;
pub use pipeline::{Graph, NodeCommand, NodeId, Port, Runtime, SenderId};
