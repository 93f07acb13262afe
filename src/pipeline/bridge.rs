//! Thread boundary between the outside world and the dispatcher.
//!
//! Everything that wants to touch the graph (polled reads, key input,
//! commands) is posted as an [`Event`] to the one dispatcher thread that owns
//! it. Output for the UI comes back as [`SinkMessage`]s.

use crate::backend::display::Color;
use crate::error::{MultitermError, Result};
use crate::pipeline::id::{NodeId, SenderId};
use crate::pipeline::node::NodeCommand;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Work for the dispatcher.
#[derive(Debug, Clone)]
pub enum Event {
    /// Deliver `chunk` to `target` as if `sender` had forwarded it.
    Deliver {
        target: NodeId,
        sender: SenderId,
        chunk: Vec<u8>,
    },
    /// A pollable source produced `chunk`; forward it from `source`.
    Polled { source: NodeId, chunk: Vec<u8> },
    /// Reconfigure a stage.
    Command {
        target: NodeId,
        command: NodeCommand,
    },
    /// Ask for a [`SinkMessage::Stats`].
    RequestStats,
    /// Stop the dispatcher.
    Shutdown,
}

/// Counters kept by the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub events: u64,
    pub input_bytes: u64,
    pub polled_bytes: u64,
    pub commands: u64,
    pub dropped_reentrant: u64,
}

/// Messages from the dispatcher thread to the UI thread.
#[derive(Debug, Clone)]
pub enum SinkMessage {
    /// Coloured text from a text stage wired to a [`ChannelDisplay`](crate::backend::ChannelDisplay).
    Text { color: Color, bytes: Vec<u8> },
    /// Response to [`Event::RequestStats`].
    Stats(RuntimeStats),
    /// The dispatcher has exited.
    Shutdown,
}

/// UI-side handle for the dispatcher.
pub struct PipelineBridge {
    pub event_tx: Sender<Event>,
    pub msg_rx: Receiver<SinkMessage>,
}

impl PipelineBridge {
    /// Create a bridge pair: `(bridge_for_ui, event_rx, msg_tx)`.
    ///
    /// The dispatcher owns `event_rx` and `msg_tx`.
    pub fn new(
        event_capacity: usize,
        message_capacity: usize,
    ) -> (Self, Receiver<Event>, Sender<SinkMessage>) {
        let (event_tx, event_rx) = bounded(event_capacity.max(1));
        let (msg_tx, msg_rx) = bounded(message_capacity.max(1));
        (Self { event_tx, msg_rx }, event_rx, msg_tx)
    }

    /// Drain all pending messages.
    pub fn drain(&self) -> Vec<SinkMessage> {
        self.msg_rx.try_iter().collect()
    }

    pub fn try_recv(&self) -> Option<SinkMessage> {
        self.msg_rx.try_recv().ok()
    }

    /// Wait up to `timeout` for a message. `None` on timeout or once the
    /// dispatcher is gone and the queue is empty.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SinkMessage> {
        match self.msg_rx.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn send_command(&self, target: NodeId, command: NodeCommand) -> bool {
        self.event_tx
            .send(Event::Command { target, command })
            .is_ok()
    }

    pub fn request_stats(&self) {
        let _ = self.event_tx.send(Event::RequestStats);
    }

    pub fn shutdown(&self) {
        let _ = self.event_tx.send(Event::Shutdown);
    }
}

/// Single-owner handle for the keyboard entry stage.
///
/// Built once by the wiring code and passed to whatever reads the keys.
/// Deliberately not `Clone`.
pub struct InputHandle {
    tx: Sender<Event>,
    target: NodeId,
    sender: SenderId,
}

impl InputHandle {
    pub(crate) fn new(tx: Sender<Event>, target: NodeId, sender: SenderId) -> Self {
        Self { tx, target, sender }
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Queue key bytes for the entry stage. Empty input is ignored.
    pub fn send(&self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.tx
            .send(Event::Deliver {
                target: self.target,
                sender: self.sender.clone(),
                chunk: bytes.to_vec(),
            })
            .map_err(|_| MultitermError::Channel("dispatcher has stopped".into()))
    }
}
