//! Poller: background read loop over pollable sources.
//!
//! Reads each source once per pass without blocking and posts non-empty
//! reads to the dispatcher. It never delivers into the graph itself.

use crate::backend::transport::{lock_transport, SharedTransport};
use crate::pipeline::bridge::Event;
use crate::pipeline::id::NodeId;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct Poller {
    sources: Vec<Source>,
    event_tx: Sender<Event>,
    running: Arc<AtomicBool>,
    idle: Duration,
}

struct Source {
    id: NodeId,
    transport: SharedTransport,
    failing: bool,
}

impl Poller {
    /// `idle` is slept after a pass that read nothing. Zero spins.
    pub fn new(
        sources: Vec<(NodeId, SharedTransport)>,
        event_tx: Sender<Event>,
        running: Arc<AtomicBool>,
        idle: Duration,
    ) -> Self {
        let sources = sources
            .into_iter()
            .map(|(id, transport)| Source {
                id,
                transport,
                failing: false,
            })
            .collect();
        Self {
            sources,
            event_tx,
            running,
            idle,
        }
    }

    pub fn run(mut self) {
        tracing::info!(sources = self.sources.len(), "Poller thread started");

        while self.running.load(Ordering::Acquire) {
            match self.pass() {
                Some(0) if !self.idle.is_zero() => std::thread::sleep(self.idle),
                Some(0) => std::hint::spin_loop(),
                Some(_) => {}
                None => {
                    tracing::debug!("Dispatcher gone");
                    break;
                }
            }
        }

        tracing::info!("Poller thread exiting");
    }

    /// One read of every source. Returns the bytes posted, or `None` once
    /// the dispatcher has stopped listening.
    pub fn pass(&mut self) -> Option<usize> {
        let mut total = 0;
        for source in &mut self.sources {
            let read = lock_transport(&source.transport).read();
            match read {
                Ok(chunk) => {
                    if source.failing {
                        tracing::info!(source = %source.id, "Source recovered");
                        source.failing = false;
                    }
                    if chunk.is_empty() {
                        continue;
                    }
                    total += chunk.len();
                    let event = Event::Polled {
                        source: source.id,
                        chunk,
                    };
                    if self.event_tx.send(event).is_err() {
                        return None;
                    }
                }
                Err(e) => {
                    if !source.failing {
                        tracing::warn!(source = %source.id, "Read failed: {}", e);
                        source.failing = true;
                    }
                }
            }
        }
        Some(total)
    }
}
