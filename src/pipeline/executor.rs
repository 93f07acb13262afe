//! Dispatcher: the single consumer that owns the graph.
//!
//! Every delivery into the graph happens on the dispatcher thread. The
//! poller and the UI only post [`Event`]s, so stage state (matcher cursors,
//! select tables, decoder state) is never touched from two threads.

use crate::pipeline::bridge::{Event, RuntimeStats, SinkMessage};
use crate::pipeline::graph::Graph;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub struct Dispatcher {
    graph: Graph,
    event_rx: Receiver<Event>,
    msg_tx: Sender<SinkMessage>,
    running: Arc<AtomicBool>,
    timeout: Duration,
    stats: RuntimeStats,
}

impl Dispatcher {
    /// The stop flag is the graph's own, so a stage calling
    /// `request_stop` stops the whole runtime.
    pub fn new(
        graph: Graph,
        event_rx: Receiver<Event>,
        msg_tx: Sender<SinkMessage>,
        timeout: Duration,
    ) -> Self {
        let running = graph.running_flag().clone();
        Self {
            graph,
            event_rx,
            msg_tx,
            running,
            timeout,
            stats: RuntimeStats::default(),
        }
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Run until the stop flag clears, a `Shutdown` event arrives, or every
    /// event sender is gone. Returns the graph for teardown.
    pub fn run(mut self) -> Graph {
        tracing::info!(nodes = self.graph.len(), "Dispatcher thread started");

        while self.running.load(Ordering::Acquire) {
            match self.event_rx.recv_timeout(self.timeout) {
                Ok(Event::Shutdown) => break,
                Ok(event) => self.handle(event),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    tracing::debug!("All event senders dropped");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::Release);
        let _ = self.msg_tx.send(SinkMessage::Shutdown);
        tracing::info!(
            events = self.stats.events,
            input_bytes = self.stats.input_bytes,
            polled_bytes = self.stats.polled_bytes,
            "Dispatcher thread exiting"
        );
        self.graph
    }

    /// Apply one event to the graph.
    pub fn handle(&mut self, event: Event) {
        self.stats.events += 1;
        match event {
            Event::Deliver {
                target,
                sender,
                chunk,
            } => {
                self.stats.input_bytes += chunk.len() as u64;
                self.graph.deliver(target, &chunk, &sender);
            }
            Event::Polled { source, chunk } => {
                self.stats.polled_bytes += chunk.len() as u64;
                if let Err(e) = self.graph.emit_from(source, &chunk) {
                    tracing::warn!("Polled chunk dropped: {}", e);
                }
            }
            Event::Command { target, command } => {
                self.stats.commands += 1;
                self.graph.command(target, &command);
            }
            Event::RequestStats => {
                self.stats.dropped_reentrant = self.graph.dropped_reentrant();
                let _ = self.msg_tx.try_send(SinkMessage::Stats(self.stats));
            }
            Event::Shutdown => self.running.store(false, Ordering::Release),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::bridge::PipelineBridge;
    use crate::pipeline::id::SenderId;
    use crate::pipeline::node::NodeCommand;
    use crate::pipeline::nodes::testing::{bytes, capture};
    use crate::pipeline::nodes::{KeyboardNode, SelectNode};

    #[test]
    fn test_events_are_applied_in_order() {
        let mut g = Graph::new();
        let key = g.add(KeyboardNode::new(), "key");
        let sel = g.add(SelectNode::new(true), "sel");
        let (sink, log) = capture();
        let c = g.add(sink, "");
        g.connect(key, sel).unwrap();
        g.connect(sel, c).unwrap();

        let (bridge, event_rx, msg_tx) = PipelineBridge::new(16, 16);
        let d = Dispatcher::new(g, event_rx, msg_tx, Duration::from_millis(5));

        let deliver = |chunk: &[u8]| Event::Deliver {
            target: key,
            sender: SenderId::new("ui"),
            chunk: chunk.to_vec(),
        };
        bridge.event_tx.send(deliver(b"a")).unwrap();
        bridge
            .event_tx
            .send(Event::Command {
                target: sel,
                command: NodeCommand::Disable("key".into()),
            })
            .unwrap();
        bridge.event_tx.send(deliver(b"b")).unwrap();
        bridge.event_tx.send(Event::RequestStats).unwrap();
        bridge.shutdown();

        let graph = d.run();
        assert_eq!(graph.len(), 3);
        assert_eq!(bytes(&log), b"a");

        let msgs = bridge.drain();
        assert!(matches!(
            msgs.first(),
            Some(SinkMessage::Stats(RuntimeStats {
                events: 4,
                input_bytes: 2,
                commands: 1,
                ..
            }))
        ));
        assert!(matches!(msgs.last(), Some(SinkMessage::Shutdown)));
    }

    #[test]
    fn test_exits_when_senders_drop() {
        let (bridge, event_rx, msg_tx) = PipelineBridge::new(1, 1);
        let d = Dispatcher::new(Graph::new(), event_rx, msg_tx, Duration::from_millis(5));
        drop(bridge.event_tx);
        let g = d.run();
        assert!(g.stop_requested());
    }
}
