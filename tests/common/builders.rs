//! Stages and graphs for tests

use multiterm_rs::pipeline::port::SINK_PORTS;
use multiterm_rs::pipeline::{AnyNode, NodeContext, NodePlugin, PortDescriptor, SenderId};
use std::sync::{Arc, Mutex};

/// Sink that records every chunk it receives with its sender.
#[derive(Clone, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stage feeding this recorder. Every call makes a new stage sharing
    /// the same log.
    pub fn node(&self) -> AnyNode {
        AnyNode::plugin(RecorderNode(self.clone()))
    }

    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.log.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.chunks().concat()
    }

    pub fn senders(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct RecorderNode(Recorder);

impl NodePlugin for RecorderNode {
    fn name(&self) -> &str {
        "Recorder"
    }

    fn ports(&self) -> &[PortDescriptor] {
        SINK_PORTS
    }

    fn deliver(&mut self, chunk: &[u8], sender: &SenderId, _ctx: &mut NodeContext<'_>) {
        self.0
            .log
            .lock()
            .unwrap()
            .push((sender.to_string(), chunk.to_vec()));
    }
}
