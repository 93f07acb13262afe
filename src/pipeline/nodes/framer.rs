//! FramerNode: wraps every chunk in a frame.

use crate::codec::frame;
use crate::pipeline::id::SenderId;
use crate::pipeline::node::NodeContext;
use crate::pipeline::port::{Port, PortDescriptor, FILTER_PORTS};

#[derive(Debug, Default)]
pub struct FramerNode {
    buf: Vec<u8>,
    oversize: u64,
}

impl FramerNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        "Framer"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        FILTER_PORTS
    }

    /// Chunks dropped for exceeding the frame length limit.
    pub fn oversize(&self) -> u64 {
        self.oversize
    }

    pub fn deliver(&mut self, chunk: &[u8], sender: &SenderId, ctx: &mut NodeContext<'_>) {
        self.buf.clear();
        match frame::encode_into(chunk, &mut self.buf) {
            Ok(()) => ctx.emit(Port::Default, &self.buf),
            Err(e) => {
                self.oversize += 1;
                tracing::warn!(%sender, "Chunk not framed: {}", e);
            }
        }
    }
}
