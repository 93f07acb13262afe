//! SerialNode: a byte device in the graph.
//!
//! Delivered chunks are written to the transport synchronously. Reads happen
//! elsewhere: the poller (or [`Graph::poll`](crate::pipeline::Graph::poll))
//! reads the transport and forwards what arrived from this stage.

use crate::backend::transport::{lock_transport, shared, SharedTransport, Transport};
use crate::pipeline::id::SenderId;
use crate::pipeline::node::NodeContext;
use crate::pipeline::port::{PortDescriptor, FILTER_PORTS};

pub struct SerialNode {
    transport: SharedTransport,
    write_errors: u64,
}

impl SerialNode {
    pub fn new(transport: SharedTransport) -> Self {
        Self {
            transport,
            write_errors: 0,
        }
    }

    /// Wrap an unshared transport.
    pub fn from_transport<T: Transport + 'static>(transport: T) -> Self {
        Self::new(shared(transport))
    }

    pub fn name(&self) -> &str {
        "Serial"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        FILTER_PORTS
    }

    pub fn transport(&self) -> SharedTransport {
        self.transport.clone()
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    pub fn deliver(&mut self, chunk: &[u8], sender: &SenderId, _ctx: &mut NodeContext<'_>) {
        if let Err(e) = lock_transport(&self.transport).write(chunk) {
            self.write_errors += 1;
            tracing::warn!(%sender, len = chunk.len(), "Serial write failed: {}", e);
        }
    }
}
