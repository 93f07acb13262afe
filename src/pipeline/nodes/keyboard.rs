//! KeyboardNode: entry point for key bytes from the UI.
//!
//! Exactly one keyboard stage is wired by the application and fed through
//! the runtime's `InputHandle`. It forwards every chunk unchanged, stamped
//! with its own identity.

use crate::pipeline::id::SenderId;
use crate::pipeline::node::NodeContext;
use crate::pipeline::port::{Port, PortDescriptor, FILTER_PORTS};

#[derive(Debug, Default)]
pub struct KeyboardNode {
    keys: u64,
}

impl KeyboardNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        "Keyboard"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        FILTER_PORTS
    }

    /// Key bytes seen so far.
    pub fn keys(&self) -> u64 {
        self.keys
    }

    pub fn deliver(&mut self, chunk: &[u8], _sender: &SenderId, ctx: &mut NodeContext<'_>) {
        self.keys += chunk.len() as u64;
        ctx.emit(Port::Default, chunk);
    }
}
