//! HexNode: forwards a hex dump of every chunk.

use crate::pipeline::id::SenderId;
use crate::pipeline::node::NodeContext;
use crate::pipeline::port::{Port, PortDescriptor, FILTER_PORTS};
use crate::util::hex_render;

#[derive(Debug, Default)]
pub struct HexNode;

impl HexNode {
    pub fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &str {
        "Hex"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        FILTER_PORTS
    }

    pub fn deliver(&mut self, chunk: &[u8], _sender: &SenderId, ctx: &mut NodeContext<'_>) {
        ctx.emit(Port::Default, &hex_render(chunk));
    }
}
