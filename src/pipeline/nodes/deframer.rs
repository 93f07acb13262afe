//! DeframerNode: splits a stream into raw bytes and packets.
//!
//! Raw bytes go out on [`Port::Default`], completed packets on
//! [`Port::Packet`], in stream order. Malformed frames are dropped by the
//! decoder and counted in its stats.

use crate::codec::{Decoded, DecoderStats, FrameDecoder};
use crate::pipeline::id::SenderId;
use crate::pipeline::node::{NodeCommand, NodeContext};
use crate::pipeline::port::{Port, PortDescriptor};

static PORTS: &[PortDescriptor] = &[
    PortDescriptor::input(Port::Default),
    PortDescriptor::output(Port::Default),
    PortDescriptor::output(Port::Packet),
];

#[derive(Debug, Default)]
pub struct DeframerNode {
    decoder: FrameDecoder,
    out: Vec<Decoded>,
}

impl DeframerNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        "Deframer"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        PORTS
    }

    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }

    pub fn deliver(&mut self, chunk: &[u8], _sender: &SenderId, ctx: &mut NodeContext<'_>) {
        self.decoder.push(chunk, &mut self.out);
        for item in self.out.drain(..) {
            match item {
                Decoded::Raw(bytes) => ctx.emit(Port::Default, &bytes),
                Decoded::Packet(bytes) => ctx.emit(Port::Packet, &bytes),
            }
        }
    }

    pub fn on_command(&mut self, command: &NodeCommand) -> bool {
        match command {
            NodeCommand::Reset => {
                self.decoder.reset();
                true
            }
            _ => false,
        }
    }
}
