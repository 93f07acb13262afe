//! MapNode: applies a byte function to every byte it forwards.

use crate::pipeline::id::SenderId;
use crate::pipeline::node::NodeContext;
use crate::pipeline::port::{Port, PortDescriptor, FILTER_PORTS};

pub struct MapNode {
    f: Box<dyn FnMut(u8) -> u8 + Send>,
}

impl MapNode {
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(u8) -> u8 + Send + 'static,
    {
        Self { f: Box::new(f) }
    }

    pub fn name(&self) -> &str {
        "Map"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        FILTER_PORTS
    }

    pub fn deliver(&mut self, chunk: &[u8], _sender: &SenderId, ctx: &mut NodeContext<'_>) {
        let mapped: Vec<u8> = chunk.iter().map(|&b| (self.f)(b)).collect();
        ctx.emit(Port::Default, &mapped);
    }
}
