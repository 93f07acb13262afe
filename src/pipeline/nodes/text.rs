//! TextNode: hands every chunk to a display in one colour.

use crate::backend::display::{Color, DisplaySink};
use crate::pipeline::id::SenderId;
use crate::pipeline::node::NodeContext;
use crate::pipeline::port::{PortDescriptor, SINK_PORTS};

pub struct TextNode {
    color: Color,
    sink: Box<dyn DisplaySink>,
}

impl TextNode {
    pub fn new(color: Color, sink: impl DisplaySink + 'static) -> Self {
        Self {
            color,
            sink: Box::new(sink),
        }
    }

    pub fn name(&self) -> &str {
        "Text"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        SINK_PORTS
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn deliver(&mut self, chunk: &[u8], _sender: &SenderId, _ctx: &mut NodeContext<'_>) {
        self.sink.append(self.color, chunk);
    }
}
