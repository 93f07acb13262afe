//! Built-in stage implementations.

pub mod deframer;
pub mod framer;
pub mod hex;
pub mod keyboard;
pub mod linebuffer;
pub mod logfile;
pub mod map;
pub mod select;
pub mod seq_check;
pub mod serial;
pub mod text;

pub use deframer::DeframerNode;
pub use framer::FramerNode;
pub use hex::HexNode;
pub use keyboard::KeyboardNode;
pub use linebuffer::LinebufferNode;
pub use logfile::LogfileNode;
pub use map::MapNode;
pub use select::SelectNode;
pub use seq_check::SeqCheckNode;
pub use serial::SerialNode;
pub use text::TextNode;

#[cfg(test)]
pub(crate) mod testing {
    //! A recording sink for stage tests.

    use crate::pipeline::id::SenderId;
    use crate::pipeline::node::{AnyNode, NodeContext, NodePlugin};
    use crate::pipeline::port::{PortDescriptor, SINK_PORTS};
    use std::sync::{Arc, Mutex};

    pub type Captured = Arc<Mutex<Vec<(String, Vec<u8>)>>>;

    pub struct Capture(pub Captured);

    impl NodePlugin for Capture {
        fn name(&self) -> &str {
            "Capture"
        }

        fn ports(&self) -> &[PortDescriptor] {
            SINK_PORTS
        }

        fn deliver(&mut self, chunk: &[u8], sender: &SenderId, _ctx: &mut NodeContext<'_>) {
            self.0
                .lock()
                .unwrap()
                .push((sender.to_string(), chunk.to_vec()));
        }
    }

    pub fn capture() -> (AnyNode, Captured) {
        let log = Captured::default();
        (AnyNode::plugin(Capture(log.clone())), log)
    }

    /// Concatenation of every captured chunk.
    pub fn bytes(log: &Captured) -> Vec<u8> {
        log.lock()
            .unwrap()
            .iter()
            .flat_map(|(_, c)| c.iter().copied())
            .collect()
    }

    pub fn chunks(log: &Captured) -> Vec<Vec<u8>> {
        log.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }
}
