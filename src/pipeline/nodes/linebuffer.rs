//! LinebufferNode: holds bytes back until a line is complete.
//!
//! Everything up to and including the last `\n` of the buffer is forwarded
//! as one chunk; the tail waits for the next delivery. A tail that reaches
//! the size limit without a newline is forwarded as it is.

use crate::pipeline::id::SenderId;
use crate::pipeline::node::{NodeCommand, NodeContext};
use crate::pipeline::port::{Port, PortDescriptor, FILTER_PORTS};
use crate::util::last_index_of;

/// Default cap on bytes held back waiting for a newline.
pub const DEFAULT_LINE_LIMIT: usize = 4096;

#[derive(Debug)]
pub struct LinebufferNode {
    buf: Vec<u8>,
    limit: usize,
}

impl Default for LinebufferNode {
    fn default() -> Self {
        Self {
            buf: Vec::new(),
            limit: DEFAULT_LINE_LIMIT,
        }
    }
}

impl LinebufferNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flush a newline-free tail once it holds `limit` bytes (at least 1).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn name(&self) -> &str {
        "Linebuffer"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        FILTER_PORTS
    }

    /// Bytes waiting for a newline.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    pub fn deliver(&mut self, chunk: &[u8], _sender: &SenderId, ctx: &mut NodeContext<'_>) {
        self.buf.extend_from_slice(chunk);
        if let Some(pos) = last_index_of(&self.buf, b'\n') {
            let rest = self.buf.split_off(pos + 1);
            let line = std::mem::replace(&mut self.buf, rest);
            ctx.emit(Port::Default, &line);
        }
        if self.buf.len() >= self.limit {
            tracing::debug!(len = self.buf.len(), "Line limit reached, flushing");
            let tail = std::mem::take(&mut self.buf);
            ctx.emit(Port::Default, &tail);
        }
    }

    pub fn on_command(&mut self, command: &NodeCommand) -> bool {
        match command {
            NodeCommand::Reset => {
                self.buf.clear();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::graph::Graph;
    use crate::pipeline::nodes::testing::{capture, chunks};

    #[test]
    fn test_forwards_through_last_newline() {
        let mut g = Graph::new();
        let lb = g.add(LinebufferNode::new(), "lb");
        let (sink, log) = capture();
        let c = g.add(sink, "");
        g.connect(lb, c).unwrap();

        let s = SenderId::anonymous();
        g.deliver(lb, b"ab", &s);
        assert!(chunks(&log).is_empty());
        g.deliver(lb, b"c\nde\nf", &s);
        g.deliver(lb, b"g\n", &s);
        assert_eq!(chunks(&log), vec![b"abc\nde\n".to_vec(), b"fg\n".to_vec()]);
    }

    #[test]
    fn test_long_line_is_flushed_at_limit() {
        let mut g = Graph::new();
        let lb = g.add(LinebufferNode::new().with_limit(4), "lb");
        let (sink, log) = capture();
        let c = g.add(sink, "");
        g.connect(lb, c).unwrap();

        let s = SenderId::anonymous();
        g.deliver(lb, b"abc", &s);
        assert!(chunks(&log).is_empty());
        g.deliver(lb, b"defg", &s);
        g.deliver(lb, b"h\ni", &s);
        assert_eq!(chunks(&log), vec![b"abcdefg".to_vec(), b"h\n".to_vec()]);
    }

    #[test]
    fn test_reset_drops_tail() {
        let mut g = Graph::new();
        let lb = g.add(LinebufferNode::new(), "lb");
        let (sink, log) = capture();
        let c = g.add(sink, "");
        g.connect(lb, c).unwrap();

        g.deliver(lb, b"junk", &SenderId::anonymous());
        assert!(g.command(lb, &NodeCommand::Reset));
        g.deliver(lb, b"x\n", &SenderId::anonymous());
        assert_eq!(chunks(&log), vec![b"x\n".to_vec()]);
    }
}
