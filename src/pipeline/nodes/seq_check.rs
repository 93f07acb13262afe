//! SeqCheckNode: watches the stream for control sequences.
//!
//! Holds an ordered list of [`ByteSeq`] matchers fed from one stream. Every
//! byte is fed to every matcher, in list order. A matcher that completes
//! fires its callback and is reset; the others keep their progress.
//!
//! Bytes are forwarded one at a time. A byte is held back when a matcher
//! built with `forward(false)` is partially matched either before or after
//! consuming it, so a silent sequence never reaches the receivers, not even
//! its first byte.

use crate::matcher::ByteSeq;
use crate::pipeline::id::SenderId;
use crate::pipeline::node::{NodeCommand, NodeContext};
use crate::pipeline::port::{Port, PortDescriptor, FILTER_PORTS};

#[derive(Debug, Default)]
pub struct SeqCheckNode {
    seqs: Vec<ByteSeq>,
    suppressed: u64,
    matches: u64,
}

impl SeqCheckNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a matcher. Earlier matchers are fed (and fire) first.
    pub fn with(mut self, seq: ByteSeq) -> Self {
        self.seqs.push(seq);
        self
    }

    pub fn push(&mut self, seq: ByteSeq) {
        self.seqs.push(seq);
    }

    pub fn name(&self) -> &str {
        "SeqCheck"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        FILTER_PORTS
    }

    pub fn seqs(&self) -> &[ByteSeq] {
        &self.seqs
    }

    /// Bytes held back so far.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    pub fn matches(&self) -> u64 {
        self.matches
    }

    pub fn deliver(&mut self, chunk: &[u8], _sender: &SenderId, ctx: &mut NodeContext<'_>) {
        for &byte in chunk {
            let mut suppress = false;
            for (index, seq) in self.seqs.iter_mut().enumerate() {
                let engaged_before = seq.is_engaged();
                let hit = seq.feed(byte);
                if !seq.forwards() && (engaged_before || seq.is_engaged()) {
                    suppress = true;
                }
                if hit {
                    self.matches += 1;
                    tracing::debug!(index, got = ?seq.got(), "Sequence matched");
                    seq.fire(index, ctx);
                    seq.reset();
                }
            }

            if suppress {
                self.suppressed += 1;
            } else {
                ctx.emit(Port::Default, &[byte]);
            }
        }
    }

    pub fn on_command(&mut self, command: &NodeCommand) -> bool {
        match command {
            NodeCommand::Reset => {
                self.seqs.iter_mut().for_each(ByteSeq::reset);
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
    use crate::pipeline::id::NodeId;
    use crate::pipeline::nodes::testing::{bytes, capture, chunks, Captured};
    use std::sync::{Arc, Mutex};

    type Hits = Arc<Mutex<Vec<(usize, Vec<u8>)>>>;

    fn recording(pattern: &[u8], forward: bool, hits: &Hits) -> ByteSeq {
        let hits = hits.clone();
        ByteSeq::new(pattern)
            .unwrap()
            .forward(forward)
            .on_match(move |m, _ctx| hits.lock().unwrap().push((m.index, m.got.to_vec())))
    }

    fn wire(node: SeqCheckNode) -> (Graph, NodeId, Captured) {
        let mut g = Graph::new();
        let sc = g.add(node, "sc");
        let (sink, log) = capture();
        let c = g.add(sink, "");
        g.connect(sc, c).unwrap();
        (g, sc, log)
    }

    fn escape_pair(hits: &Hits) -> SeqCheckNode {
        SeqCheckNode::new()
            .with(recording(b"\x1b\x1b", false, hits))
            .with(recording(b"\x1bb[x-z]", true, hits))
    }

    #[test]
    fn test_double_escape_is_silent() {
        let hits = Hits::default();
        let (mut g, sc, log) = wire(escape_pair(&hits));
        g.deliver(sc, &[27, 27], &SenderId::new("key"));
        assert!(bytes(&log).is_empty());
        assert_eq!(*hits.lock().unwrap(), vec![(0, vec![])]);
    }

    #[test]
    fn test_class_sequence_forwards_final_byte() {
        let hits = Hits::default();
        let (mut g, sc, log) = wire(escape_pair(&hits));
        g.deliver(sc, &[27, b'b', b'y'], &SenderId::new("key"));
        assert_eq!(bytes(&log), b"y");
        assert_eq!(*hits.lock().unwrap(), vec![(1, b"y".to_vec())]);
    }

    #[test]
    fn test_plain_bytes_forward_one_at_a_time() {
        let hits = Hits::default();
        let (mut g, sc, log) = wire(escape_pair(&hits));
        g.deliver(sc, b"hi", &SenderId::anonymous());
        assert_eq!(chunks(&log), vec![b"h".to_vec(), b"i".to_vec()]);
        assert!(hits.lock().unwrap().is_empty());
    }

    #[test]
    fn test_match_resets_only_matched_pattern() {
        let hits = Hits::default();
        let node = SeqCheckNode::new()
            .with(recording(b"ab", true, &hits))
            .with(recording(b"abc", true, &hits));
        let (mut g, sc, _log) = wire(node);
        g.deliver(sc, b"abc", &SenderId::anonymous());
        let got: Vec<usize> = hits.lock().unwrap().iter().map(|(i, _)| *i).collect();
        assert_eq!(got, vec![0, 1]);
    }

    #[test]
    fn test_partial_state_survives_chunk_boundary() {
        let hits = Hits::default();
        let (mut g, sc, log) = wire(escape_pair(&hits));
        g.deliver(sc, &[27], &SenderId::anonymous());
        g.deliver(sc, &[27], &SenderId::anonymous());
        assert!(bytes(&log).is_empty());
        assert_eq!(hits.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_reset_command_forgets_progress() {
        let hits = Hits::default();
        let (mut g, sc, _log) = wire(escape_pair(&hits));
        g.deliver(sc, &[27], &SenderId::anonymous());
        assert!(g.command(sc, &NodeCommand::Reset));
        g.deliver(sc, &[27], &SenderId::anonymous());
        assert!(hits.lock().unwrap().is_empty());
    }

    #[test]
    fn test_payload_reaches_callback() {
        let seen = Arc::new(Mutex::new(None));
        let seen2 = seen.clone();
        let seq = ByteSeq::new(b"!q")
            .unwrap()
            .with_payload("quit")
            .on_match(move |m, _| *seen2.lock().unwrap() = m.payload::<&str>().copied());
        let (mut g, sc, _log) = wire(SeqCheckNode::new().with(seq));
        g.deliver(sc, b"!q", &SenderId::anonymous());
        assert_eq!(*seen.lock().unwrap(), Some("quit"));
    }
}
