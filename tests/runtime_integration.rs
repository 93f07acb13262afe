//! The threaded runtime driving a terminal-like graph end to end.

mod common;

use common::builders::Recorder;
use common::mock_helpers::{collect_text, wait_until};
use common::{fast_runtime, test_timeout};
use multiterm_rs::backend::{Color, MemoryTransport, Transport};
use multiterm_rs::matcher::ByteSeq;
use multiterm_rs::pipeline::nodes::{
    DeframerNode, FramerNode, KeyboardNode, LinebufferNode, SelectNode, SeqCheckNode, SerialNode,
    TextNode,
};
use multiterm_rs::pipeline::{PipelineBuilder, SinkMessage};
use multiterm_rs::{Graph, NodeCommand, Port, Runtime};

const ESC: u8 = 0x1b;

/// keyboard → check → framer → ser1 ⇄ device; ser1 → deframer → display
#[test]
fn test_loopback_through_framing() {
    let builder = PipelineBuilder::new(&fast_runtime());
    let (near, far) = MemoryTransport::pair();

    let mut g = Graph::new();
    let key = g.add(KeyboardNode::new(), "keyboard");
    let check = g.add(
        SeqCheckNode::new().with(
            ByteSeq::new(&[ESC, ESC])
                .unwrap()
                .forward(false)
                .on_match(|_, ctx| ctx.request_stop()),
        ),
        "check",
    );
    let lines = g.add(LinebufferNode::new(), "lines");
    let framer = g.add(FramerNode::new(), "framer");
    let ser = g.add(SerialNode::from_transport(near), "ser1");
    let device = g.add(SerialNode::from_transport(far), "device");
    let deframer = g.add(DeframerNode::new(), "deframer");
    let text = g.add(TextNode::new(Color::GREEN, builder.display()), "");

    g.connect(key, check).unwrap();
    g.connect(check, lines).unwrap();
    g.connect(lines, framer).unwrap();
    g.connect(framer, ser).unwrap();
    g.connect(device, device).unwrap();
    g.connect(ser, deframer).unwrap();
    g.connect_port(deframer, Port::Packet, text).unwrap();

    let rt = builder.start(g).unwrap();
    let input = rt.input(key, "stdin");
    input.send(b"hel").unwrap();
    input.send(b"lo\n").unwrap();

    let got = collect_text(rt.bridge(), 6, test_timeout());
    let text: Vec<u8> = got.iter().flat_map(|(_, b)| b.clone()).collect();
    assert_eq!(text, b"hello\n");
    assert!(got.iter().all(|(c, _)| *c == Color::GREEN));

    input.send(&[ESC, ESC]).unwrap();
    let graph = rt.wait().unwrap();
    assert!(graph.stop_requested());
}

#[test]
fn test_commands_reach_stages() {
    let (dev, mut peer) = MemoryTransport::pair();
    let rec = Recorder::new();

    let mut g = Graph::new();
    let ser = g.add(SerialNode::from_transport(dev), "ser1");
    let select = g.add(SelectNode::new(true), "view");
    let out = g.add(rec.node(), "");
    g.connect(ser, select).unwrap();
    g.connect(select, out).unwrap();

    let rt = Runtime::start(g, &fast_runtime()).unwrap();

    peer.write(b"one").unwrap();
    assert!(wait_until(test_timeout(), || rec.bytes() == b"one"));

    rt.command(select, NodeCommand::Disable("ser1".into())).unwrap();
    peer.write(b"two").unwrap();
    assert!(wait_until(test_timeout(), || polled_bytes(&rt) >= 6));

    rt.command(select, NodeCommand::Enable("ser1".into())).unwrap();
    peer.write(b"three").unwrap();
    assert!(wait_until(test_timeout(), || rec.bytes().ends_with(b"three")));

    rt.shutdown().unwrap();
    assert_eq!(rec.bytes(), b"onethree");
}

/// Bytes the dispatcher has taken from pollable sources so far.
fn polled_bytes(rt: &Runtime) -> u64 {
    rt.bridge().request_stats();
    while let Some(msg) = rt.bridge().recv_timeout(test_timeout()) {
        if let SinkMessage::Stats(stats) = msg {
            return stats.polled_bytes;
        }
    }
    0
}

#[test]
fn test_stats_and_shutdown_messages() {
    let rt = Runtime::start(Graph::new(), &fast_runtime()).unwrap();
    rt.bridge().request_stats();
    let stats = rt.bridge().recv_timeout(test_timeout());
    assert!(matches!(stats, Some(SinkMessage::Stats(_))));

    let rx = rt.bridge().msg_rx.clone();
    rt.shutdown().unwrap();
    assert!(rx.try_iter().any(|m| matches!(m, SinkMessage::Shutdown)));
}
