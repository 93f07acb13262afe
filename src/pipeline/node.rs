//! Node abstraction for the pipeline.
//!
//! Two-layer design:
//! - **`NodePlugin` trait**: for user-defined stages.
//! - **`BuiltinNode` enum**: for all built-in stages. The compiler can inline
//!   match arms, eliminating dynamic dispatch on the per-byte hot path.
//!
//! `AnyNode` wraps either variant so the graph can handle both uniformly.
//!
//! Every stage implements the same contract: `deliver(chunk, sender, ctx)`
//! consumes a chunk tagged with the identity of whoever sent it, and forwards
//! results through [`NodeContext::emit`], which stamps them with the stage's
//! own identity.

use crate::backend::transport::SharedTransport;
use crate::pipeline::graph::Graph;
use crate::pipeline::id::{NodeId, SenderId};
use crate::pipeline::port::{Port, PortDescriptor};
use std::sync::atomic::Ordering;

/// Runtime reconfiguration of a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeCommand {
    /// Let chunks from this sender through a select stage.
    Enable(String),
    /// Drop chunks from this sender at a select stage.
    Disable(String),
    /// Verdict of a select stage for senders it has no entry for.
    SetDefault(bool),
    /// Forget buffered bytes and partial matches.
    Reset,
}

/// Handle a stage uses while it runs: forwarding, commanding other stages,
/// and stopping the runtime.
pub struct NodeContext<'a> {
    pub(crate) graph: &'a mut Graph,
    pub(crate) current: NodeId,
}

impl<'a> NodeContext<'a> {
    pub(crate) fn new(graph: &'a mut Graph, current: NodeId) -> Self {
        Self { graph, current }
    }

    /// The running stage.
    pub fn id(&self) -> NodeId {
        self.current
    }

    /// Identity stamped on everything this stage forwards.
    pub fn sender(&self) -> &SenderId {
        self.graph.sender(self.current)
    }

    /// Forward `bytes` to every receiver registered under `port`, in
    /// registration order, before returning.
    ///
    /// Empty chunks are never forwarded on the default channel. The packet
    /// channel delivers them, since an empty frame is still a packet.
    pub fn emit(&mut self, port: Port, bytes: &[u8]) {
        if bytes.is_empty() && port == Port::Default {
            return;
        }
        let sender = self.graph.sender(self.current).clone();
        let targets = self.graph.receivers(self.current, port);
        for target in targets {
            self.graph.deliver(target, bytes, &sender);
        }
    }

    /// Apply a command to a stage.
    ///
    /// A stage that is still running (this one, or one upstream of it) gets
    /// the command once its current delivery returns. Returns false if the
    /// target does not exist or ignores the command.
    pub fn command(&mut self, target: NodeId, command: NodeCommand) -> bool {
        self.graph.command(target, &command)
    }

    /// Ask the runtime to shut down once the current event is handled.
    pub fn request_stop(&mut self) {
        tracing::info!(node = %self.current, "Stop requested by node");
        self.graph.running_flag().store(false, Ordering::Release);
    }
}

/// Trait for pluggable/user-defined stages.
pub trait NodePlugin: Send {
    /// Human-readable name of this stage.
    fn name(&self) -> &str;

    /// Port descriptors for this stage.
    fn ports(&self) -> &[PortDescriptor] {
        crate::pipeline::port::FILTER_PORTS
    }

    /// Consume a chunk from `sender`.
    fn deliver(&mut self, chunk: &[u8], sender: &SenderId, ctx: &mut NodeContext<'_>);

    /// Called for runtime reconfiguration. Returns whether it was handled.
    fn on_command(&mut self, _command: &NodeCommand) -> bool {
        false
    }

    /// Transport to read from if this stage is a pollable source.
    fn poll_handle(&self) -> Option<SharedTransport> {
        None
    }
}

// Built-in stage types (defined in nodes/ submodule).
use crate::pipeline::nodes::{
    DeframerNode, FramerNode, HexNode, KeyboardNode, LinebufferNode, LogfileNode, MapNode,
    SelectNode, SeqCheckNode, SerialNode, TextNode,
};

/// Enum dispatch for built-in stages.
pub enum BuiltinNode {
    Keyboard(KeyboardNode),
    Serial(SerialNode),
    Text(TextNode),
    Logfile(LogfileNode),
    Linebuffer(LinebufferNode),
    Hex(HexNode),
    SeqCheck(SeqCheckNode),
    Select(SelectNode),
    Framer(FramerNode),
    Deframer(DeframerNode),
    Map(MapNode),
}

impl BuiltinNode {
    pub fn name(&self) -> &str {
        match self {
            BuiltinNode::Keyboard(n) => n.name(),
            BuiltinNode::Serial(n) => n.name(),
            BuiltinNode::Text(n) => n.name(),
            BuiltinNode::Logfile(n) => n.name(),
            BuiltinNode::Linebuffer(n) => n.name(),
            BuiltinNode::Hex(n) => n.name(),
            BuiltinNode::SeqCheck(n) => n.name(),
            BuiltinNode::Select(n) => n.name(),
            BuiltinNode::Framer(n) => n.name(),
            BuiltinNode::Deframer(n) => n.name(),
            BuiltinNode::Map(n) => n.name(),
        }
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        match self {
            BuiltinNode::Keyboard(n) => n.ports(),
            BuiltinNode::Serial(n) => n.ports(),
            BuiltinNode::Text(n) => n.ports(),
            BuiltinNode::Logfile(n) => n.ports(),
            BuiltinNode::Linebuffer(n) => n.ports(),
            BuiltinNode::Hex(n) => n.ports(),
            BuiltinNode::SeqCheck(n) => n.ports(),
            BuiltinNode::Select(n) => n.ports(),
            BuiltinNode::Framer(n) => n.ports(),
            BuiltinNode::Deframer(n) => n.ports(),
            BuiltinNode::Map(n) => n.ports(),
        }
    }

    pub fn deliver(&mut self, chunk: &[u8], sender: &SenderId, ctx: &mut NodeContext<'_>) {
        match self {
            BuiltinNode::Keyboard(n) => n.deliver(chunk, sender, ctx),
            BuiltinNode::Serial(n) => n.deliver(chunk, sender, ctx),
            BuiltinNode::Text(n) => n.deliver(chunk, sender, ctx),
            BuiltinNode::Logfile(n) => n.deliver(chunk, sender, ctx),
            BuiltinNode::Linebuffer(n) => n.deliver(chunk, sender, ctx),
            BuiltinNode::Hex(n) => n.deliver(chunk, sender, ctx),
            BuiltinNode::SeqCheck(n) => n.deliver(chunk, sender, ctx),
            BuiltinNode::Select(n) => n.deliver(chunk, sender, ctx),
            BuiltinNode::Framer(n) => n.deliver(chunk, sender, ctx),
            BuiltinNode::Deframer(n) => n.deliver(chunk, sender, ctx),
            BuiltinNode::Map(n) => n.deliver(chunk, sender, ctx),
        }
    }

    pub fn on_command(&mut self, command: &NodeCommand) -> bool {
        match self {
            BuiltinNode::Linebuffer(n) => n.on_command(command),
            BuiltinNode::SeqCheck(n) => n.on_command(command),
            BuiltinNode::Select(n) => n.on_command(command),
            BuiltinNode::Deframer(n) => n.on_command(command),
            _ => false,
        }
    }

    pub fn poll_handle(&self) -> Option<SharedTransport> {
        match self {
            BuiltinNode::Serial(n) => Some(n.transport()),
            _ => None,
        }
    }
}

/// Wrapper that holds either a built-in stage (enum dispatch) or a plugin (trait object).
pub enum AnyNode {
    Builtin(BuiltinNode),
    Plugin(Box<dyn NodePlugin>),
}

impl AnyNode {
    pub fn name(&self) -> &str {
        match self {
            AnyNode::Builtin(n) => n.name(),
            AnyNode::Plugin(n) => n.name(),
        }
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        match self {
            AnyNode::Builtin(n) => n.ports(),
            AnyNode::Plugin(n) => n.ports(),
        }
    }

    pub fn deliver(&mut self, chunk: &[u8], sender: &SenderId, ctx: &mut NodeContext<'_>) {
        match self {
            AnyNode::Builtin(n) => n.deliver(chunk, sender, ctx),
            AnyNode::Plugin(n) => n.deliver(chunk, sender, ctx),
        }
    }

    pub fn on_command(&mut self, command: &NodeCommand) -> bool {
        match self {
            AnyNode::Builtin(n) => n.on_command(command),
            AnyNode::Plugin(n) => n.on_command(command),
        }
    }

    pub fn poll_handle(&self) -> Option<SharedTransport> {
        match self {
            AnyNode::Builtin(n) => n.poll_handle(),
            AnyNode::Plugin(n) => n.poll_handle(),
        }
    }

    /// Wrap a user-defined stage.
    pub fn plugin(node: impl NodePlugin + 'static) -> Self {
        AnyNode::Plugin(Box::new(node))
    }
}

macro_rules! impl_into_any_node {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AnyNode {
                fn from(node: $ty) -> Self {
                    AnyNode::Builtin(BuiltinNode::$variant(node))
                }
            }
        )*
    };
}

impl_into_any_node! {
    Keyboard => KeyboardNode,
    Serial => SerialNode,
    Text => TextNode,
    Logfile => LogfileNode,
    Linebuffer => LinebufferNode,
    Hex => HexNode,
    SeqCheck => SeqCheckNode,
    Select => SelectNode,
    Framer => FramerNode,
    Deframer => DeframerNode,
    Map => MapNode,
}

impl From<BuiltinNode> for AnyNode {
    fn from(node: BuiltinNode) -> Self {
        AnyNode::Builtin(node)
    }
}
