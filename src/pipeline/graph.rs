//! The node graph: an arena of stages and their keyed receiver lists.
//!
//! Delivery is synchronous and depth-first. When a stage forwards a chunk,
//! every receiver under that port runs to completion, in registration order,
//! before the forwarding call returns. A stage is taken out of its slot while
//! it runs, so a delivery that loops back into it (a cycle) is dropped.
//!
//! The graph is not meant to be shared between threads; the dispatcher owns
//! it and is the only caller of [`Graph::deliver`].

use crate::backend::transport::{lock_transport, SharedTransport};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::{NodeId, SenderId};
use crate::pipeline::node::{AnyNode, NodeCommand, NodeContext};
use crate::pipeline::port::{declares, Port, PortDirection};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A slot holding a stage, its identity and its receivers.
pub struct NodeSlot {
    /// `None` while the stage is running.
    node: Option<AnyNode>,
    name: String,
    sender: SenderId,
    /// Registration order is delivery order.
    receivers: Vec<(Port, NodeId)>,
    /// Commands that arrived while the stage was running.
    pending: Vec<NodeCommand>,
}

/// The stage graph.
pub struct Graph {
    nodes: Vec<NodeSlot>,
    running: Arc<AtomicBool>,
    dropped_reentrant: u64,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            running: Arc::new(AtomicBool::new(true)),
            dropped_reentrant: 0,
        }
    }

    // ── Graph building ──

    /// Add a stage with the identity it stamps on forwarded chunks.
    pub fn add(&mut self, node: impl Into<AnyNode>, sender: impl Into<SenderId>) -> NodeId {
        let node = node.into();
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeSlot {
            name: node.name().to_string(),
            node: Some(node),
            sender: sender.into(),
            receivers: Vec::new(),
            pending: Vec::new(),
        });
        id
    }

    /// Register `to` as a receiver of `from` on the default channel.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> PipelineResult<()> {
        self.connect_port(from, Port::Default, to)
    }

    /// Register `to` as a receiver of `from` under `port`.
    pub fn connect_port(&mut self, from: NodeId, port: Port, to: NodeId) -> PipelineResult<()> {
        self.validate(from, port, PortDirection::Output)?;
        self.validate(to, Port::Default, PortDirection::Input)?;
        self.nodes[from.index()].receivers.push((port, to));
        tracing::trace!(%from, %to, %port, "Registered receiver");
        Ok(())
    }

    /// Register several receivers under one port, preserving their order.
    pub fn connect_all(&mut self, from: NodeId, port: Port, to: &[NodeId]) -> PipelineResult<()> {
        for &receiver in to {
            self.connect_port(from, port, receiver)?;
        }
        Ok(())
    }

    fn validate(&self, id: NodeId, port: Port, direction: PortDirection) -> PipelineResult<()> {
        let slot = self
            .nodes
            .get(id.index())
            .ok_or(PipelineError::UnknownNode(id))?;
        let ok = slot
            .node
            .as_ref()
            .map(|n| declares(n.ports(), port, direction))
            .unwrap_or(false);
        if ok {
            Ok(())
        } else {
            Err(PipelineError::PortMismatch {
                node: slot.name.clone(),
                port,
                direction,
            })
        }
    }

    // ── Queries ──

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&AnyNode> {
        self.nodes.get(id.index()).and_then(|s| s.node.as_ref())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut AnyNode> {
        self.nodes.get_mut(id.index()).and_then(|s| s.node.as_mut())
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id.index()).map(|s| s.name.as_str())
    }

    /// Identity stamped by `id`. Panics on an id this graph did not hand out.
    pub fn sender(&self, id: NodeId) -> &SenderId {
        &self.nodes[id.index()].sender
    }

    /// Receivers of `id` under `port`, in registration order.
    pub fn receivers(&self, id: NodeId, port: Port) -> Vec<NodeId> {
        self.nodes
            .get(id.index())
            .map(|s| {
                s.receivers
                    .iter()
                    .filter(|(p, _)| *p == port)
                    .map(|(_, to)| *to)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Pollable sources, in the order they were added.
    pub fn sources(&self) -> Vec<(NodeId, SharedTransport)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                s.node
                    .as_ref()
                    .and_then(|n| n.poll_handle())
                    .map(|t| (NodeId(i as u32), t))
            })
            .collect()
    }

    /// Deliveries dropped because they looped back into a running stage.
    pub fn dropped_reentrant(&self) -> u64 {
        self.dropped_reentrant
    }

    /// Flag shared with the runtime; cleared when a stage requests a stop.
    pub fn running_flag(&self) -> &Arc<AtomicBool> {
        &self.running
    }

    pub fn stop_requested(&self) -> bool {
        !self.running.load(Ordering::Acquire)
    }

    /// Log the wiring, one line per edge.
    pub fn log_topology(&self) {
        for (i, slot) in self.nodes.iter().enumerate() {
            for (port, to) in &slot.receivers {
                tracing::debug!(
                    "{} '{}' ({}) --{}--> {} '{}'",
                    slot.name,
                    slot.sender,
                    i,
                    port,
                    self.nodes[to.index()].name,
                    self.nodes[to.index()].sender,
                );
            }
        }
    }

    // ── Delivery ──

    /// Hand `chunk` to `target`, tagged with `sender`, and run everything it
    /// forwards to completion.
    pub fn deliver(&mut self, target: NodeId, chunk: &[u8], sender: &SenderId) {
        let Some(slot) = self.nodes.get_mut(target.index()) else {
            tracing::warn!(%target, "Delivery to unknown node dropped");
            return;
        };
        let Some(mut node) = slot.node.take() else {
            self.dropped_reentrant += 1;
            tracing::warn!(
                %target,
                name = %slot.name,
                "Re-entrant delivery dropped (cycle in the node graph)"
            );
            return;
        };

        tracing::trace!(%target, %sender, len = chunk.len(), "deliver");
        {
            let mut ctx = NodeContext::new(self, target);
            node.deliver(chunk, sender, &mut ctx);
        }
        let slot = &mut self.nodes[target.index()];
        for command in std::mem::take(&mut slot.pending) {
            apply_command(target, &mut node, &command);
        }
        slot.node = Some(node);
    }

    /// Forward a chunk produced by `source` itself (a polled read) to its
    /// default receivers.
    pub fn emit_from(&mut self, source: NodeId, chunk: &[u8]) -> PipelineResult<()> {
        if !self.contains(source) {
            return Err(PipelineError::UnknownNode(source));
        }
        NodeContext::new(self, source).emit(Port::Default, chunk);
        Ok(())
    }

    /// Apply a runtime command to a stage.
    ///
    /// A stage that is on the delivery stack (upstream of the caller, or the
    /// caller itself) gets the command queued; it is applied as soon as that
    /// stage's current delivery returns, and this reports `true`.
    pub fn command(&mut self, target: NodeId, command: &NodeCommand) -> bool {
        match self.nodes.get_mut(target.index()) {
            Some(NodeSlot {
                node: Some(node), ..
            }) => apply_command(target, node, command),
            Some(slot) => {
                tracing::debug!(%target, ?command, "Command queued for running node");
                slot.pending.push(command.clone());
                true
            }
            None => {
                tracing::warn!(%target, ?command, "Command to unknown node dropped");
                false
            }
        }
    }

    /// Read one pollable source and forward what arrived. Returns the number
    /// of bytes read.
    pub fn poll_source(&mut self, id: NodeId) -> PipelineResult<usize> {
        let transport = self
            .node(id)
            .ok_or(PipelineError::UnknownNode(id))?
            .poll_handle()
            .ok_or(PipelineError::NotPollable(id))?;
        let chunk = lock_transport(&transport).read()?;
        NodeContext::new(self, id).emit(Port::Default, &chunk);
        Ok(chunk.len())
    }

    /// Read every pollable source once and forward what arrived.
    ///
    /// Single-threaded alternative to the background poller.
    pub fn poll(&mut self) -> usize {
        let mut total = 0;
        for (id, _) in self.sources() {
            match self.poll_source(id) {
                Ok(n) => total += n,
                Err(e) => tracing::warn!(source = %id, "Poll failed: {}", e),
            }
        }
        total
    }
}

fn apply_command(target: NodeId, node: &mut AnyNode, command: &NodeCommand) -> bool {
    let handled = node.on_command(command);
    if !handled {
        tracing::debug!(%target, ?command, "Command ignored");
    }
    handled
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
