//! SelectNode: routes chunks by sender.
//!
//! Each sender can be enabled or disabled; senders without an entry get the
//! default verdict. Enabled chunks are forwarded unchanged, stamped with the
//! select stage's own identity. The table is usually flipped at runtime by
//! match callbacks of an upstream sequence-check stage.

use crate::pipeline::id::SenderId;
use crate::pipeline::node::{NodeCommand, NodeContext};
use crate::pipeline::port::{Port, PortDescriptor, FILTER_PORTS};
use std::collections::HashMap;

#[derive(Debug)]
pub struct SelectNode {
    table: HashMap<String, bool>,
    default: bool,
    dropped: u64,
}

impl SelectNode {
    pub fn new(default: bool) -> Self {
        Self {
            table: HashMap::new(),
            default,
            dropped: 0,
        }
    }

    pub fn name(&self) -> &str {
        "Select"
    }

    pub fn ports(&self) -> &[PortDescriptor] {
        FILTER_PORTS
    }

    pub fn enable(&mut self, key: impl Into<String>) {
        self.table.insert(key.into(), true);
    }

    pub fn disable(&mut self, key: impl Into<String>) {
        self.table.insert(key.into(), false);
    }

    pub fn set_default(&mut self, default: bool) {
        self.default = default;
    }

    /// Would a chunk from `sender` be forwarded right now?
    pub fn is_enabled(&self, sender: &str) -> bool {
        self.table.get(sender).copied().unwrap_or(self.default)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn deliver(&mut self, chunk: &[u8], sender: &SenderId, ctx: &mut NodeContext<'_>) {
        if self.is_enabled(sender.as_str()) {
            ctx.emit(Port::Default, chunk);
        } else {
            self.dropped += 1;
        }
    }

    pub fn on_command(&mut self, command: &NodeCommand) -> bool {
        match command {
            NodeCommand::Enable(key) => self.enable(key.clone()),
            NodeCommand::Disable(key) => self.disable(key.clone()),
            NodeCommand::SetDefault(default) => self.set_default(*default),
            NodeCommand::Reset => return false,
        }
        tracing::debug!(?command, "Select table updated");
        true
    }
}

impl Default for SelectNode {
    fn default() -> Self {
        Self::new(true)
    }
}
