//! Port descriptors for the node system.
//!
//! Receivers are registered under a routing key. The set of keys is closed:
//! every stage forwards on the default channel, and the deframer has a second
//! channel for completed packets. Each node declares its ports via a static
//! `PortDescriptor` array and the graph validates registrations against it.

use std::fmt;

/// Routing key under which receivers are registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Port {
    /// The normal data channel, keyed `"_"`.
    #[default]
    Default,
    /// Decoded packets from a deframer.
    Packet,
}

impl Port {
    /// Textual routing key.
    pub const fn key(self) -> &'static str {
        match self {
            Port::Default => "_",
            Port::Packet => "packet",
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

/// Static descriptor for a node's port.
#[derive(Debug, Clone)]
pub struct PortDescriptor {
    pub port: Port,
    pub direction: PortDirection,
}

impl PortDescriptor {
    pub const fn input(port: Port) -> Self {
        Self {
            port,
            direction: PortDirection::Input,
        }
    }

    pub const fn output(port: Port) -> Self {
        Self {
            port,
            direction: PortDirection::Output,
        }
    }
}

/// Does `ports` contain `port` in the given direction?
pub fn declares(ports: &[PortDescriptor], port: Port, direction: PortDirection) -> bool {
    ports
        .iter()
        .any(|d| d.port == port && d.direction == direction)
}

/// Input-only stage (sinks).
pub static SINK_PORTS: &[PortDescriptor] = &[PortDescriptor::input(Port::Default)];

/// Input plus default output (filters, transforms).
pub static FILTER_PORTS: &[PortDescriptor] = &[
    PortDescriptor::input(Port::Default),
    PortDescriptor::output(Port::Default),
];
