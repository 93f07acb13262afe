//! Identity types for the pipeline system.
//!
//! `NodeId` is a newtype over `u32` that serves as a direct index into the
//! graph's node arena. `SenderId` is the caller-assigned identity a stage
//! stamps on everything it forwards; it is only ever compared, never used
//! to look a node up, and it need not be unique.

use std::fmt;
use std::sync::Arc;

/// Index into `Graph::nodes`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Opaque sender identity, possibly empty.
///
/// Cheap to clone: every forwarded chunk is tagged with one.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SenderId(Arc<str>);

impl SenderId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    /// The empty identity used by stages constructed without one.
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SenderId {
    fn default() -> Self {
        Self(Arc::from(""))
    }
}

impl fmt::Debug for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SenderId({:?})", &*self.0)
    }
}

impl fmt::Display for SenderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SenderId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SenderId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl PartialEq<str> for SenderId {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}
