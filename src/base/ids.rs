use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a node inside its tree's arena.
/// Uses u32 for compact storage (supports ~4 billion nodes per tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Every tree stores its root namespace at index 0.
    pub const ROOT: NodeId = NodeId(0);

    /// Create a new NodeId from an arena index
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// Get the index into the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Position of a tree in the forest's registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreeId(pub u32);

impl TreeId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A forest-level node address.
///
/// Trees never hold pointers into each other. Links that can cross module
/// boundaries (base classes, QML bases, C++ counterparts) are stored as a
/// `NodeRef` and dereferenced through the forest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub tree: TreeId,
    pub node: NodeId,
}

impl NodeRef {
    pub fn new(tree: TreeId, node: NodeId) -> Self {
        Self { tree, node }
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tree.0, self.node.0)
    }
}
