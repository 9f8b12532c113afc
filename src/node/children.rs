use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::NodeId;

/// Children of an inner node.
///
/// A name maps to a sequence because overloads and cross-kind name
/// collisions are legal. Insertion order is kept both per name and overall;
/// lookups and tie-breaks depend on it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildMap {
    by_name: IndexMap<SmolStr, Vec<NodeId>>,
    order: Vec<NodeId>,
}

impl ChildMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: SmolStr, child: NodeId) {
        self.by_name.entry(name).or_default().push(child);
        self.order.push(child);
    }

    /// All children registered under `name`, in insertion order.
    pub fn find(&self, name: &str) -> &[NodeId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, child: NodeId) -> bool {
        self.order.contains(&child)
    }

    /// All children in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(SmolStr::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
