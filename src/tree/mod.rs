//! One module's symbol hierarchy.
//!
//! A [`Tree`] owns every node of one documented module in a single arena.
//! The root is an unnamed namespace at [`NodeId::ROOT`]; every other node
//! refers to its owner by index. Besides the nodes, a tree carries the
//! module-local indexes the resolver needs:
//!
//! - the target index (canonical name → [`TargetRec`]s), see [`targets`]
//! - the title index (canonical title → page/document nodes)
//! - the pending property accessor worklist, see [`properties`]
//! - the collision registry
//!
//! Lookup lives in [`find`], inheritance passes in [`inheritance`].
//!
//! [`targets`]: self::targets
//! [`properties`]: self::properties
//! [`find`]: self::find
//! [`inheritance`]: self::inheritance

mod find;
mod inheritance;
mod properties;
mod targets;

pub use find::FindFlags;
pub use targets::{TargetMatch, TargetRec};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{NodeId, TreeId, join_path};
use crate::diagnostics::{Diagnostic, DiagnosticKind, RelatedInfo};
use crate::error::{DatabaseError, Result};
use crate::node::{Access, CollisionData, FunctionRole, Node, NodePayload, RelatedClass};

/// A rooted hierarchy of nodes for one module.
#[derive(Debug, Clone)]
pub struct Tree {
    id: TreeId,
    module: SmolStr,
    read_only: bool,
    nodes: Vec<Node>,
    targets: IndexMap<SmolStr, Vec<TargetRec>>,
    titles: IndexMap<SmolStr, Vec<NodeId>>,
    pending_accessors: IndexMap<NodeId, Vec<(FunctionRole, SmolStr)>>,
    collisions: IndexMap<(NodeId, SmolStr), NodeId>,
}

impl Tree {
    pub fn new(id: TreeId, module: impl Into<SmolStr>) -> Self {
        Self {
            id,
            module: module.into(),
            read_only: false,
            nodes: vec![Node::new("", None, NodePayload::Namespace)],
            targets: IndexMap::new(),
            titles: IndexMap::new(),
            pending_accessors: IndexMap::new(),
            collisions: IndexMap::new(),
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Index trees are frozen once loaded and locally resolved.
    pub(crate) fn freeze(&mut self) {
        self.read_only = true;
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Arena access for ids already known to belong to this tree.
    pub(crate) fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// All nodes in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeId::new(i), node))
    }

    /// Preorder walk of the subtree at `from`, children in insertion order.
    pub fn preorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.node(from).is_none() {
            return out;
        }
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            out.push(id);
            let children: Vec<NodeId> = self.get(id).children().iter().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Names from the root down to `id`, root excluded.
    pub fn path_of(&self, id: NodeId) -> Vec<SmolStr> {
        let mut path = Vec::new();
        let mut current = self.node(id);
        while let Some(node) = current {
            let Some(parent) = node.parent() else {
                break;
            };
            path.push(SmolStr::new(node.name()));
            current = self.node(parent);
        }
        path.reverse();
        path
    }

    /// `A::B::c` style name of a node; empty for the root.
    pub fn full_name(&self, id: NodeId) -> String {
        join_path(&self.path_of(id))
    }

    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Create a node as the last child of `parent`.
    ///
    /// Fails if `parent` is unknown or is a leaf, and with
    /// [`DatabaseError::DuplicateDefinition`] when a function with the same
    /// signature already exists under the same name. Plain name collisions
    /// are accepted; colliding page-producing siblings are tracked by a
    /// [`NodeKind::Collision`](crate::node::NodeKind::Collision) node.
    pub fn create_node(
        &mut self,
        parent: NodeId,
        name: impl Into<SmolStr>,
        payload: NodePayload,
    ) -> Result<NodeId> {
        let name = name.into();
        let Some(owner) = self.node(parent) else {
            return Err(DatabaseError::UnknownNode {
                module: self.module.clone(),
                node: parent,
            });
        };
        if !owner.is_inner() {
            return Err(DatabaseError::NotInnerNode {
                parent,
                kind: owner.kind(),
                child: name,
            });
        }

        if let NodePayload::Function(data) = &payload {
            let existing = owner.children().find(&name).iter().copied().find(|&id| {
                self.get(id)
                    .payload()
                    .as_function()
                    .is_some_and(|f| f.same_signature(data))
            });
            if let Some(existing) = existing {
                return Err(DatabaseError::DuplicateDefinition {
                    name,
                    signature: data.signature(),
                    existing,
                });
            }
        }

        let produces_page = payload.kind().produces_page();
        let id = self.attach(parent, Node::new(name.clone(), Some(parent), payload));
        if produces_page {
            self.check_for_collision(parent, &name);
        }
        Ok(id)
    }

    fn attach(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let name = SmolStr::new(node.name());
        self.nodes.push(node);
        self.get_mut(parent).children_mut().insert(name, id);
        id
    }

    /// Record a base class by name; bound later by `resolve_inheritance`.
    pub fn add_base_class(&mut self, class: NodeId, path: &str, access: Access) -> Result<()> {
        let module = self.module.clone();
        let node = self
            .node_mut(class)
            .ok_or(DatabaseError::UnknownNode {
                module: module.clone(),
                node: class,
            })?;
        let Some(data) = node.payload_mut().as_class_mut() else {
            return Err(DatabaseError::invariant(
                module,
                format!("base class '{path}' recorded on a non-class node"),
            ));
        };
        let segments = crate::base::split_path(path)
            .into_iter()
            .map(SmolStr::new)
            .collect();
        data.bases.push(RelatedClass::new(segments, access));
        Ok(())
    }

    // ========================================================================
    // COLLISIONS
    // ========================================================================

    /// Ensure a collision node exists under `parent` if two or more
    /// page-producing children of different kinds share `name`.
    pub fn check_for_collision(&mut self, parent: NodeId, name: &str) -> Option<NodeId> {
        let members: Vec<NodeId> = self
            .node(parent)?
            .children()
            .find(name)
            .iter()
            .copied()
            .filter(|&id| self.get(id).kind().produces_page())
            .collect();
        let first_kind = self.get(*members.first()?).kind();
        if members.iter().all(|&id| self.get(id).kind() == first_kind) {
            return None;
        }

        let key = (parent, SmolStr::new(name));
        if let Some(&collision) = self.collisions.get(&key) {
            if let NodePayload::Collision(data) = self.get_mut(collision).payload_mut() {
                data.members = members;
            }
            return Some(collision);
        }

        tracing::debug!(
            "[TREE] collision on '{}' under {:?} in {}",
            name,
            parent,
            self.module
        );
        let node = Node::new(
            name,
            Some(parent),
            NodePayload::Collision(CollisionData { members }),
        );
        let collision = self.attach(parent, node);
        self.collisions.insert(key, collision);
        Some(collision)
    }

    /// The first collision node registered for `name`, under any parent.
    pub fn find_collision_node(&self, name: &str) -> Option<NodeId> {
        self.collisions
            .iter()
            .find(|((_, n), _)| n == name)
            .map(|(_, &id)| id)
    }

    pub fn collision_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.collisions.values().copied()
    }

    /// One `NameCollision` diagnostic per collision node.
    pub fn collision_diagnostics(&self) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for collision in self.collision_nodes() {
            let node = self.get(collision);
            let NodePayload::Collision(data) = node.payload() else {
                continue;
            };
            let Some(&first) = data.members.first() else {
                continue;
            };
            let kinds: Vec<&str> = data
                .members
                .iter()
                .map(|&m| self.get(m).kind().as_str())
                .collect();
            let mut diag = Diagnostic::warning(
                DiagnosticKind::NameCollision,
                self.module.clone(),
                self.get(first).location().clone(),
                format!(
                    "'{}' names {} nodes of different kinds ({})",
                    self.full_name(first),
                    data.members.len(),
                    kinds.join(", ")
                ),
            )
            .with_node(self.node_ref(first));
            for &member in &data.members[1..] {
                diag = diag.with_related(RelatedInfo {
                    node: self.node_ref(member),
                    location: self.get(member).location().clone(),
                    message: format!("also declared here as {}", self.get(member).kind()),
                });
            }
            out.push(diag);
        }
        out
    }

    pub fn node_ref(&self, id: NodeId) -> crate::base::NodeRef {
        crate::base::NodeRef::new(self.id, id)
    }

    // ========================================================================
    // INVARIANTS
    // ========================================================================

    /// Verify parent/child consistency and single ownership.
    pub fn check_invariants(&self) -> Result<()> {
        let fail = |message: String| -> Result<()> {
            Err(DatabaseError::invariant(self.module.clone(), message))
        };

        if self.get(NodeId::ROOT).parent().is_some() {
            return fail("root node has a parent".to_string());
        }

        let mut owners: FxHashMap<NodeId, NodeId> = FxHashMap::default();
        for (id, node) in self.iter() {
            for child in node.children().iter() {
                let Some(child_node) = self.node(child) else {
                    return fail(format!("{id:?} lists unknown child {child:?}"));
                };
                if child_node.parent() != Some(id) {
                    return fail(format!(
                        "child '{}' of {id:?} points at parent {:?}",
                        child_node.name(),
                        child_node.parent()
                    ));
                }
                if let Some(previous) = owners.insert(child, id) {
                    return fail(format!(
                        "{child:?} is owned by both {previous:?} and {id:?}"
                    ));
                }
            }
        }

        for (id, node) in self.iter().skip(1) {
            let Some(parent) = node.parent() else {
                return fail(format!("non-root node {id:?} has no parent"));
            };
            if owners.get(&id) != Some(&parent) {
                return fail(format!(
                    "'{}' is not listed among the children of its parent {parent:?}",
                    node.name()
                ));
            }
            if !self.get(parent).is_inner() {
                return fail(format!("'{}' is owned by a leaf node", node.name()));
            }
        }
        Ok(())
    }

}
