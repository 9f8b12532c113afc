//! Name lookup within a single tree.
//!
//! Paths are pre-split segments (`["QWidget", "show"]`). Relative lookup
//! follows the scope-walking style: try the whole path from the relative
//! scope, then from each enclosing scope out to the root.

use std::ops::{BitOr, BitOrAssign};

use rustc_hash::FxHashSet;

use super::Tree;
use crate::base::{NodeId, join_path};
use crate::node::{FunctionData, Genus, Node, NodeKind};

/// Bitmask controlling [`Tree::find_node`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FindFlags(u8);

impl FindFlags {
    pub const NONE: Self = Self(0);
    /// Also look for members inherited from same-tree base classes.
    pub const SEARCH_BASE_CLASSES: Self = Self(1 << 0);
    /// The last segment may name a value of an enum child.
    pub const SEARCH_ENUM_VALUES: Self = Self(1 << 1);
    /// Functions are not candidates for the last segment.
    pub const NON_FUNCTION: Self = Self(1 << 2);
    /// Look in the QML genus instead of C++.
    pub const QML: Self = Self(1 << 3);
    /// Collision placeholders are valid results.
    pub const ACCEPT_COLLISION: Self = Self(1 << 4);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for FindFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FindFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

const INNER_KINDS: &[NodeKind] = &[
    NodeKind::Namespace,
    NodeKind::Class,
    NodeKind::Enum,
    NodeKind::QmlType,
    NodeKind::Document,
];

impl Tree {
    // ========================================================================
    // RELATIVE LOOKUP
    // ========================================================================

    /// Resolve `path` starting at `relative` (or the root).
    ///
    /// The full path is retried from each enclosing scope until one matches.
    /// The relative node itself is never returned.
    pub fn find_node(
        &self,
        path: &[&str],
        relative: Option<NodeId>,
        flags: FindFlags,
    ) -> Option<NodeId> {
        self.find_node_where(path, relative, flags, |_| true)
    }

    /// Like [`find_node`](Self::find_node), but the last segment must also
    /// satisfy `accept`.
    pub(crate) fn find_node_where(
        &self,
        path: &[&str],
        relative: Option<NodeId>,
        flags: FindFlags,
        accept: impl Fn(&Node) -> bool,
    ) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }

        let mut scope = match relative.and_then(|id| self.node(id).map(|node| (id, node))) {
            Some((id, node)) if node.is_inner() => Some(id),
            Some((_, node)) => node.parent(),
            None => Some(NodeId::ROOT),
        };

        while let Some(start) = scope {
            if let Some(found) = self.match_path(start, path, flags, &accept) {
                if Some(found) != relative {
                    tracing::trace!(
                        "[FIND] {}: '{}' from {:?} -> {:?}",
                        self.module(),
                        join_path(path),
                        start,
                        found
                    );
                    return Some(found);
                }
            }
            scope = self.get(start).parent();
        }
        None
    }

    /// Every same-named scope is tried in turn, so a second `Qt` namespace
    /// is reached when the first one does not contain the rest of the path.
    fn match_path(
        &self,
        start: NodeId,
        path: &[&str],
        flags: FindFlags,
        accept: &impl Fn(&Node) -> bool,
    ) -> Option<NodeId> {
        let (segment, rest) = path.split_first()?;
        if rest.is_empty() {
            return self.find_leaf(start, segment, flags, accept);
        }
        self.scope_candidates(start, segment, flags)
            .into_iter()
            .find_map(|scope| self.match_path(scope, rest, flags, accept))
    }

    /// Intermediate segment: inner children named `name`, direct ones first,
    /// then those inherited from same-tree bases.
    fn scope_candidates(&self, parent: NodeId, name: &str, flags: FindFlags) -> Vec<NodeId> {
        let mut owners = vec![parent];
        if flags.contains(FindFlags::SEARCH_BASE_CLASSES) {
            owners.extend(self.local_ancestors(parent));
        }
        let mut candidates = Vec::new();
        for owner in owners {
            for &id in self.get(owner).children().find(name) {
                let node = self.get(id);
                if node.is_inner() && self.accepts_genus(node, flags) && !candidates.contains(&id) {
                    candidates.push(id);
                }
            }
        }
        candidates
    }

    /// Last segment: flags and `accept` filter the candidates.
    fn find_leaf(
        &self,
        parent: NodeId,
        name: &str,
        flags: FindFlags,
        accept: &impl Fn(&Node) -> bool,
    ) -> Option<NodeId> {
        let pick = |owner: NodeId| {
            let direct = self.get(owner).children().find(name).iter().copied().find(|&id| {
                let node = self.get(id);
                self.accepts_genus(node, flags)
                    && !(flags.contains(FindFlags::NON_FUNCTION) && node.is_function())
                    && accept(node)
            });
            direct.or_else(|| {
                if flags.contains(FindFlags::SEARCH_ENUM_VALUES) {
                    self.find_enum_value(owner, name, accept)
                } else {
                    None
                }
            })
        };
        pick(parent).or_else(|| {
            if flags.contains(FindFlags::SEARCH_BASE_CLASSES) {
                self.local_ancestors(parent).into_iter().find_map(pick)
            } else {
                None
            }
        })
    }

    fn find_enum_value(
        &self,
        owner: NodeId,
        name: &str,
        accept: &impl Fn(&Node) -> bool,
    ) -> Option<NodeId> {
        self.get(owner)
            .children()
            .iter()
            .filter(|&id| self.get(id).kind() == NodeKind::Enum)
            .find_map(|e| {
                self.get(e).children().find(name).iter().copied().find(|&id| {
                    let node = self.get(id);
                    node.kind() == NodeKind::EnumValue && accept(node)
                })
            })
    }

    fn accepts_genus(&self, node: &Node, flags: FindFlags) -> bool {
        match node.genus() {
            Genus::Collision => flags.contains(FindFlags::ACCEPT_COLLISION),
            Genus::Doc => false,
            Genus::Qml => flags.contains(FindFlags::QML),
            Genus::Cpp => {
                !flags.contains(FindFlags::QML)
                    || node
                        .parent()
                        .is_some_and(|p| self.get(p).kind() == NodeKind::QmlType)
            }
        }
    }

    /// Bound ancestors of a class that live in this tree, preorder.
    pub(crate) fn local_ancestors(&self, class: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        self.collect_local_ancestors(class, &mut seen, &mut out);
        out
    }

    fn collect_local_ancestors(
        &self,
        class: NodeId,
        seen: &mut FxHashSet<NodeId>,
        out: &mut Vec<NodeId>,
    ) {
        let Some(data) = self.node(class).and_then(|n| n.payload().as_class()) else {
            return;
        };
        for base in &data.bases {
            let Some(base) = base.node.filter(|r| r.tree == self.id()) else {
                continue;
            };
            if seen.insert(base.node) {
                out.push(base.node);
                self.collect_local_ancestors(base.node, seen, out);
            }
        }
    }

    // ========================================================================
    // ABSOLUTE LOOKUP BY KIND
    // ========================================================================

    /// Absolute lookup from the root; the last segment must be one of
    /// `kinds`. Same-named siblings are all tried before giving up.
    pub fn find_node_by_kind(&self, path: &[&str], kinds: &[NodeKind]) -> Option<NodeId> {
        if path.is_empty() {
            return None;
        }
        self.find_by_kind_from(NodeId::ROOT, path, kinds)
    }

    fn find_by_kind_from(&self, at: NodeId, path: &[&str], kinds: &[NodeKind]) -> Option<NodeId> {
        let (first, rest) = path.split_first()?;
        for &child in self.get(at).children().find(first) {
            let node = self.get(child);
            if rest.is_empty() {
                if kinds.contains(&node.kind()) {
                    return Some(child);
                }
            } else if node.is_inner() {
                if let Some(found) = self.find_by_kind_from(child, rest, kinds) {
                    return Some(found);
                }
            }
        }
        None
    }

    pub fn find_class_node(&self, path: &[&str]) -> Option<NodeId> {
        self.find_node_by_kind(path, &[NodeKind::Class])
    }

    pub fn find_namespace_node(&self, path: &[&str]) -> Option<NodeId> {
        self.find_node_by_kind(path, &[NodeKind::Namespace])
    }

    pub fn find_qml_type_node(&self, path: &[&str]) -> Option<NodeId> {
        self.find_node_by_kind(path, &[NodeKind::QmlType])
    }

    /// The inner node a `\relates` command refers to.
    pub fn find_relates_node(&self, path: &[&str]) -> Option<NodeId> {
        self.find_node_by_kind(path, INNER_KINDS)
    }

    /// Relative lookup of a type-like node (class, enum, namespace).
    pub fn find_type_node(&self, path: &[&str], relative: Option<NodeId>) -> Option<NodeId> {
        self.find_node_where(path, relative, FindFlags::NON_FUNCTION, |n| {
            n.kind().is_type_like()
        })
    }

    // ========================================================================
    // FUNCTIONS
    // ========================================================================

    /// Relative lookup of the first function named by the last segment.
    pub fn find_function_node(
        &self,
        path: &[&str],
        relative: Option<NodeId>,
        flags: FindFlags,
    ) -> Option<NodeId> {
        self.find_node_where(
            path,
            relative,
            flags.without(FindFlags::NON_FUNCTION),
            Node::is_function,
        )
    }

    /// Absolute lookup of the overload whose signature matches `signature`.
    pub fn find_function_matching(
        &self,
        path: &[&str],
        signature: &FunctionData,
    ) -> Option<NodeId> {
        let (name, parent_path) = path.split_last()?;
        let parent = if parent_path.is_empty() {
            NodeId::ROOT
        } else {
            self.find_node_by_kind(parent_path, INNER_KINDS)?
        };
        self.get(parent)
            .children()
            .find(name)
            .iter()
            .copied()
            .find(|&id| {
                self.get(id)
                    .payload()
                    .as_function()
                    .is_some_and(|f| f.same_signature(signature))
            })
    }
}
