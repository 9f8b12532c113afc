//! Aggregated views over the resolved primary tree.
//!
//! Every map here is rebuilt from scratch by [`Collections::rebuild`]; none
//! is maintained incrementally. Keys are sorted (`BTreeMap`) so generators
//! see a stable order.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use crate::base::{NodeId, NodeRef};
use crate::node::{Node, NodeKind, Status};
use crate::tree::Tree;

/// Full name → nodes with that name.
pub type NodeMultiMap = BTreeMap<String, Vec<NodeRef>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collections {
    pub classes: NodeMultiMap,
    pub compat_classes: NodeMultiMap,
    pub obsolete_classes: NodeMultiMap,
    pub classes_with_obsolete_members: NodeMultiMap,
    pub service_classes: NodeMultiMap,
    pub qml_types: NodeMultiMap,
    pub obsolete_qml_types: NodeMultiMap,
    pub qml_types_with_obsolete_members: NodeMultiMap,
    pub namespaces: NodeMultiMap,
    /// Function name → parent full name → overloads.
    pub function_index: BTreeMap<SmolStr, NodeMultiMap>,
    /// Version → nodes introduced in it.
    pub since: BTreeMap<SmolStr, NodeMultiMap>,
    pub since_classes: BTreeMap<SmolStr, NodeMultiMap>,
    pub since_qml_types: BTreeMap<SmolStr, NodeMultiMap>,
    /// Legalese text → nodes carrying it.
    pub legalese: BTreeMap<String, Vec<NodeRef>>,
}

/// Which partition a class or QML type falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Partition {
    Main,
    Compat,
    Obsolete,
    ObsoleteMembers,
    Service,
}

impl Collections {
    /// Clear everything and re-traverse `tree` from its root.
    ///
    /// Private nodes and their subtrees are skipped, as are internal ones
    /// unless `show_internal` is set.
    pub fn rebuild(&mut self, tree: &Tree, show_internal: bool) {
        *self = Collections::default();
        let mut stack = vec![tree.root()];
        while let Some(id) = stack.pop() {
            let Some(node) = tree.node(id) else {
                continue;
            };
            if id != tree.root() {
                if node.is_private() || (node.is_internal() && !show_internal) {
                    continue;
                }
                self.visit(tree, id, node);
            }
            let children: Vec<NodeId> = node.children().iter().collect();
            stack.extend(children.into_iter().rev());
        }
        tracing::debug!(
            "[COLLECTIONS] {}: {} classes, {} QML types, {} namespaces, {} functions",
            tree.module(),
            self.classes.len(),
            self.qml_types.len(),
            self.namespaces.len(),
            self.function_index.len()
        );
    }

    fn visit(&mut self, tree: &Tree, id: NodeId, node: &Node) {
        let r = tree.node_ref(id);
        let full_name = tree.full_name(id);

        match node.kind() {
            NodeKind::Class => {
                let map = match classify(tree, node) {
                    Partition::Obsolete => &mut self.obsolete_classes,
                    Partition::ObsoleteMembers => &mut self.classes_with_obsolete_members,
                    Partition::Compat => &mut self.compat_classes,
                    Partition::Service => &mut self.service_classes,
                    Partition::Main => &mut self.classes,
                };
                push(map, &full_name, r);
            }
            NodeKind::QmlType => {
                let map = match classify(tree, node) {
                    Partition::Obsolete => &mut self.obsolete_qml_types,
                    Partition::ObsoleteMembers => &mut self.qml_types_with_obsolete_members,
                    _ => &mut self.qml_types,
                };
                push(map, &full_name, r);
            }
            NodeKind::Namespace => push(&mut self.namespaces, &full_name, r),
            NodeKind::Function => {
                let parent = node.parent().map(|p| tree.full_name(p)).unwrap_or_default();
                push(
                    self.function_index
                        .entry(SmolStr::new(node.name()))
                        .or_default(),
                    &parent,
                    r,
                );
            }
            _ => {}
        }

        if let Some(version) = node.since() {
            let version = SmolStr::new(version);
            push(self.since.entry(version.clone()).or_default(), &full_name, r);
            match node.kind() {
                NodeKind::Class => {
                    push(self.since_classes.entry(version).or_default(), &full_name, r)
                }
                NodeKind::QmlType => {
                    push(self.since_qml_types.entry(version).or_default(), &full_name, r)
                }
                _ => {}
            }
        }

        if let Some(text) = &node.meta().legalese {
            let nodes = self.legalese.entry(text.clone()).or_default();
            if !nodes.contains(&r) {
                nodes.push(r);
            }
        }
    }

    /// Every class in exactly one partition.
    pub fn class_count(&self) -> usize {
        [
            &self.classes,
            &self.compat_classes,
            &self.obsolete_classes,
            &self.classes_with_obsolete_members,
            &self.service_classes,
        ]
        .iter()
        .map(|m| m.values().map(Vec::len).sum::<usize>())
        .sum()
    }
}

/// Obsolete beats obsolete members, which beats compat, then service.
fn classify(tree: &Tree, node: &Node) -> Partition {
    if node.status() == Status::Obsolete {
        return Partition::Obsolete;
    }
    let has_obsolete_member = node
        .children()
        .iter()
        .any(|child| tree.get(child).status() == Status::Obsolete);
    if has_obsolete_member {
        return Partition::ObsoleteMembers;
    }
    if node.status() == Status::Compat {
        return Partition::Compat;
    }
    if node
        .payload()
        .as_class()
        .is_some_and(|data| data.service_name.is_some())
    {
        return Partition::Service;
    }
    Partition::Main
}

fn push(map: &mut NodeMultiMap, key: &str, node: NodeRef) {
    let nodes = map.entry(key.to_string()).or_default();
    if !nodes.contains(&node) {
        nodes.push(node);
    }
}
