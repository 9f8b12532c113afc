//! Two-pass base class resolution and ancestor flattening.
//!
//! Bases are recorded by name while parsing, possibly before the class they
//! name exists. Pass 1 binds everything already visible; pass 2 retries the
//! deferred bases, this time also looking through bases bound in pass 1.
//! Whatever is still unbound after pass 2 is reported, never fatal.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use super::{FindFlags, Tree};
use crate::base::{NodeId, NodeRef, TreeId};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::forest::ForestView;
use crate::node::{DerivedClass, Node, NodeKind, Virtualness};

impl Tree {
    /// Bind the declared bases of every class in the tree.
    ///
    /// Lookup order for one base: relative to the class's enclosing scope,
    /// absolute in this tree, then each other tree of `view` in search
    /// order. Returns an `UnresolvedBase` diagnostic per base still unbound
    /// after the second pass.
    pub fn resolve_inheritance(&mut self, view: &ForestView<'_>) -> Vec<Diagnostic> {
        let classes: Vec<NodeId> = self
            .preorder(NodeId::ROOT)
            .into_iter()
            .filter(|&id| self.get(id).kind() == NodeKind::Class)
            .collect();

        // Pass 1
        let mut deferred = Vec::new();
        for &class in &classes {
            for index in 0..self.base_count(class) {
                if self.base_is_bound(class, index) {
                    continue;
                }
                match self.lookup_base(class, index, view, FindFlags::NONE) {
                    Some(base) => self.bind_base(class, index, base),
                    None => deferred.push((class, index)),
                }
            }
        }

        // Pass 2
        let mut diagnostics = Vec::new();
        for (class, index) in deferred {
            match self.lookup_base(class, index, view, FindFlags::SEARCH_BASE_CLASSES) {
                Some(base) => self.bind_base(class, index, base),
                None => diagnostics.push(self.unresolved_base(class, index)),
            }
        }

        self.mark_reimplemented(view);
        tracing::debug!(
            "[INHERIT] {}: {} classes, {} unresolved bases",
            self.module(),
            classes.len(),
            diagnostics.len()
        );
        diagnostics
    }

    fn base_count(&self, class: NodeId) -> usize {
        self.get(class)
            .payload()
            .as_class()
            .map_or(0, |data| data.bases.len())
    }

    fn base_is_bound(&self, class: NodeId, index: usize) -> bool {
        self.get(class)
            .payload()
            .as_class()
            .is_some_and(|data| data.bases[index].is_resolved())
    }

    fn lookup_base(
        &self,
        class: NodeId,
        index: usize,
        view: &ForestView<'_>,
        flags: FindFlags,
    ) -> Option<NodeRef> {
        let node = self.get(class);
        let segments: Vec<SmolStr> = node.payload().as_class()?.bases[index].path.clone();
        let path: Vec<&str> = segments.iter().map(SmolStr::as_str).collect();
        let is_class = |n: &Node| n.kind() == NodeKind::Class;

        if let Some(found) = self
            .find_node_where(&path, node.parent(), flags | FindFlags::NON_FUNCTION, is_class)
            .filter(|&found| found != class)
        {
            return Some(self.node_ref(found));
        }
        if let Some(found) = self.find_class_node(&path).filter(|&found| found != class) {
            return Some(self.node_ref(found));
        }
        view.others()
            .find_map(|tree| tree.find_class_node(&path).map(|found| tree.node_ref(found)))
    }

    fn bind_base(&mut self, class: NodeId, index: usize, base: NodeRef) {
        let Some(data) = self.get_mut(class).payload_mut().as_class_mut() else {
            return;
        };
        let related = &mut data.bases[index];
        related.node = Some(base);
        let access = related.access;
        tracing::trace!(
            "[INHERIT] {}: {} : {} -> {}",
            self.module(),
            self.full_name(class),
            self.get(class)
                .payload()
                .as_class()
                .map(|d| d.bases[index].path_string())
                .unwrap_or_default(),
            base
        );

        if base.tree == self.id() {
            if let Some(data) = self
                .node_mut(base.node)
                .and_then(|n| n.payload_mut().as_class_mut())
            {
                let derived = DerivedClass {
                    access,
                    node: class,
                };
                if !data.derived.contains(&derived) {
                    data.derived.push(derived);
                }
            }
        }
    }

    fn unresolved_base(&self, class: NodeId, index: usize) -> Diagnostic {
        let node = self.get(class);
        let base = node
            .payload()
            .as_class()
            .map(|data| data.bases[index].path_string())
            .unwrap_or_default();
        Diagnostic::warning(
            DiagnosticKind::UnresolvedBase,
            self.module(),
            node.location().clone(),
            format!(
                "base class '{}' of '{}' not found",
                base,
                self.full_name(class)
            ),
        )
        .with_node(self.node_ref(class))
    }

    // ========================================================================
    // REIMPLEMENTED FUNCTIONS
    // ========================================================================

    /// Link each member function to the virtual function it overrides in
    /// the nearest ancestor that declares one with the same signature.
    fn mark_reimplemented(&mut self, view: &ForestView<'_>) {
        let mut marks: Vec<(NodeId, NodeRef)> = Vec::new();
        for (id, node) in self.iter() {
            let Some(function) = node.payload().as_function() else {
                continue;
            };
            let Some(parent) = node.parent() else {
                continue;
            };
            if self.get(parent).kind() != NodeKind::Class {
                continue;
            }
            for ancestor in self.walk_ancestors(parent, view) {
                let Some(tree) = self.tree_for(ancestor.tree, view) else {
                    continue;
                };
                let Some(base_class) = tree.node(ancestor.node) else {
                    continue;
                };
                let hit = base_class
                    .children()
                    .find(node.name())
                    .iter()
                    .copied()
                    .find(|&candidate| {
                        tree.get(candidate).payload().as_function().is_some_and(|f| {
                            f.virtualness != Virtualness::NonVirtual
                                && f.same_signature(function)
                        })
                    });
                if let Some(hit) = hit {
                    marks.push((id, tree.node_ref(hit)));
                    break;
                }
            }
        }

        for (id, from) in marks {
            if let Some(data) = self.get_mut(id).payload_mut().as_function_mut() {
                data.reimplemented_from = Some(from);
                if data.virtualness == Virtualness::NonVirtual {
                    data.virtualness = Virtualness::ImpureVirtual;
                }
            }
        }
    }

    // ========================================================================
    // ANCESTORS
    // ========================================================================

    /// Cache the flattened ancestor list on every class.
    pub fn fix_inheritance(&mut self, view: &ForestView<'_>) {
        let computed: Vec<(NodeId, Vec<NodeRef>)> = self
            .iter()
            .filter(|(_, node)| node.kind() == NodeKind::Class)
            .map(|(id, _)| (id, self.walk_ancestors(id, view)))
            .collect();
        for (id, ancestors) in computed {
            if let Some(data) = self.get_mut(id).payload_mut().as_class_mut() {
                data.ancestors = Some(ancestors);
            }
        }
    }

    /// All ancestors of `class`, nearest first in declaration order
    /// (preorder over the base graph). Uses the cache when present.
    pub fn all_base_classes(&self, class: NodeId, view: &ForestView<'_>) -> Vec<NodeRef> {
        match self.node(class).and_then(|n| n.payload().as_class()) {
            Some(data) => match &data.ancestors {
                Some(cached) => cached.clone(),
                None => self.walk_ancestors(class, view),
            },
            None => Vec::new(),
        }
    }

    fn walk_ancestors(&self, class: NodeId, view: &ForestView<'_>) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut seen = FxHashSet::default();
        seen.insert(self.node_ref(class));
        self.collect_ancestors(self, class, view, &mut seen, &mut out);
        out
    }

    fn collect_ancestors(
        &self,
        tree: &Tree,
        class: NodeId,
        view: &ForestView<'_>,
        seen: &mut FxHashSet<NodeRef>,
        out: &mut Vec<NodeRef>,
    ) {
        let Some(data) = tree.node(class).and_then(|n| n.payload().as_class()) else {
            return;
        };
        for base in &data.bases {
            let Some(base) = base.node else {
                continue;
            };
            if !seen.insert(base) {
                continue;
            }
            out.push(base);
            if let Some(owner) = self.tree_for(base.tree, view) {
                self.collect_ancestors(owner, base.node, view, seen, out);
            }
        }
    }

    /// This tree for its own id, otherwise the view's tree.
    fn tree_for<'s>(&'s self, id: TreeId, view: &'s ForestView<'_>) -> Option<&'s Tree> {
        if id == self.id() {
            Some(self)
        } else {
            view.tree(id)
        }
    }
}
