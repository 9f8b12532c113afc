//! The ordered collection of trees and cross-module dispatch.
//!
//! One primary tree (the module being documented, mutable) and any number
//! of index trees (other modules, read-only once resolution starts). Every
//! query walks the search order and returns the first tree-level hit. A
//! relative context is honored only by the first tree tried, and only when
//! it belongs to that tree; every later tree searches from its own root.

use smol_str::SmolStr;

use crate::base::{NodeId, NodeRef, TreeId, split_path};
use crate::error::{DatabaseError, Result};
use crate::node::{FunctionData, Node, NodeKind};
use crate::tree::{FindFlags, TargetMatch, Tree};

// ============================================================================
// FOREST
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Forest {
    trees: Vec<Tree>,
    primary: Option<TreeId>,
    search_order: Vec<TreeId>,
    priority: Vec<SmolStr>,
}

/// A target hit with the tree it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestTarget {
    pub node: NodeRef,
    pub reference: SmolStr,
    pub ambiguous: Vec<NodeRef>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn tree(&self, id: TreeId) -> Option<&Tree> {
        self.trees.get(id.index())
    }

    /// Mutable access to a tree that has not been frozen.
    pub(crate) fn tree_mut(&mut self, id: TreeId) -> Option<&mut Tree> {
        self.trees.get_mut(id.index()).filter(|t| !t.is_read_only())
    }

    pub fn primary(&self) -> Option<TreeId> {
        self.primary
    }

    pub fn primary_tree(&self) -> Option<&Tree> {
        self.primary.and_then(|id| self.tree(id))
    }

    pub fn primary_mut(&mut self) -> Option<&mut Tree> {
        let id = self.primary?;
        self.tree_mut(id)
    }

    pub fn node(&self, node: NodeRef) -> Option<&Node> {
        self.tree(node.tree)?.node(node.node)
    }

    pub fn full_name(&self, node: NodeRef) -> Option<String> {
        self.tree(node.tree).map(|t| t.full_name(node.node))
    }

    pub fn module_of(&self, node: NodeRef) -> Option<&str> {
        self.tree(node.tree).map(Tree::module)
    }

    // ========================================================================
    // TREE REGISTRATION
    // ========================================================================

    /// Create the primary tree. There is exactly one per forest.
    pub fn new_primary_tree(&mut self, module: impl Into<SmolStr>) -> Result<TreeId> {
        let module = module.into();
        if let Some(existing) = self.primary_tree() {
            return Err(DatabaseError::invariant(
                module,
                format!("primary tree already exists for '{}'", existing.module()),
            ));
        }
        let id = TreeId::new(self.trees.len());
        self.trees.push(Tree::new(id, module.clone()));
        self.primary = Some(id);
        self.set_search_order();
        tracing::info!("[FOREST] primary tree '{}' is {:?}", module, id);
        Ok(id)
    }

    /// The id the next added tree will get. Index loading pre-assigns ids
    /// from here so trees can be built in parallel.
    pub fn next_tree_id(&self) -> TreeId {
        TreeId::new(self.trees.len())
    }

    /// Append an index tree built with `next_tree_id()`.
    pub fn add_index_tree(&mut self, tree: Tree) -> Result<TreeId> {
        let expected = self.next_tree_id();
        if tree.id() != expected {
            return Err(DatabaseError::invariant(
                tree.module(),
                format!("index tree built as {:?} but appended as {:?}", tree.id(), expected),
            ));
        }
        tracing::info!("[FOREST] index tree '{}' is {:?}", tree.module(), expected);
        self.trees.push(tree);
        self.set_search_order();
        Ok(expected)
    }

    // ========================================================================
    // SEARCH ORDER
    // ========================================================================

    /// Rebuild the search order from scratch: the primary tree, then index
    /// trees in priority order, then the remaining index trees in
    /// registration order.
    pub fn set_search_order(&mut self) {
        let mut order = Vec::with_capacity(self.trees.len());
        order.extend(self.primary);
        for module in &self.priority {
            for tree in &self.trees {
                if Some(tree.id()) != self.primary
                    && tree.module() == module.as_str()
                    && !order.contains(&tree.id())
                {
                    order.push(tree.id());
                }
            }
        }
        for tree in &self.trees {
            if !order.contains(&tree.id()) {
                order.push(tree.id());
            }
        }
        tracing::debug!("[FOREST] search order: {:?}", order);
        self.search_order = order;
    }

    /// Use `modules` as the index tree priority list and rebuild the order.
    pub fn set_search_priority<S: AsRef<str>>(&mut self, modules: &[S]) {
        self.priority = modules.iter().map(|m| SmolStr::new(m.as_ref())).collect();
        self.set_search_order();
    }

    pub fn search_order(&self) -> &[TreeId] {
        &self.search_order
    }

    /// Trees in search order. Each call starts over from the current order.
    pub fn search_trees(&self) -> SearchTrees<'_> {
        SearchTrees {
            forest: self,
            position: 0,
        }
    }

    /// Tree roots in search order.
    pub fn roots(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.search_trees().map(|tree| tree.node_ref(tree.root()))
    }

    // ========================================================================
    // SPLIT BORROWS
    // ========================================================================

    /// The mutable tree `id` plus a shared view of all the others.
    pub fn split_tree_mut(&mut self, id: TreeId) -> Option<(&mut Tree, ForestView<'_>)> {
        if self.tree(id)?.is_read_only() {
            return None;
        }
        let (before, rest) = self.trees.split_at_mut(id.index());
        let (target, after) = rest.split_first_mut()?;
        let trees = before
            .iter()
            .map(Some)
            .chain(std::iter::once(None))
            .chain(after.iter().map(Some))
            .collect();
        let view = ForestView {
            trees,
            search_order: &self.search_order,
        };
        Some((target, view))
    }

    pub fn split_primary_mut(&mut self) -> Option<(&mut Tree, ForestView<'_>)> {
        let id = self.primary?;
        self.split_tree_mut(id)
    }

    /// Shared view of every tree.
    pub fn view(&self) -> ForestView<'_> {
        ForestView {
            trees: self.trees.iter().map(Some).collect(),
            search_order: &self.search_order,
        }
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Try each tree in search order. `relative` reaches only the first
    /// tree, and only if it lives there.
    fn first_hit<T>(
        &self,
        relative: Option<NodeRef>,
        mut query: impl FnMut(&Tree, Option<NodeId>) -> Option<T>,
    ) -> Option<T> {
        let mut relative = relative;
        for tree in self.search_trees() {
            let local = relative.filter(|r| r.tree == tree.id()).map(|r| r.node);
            if let Some(found) = query(tree, local) {
                return Some(found);
            }
            relative = None;
        }
        None
    }

    pub fn find_node(
        &self,
        path: &[&str],
        relative: Option<NodeRef>,
        flags: FindFlags,
    ) -> Option<NodeRef> {
        self.first_hit(relative, |tree, local| {
            tree.find_node(path, local, flags)
                .map(|found| tree.node_ref(found))
        })
    }

    /// Resolve a link target naming a code entity. `name()` is a function;
    /// anything else may be any non-function node, an inherited member or
    /// an enum value.
    pub fn resolve_target(&self, target: &str, relative: Option<NodeRef>) -> Option<NodeRef> {
        if let Some(function) = target.strip_suffix("()") {
            let path = split_path(function);
            return self.first_hit(relative, |tree, local| {
                tree.find_function_node(&path, local, FindFlags::SEARCH_BASE_CLASSES)
                    .map(|found| tree.node_ref(found))
            });
        }
        let path = split_path(target);
        let flags =
            FindFlags::SEARCH_BASE_CLASSES | FindFlags::SEARCH_ENUM_VALUES | FindFlags::NON_FUNCTION;
        self.find_node(&path, relative, flags)
    }

    /// Resolve a type name; only type-like nodes qualify.
    pub fn resolve_type(&self, name: &str, relative: Option<NodeRef>) -> Option<NodeRef> {
        let path = split_path(name);
        self.first_hit(relative, |tree, local| {
            tree.find_type_node(&path, local)
                .map(|found| tree.node_ref(found))
        })
    }

    pub fn find_class_node(&self, path: &[&str]) -> Option<NodeRef> {
        self.first_hit(None, |tree, _| {
            tree.find_class_node(path).map(|found| tree.node_ref(found))
        })
    }

    pub fn find_qml_type_node(&self, path: &[&str]) -> Option<NodeRef> {
        self.first_hit(None, |tree, _| {
            tree.find_qml_type_node(path)
                .map(|found| tree.node_ref(found))
        })
    }

    pub fn find_relates_node(&self, path: &[&str]) -> Option<NodeRef> {
        self.first_hit(None, |tree, _| {
            tree.find_relates_node(path)
                .map(|found| tree.node_ref(found))
        })
    }

    pub fn find_node_by_name_and_kind(&self, path: &[&str], kinds: &[NodeKind]) -> Option<NodeRef> {
        self.first_hit(None, |tree, _| {
            tree.find_node_by_kind(path, kinds)
                .map(|found| tree.node_ref(found))
        })
    }

    /// The overload at `path` whose signature matches `signature`.
    pub fn find_function_matching(
        &self,
        path: &[&str],
        signature: &FunctionData,
    ) -> Option<NodeRef> {
        self.first_hit(None, |tree, _| {
            tree.find_function_matching(path, signature)
                .map(|found| tree.node_ref(found))
        })
    }

    pub fn find_doc_node_by_title(&self, title: &str, qml_module: Option<&str>) -> Option<NodeRef> {
        self.first_hit(None, |tree, _| {
            tree.find_doc_node_by_title(title, qml_module)
                .map(|found| tree.node_ref(found))
        })
    }

    pub fn find_document_by_name(&self, name: &str) -> Option<NodeRef> {
        self.first_hit(None, |tree, _| {
            tree.find_document_by_name(name)
                .map(|found| tree.node_ref(found))
        })
    }

    /// First tree in search order that has a record for `target`.
    /// Ambiguity is only detected within that tree.
    pub fn find_unambiguous_target(
        &self,
        target: &str,
        qml_module: Option<&str>,
    ) -> Option<ForestTarget> {
        self.first_hit(None, |tree, _| {
            tree.find_unambiguous_target(target, qml_module)
                .map(|hit: TargetMatch| ForestTarget {
                    node: tree.node_ref(hit.node),
                    reference: hit.reference,
                    ambiguous: hit.ambiguous.iter().map(|&n| tree.node_ref(n)).collect(),
                })
        })
    }

    /// The anchor reference `target` has on `node`.
    pub fn find_target(&self, target: &str, node: NodeRef) -> Option<&str> {
        self.tree(node.tree)?.find_target(target, node.node)
    }

    pub fn all_base_classes(&self, class: NodeRef) -> Vec<NodeRef> {
        match self.tree(class.tree) {
            Some(tree) => tree.all_base_classes(class.node, &self.view()),
            None => Vec::new(),
        }
    }
}

// ============================================================================
// ITERATION
// ============================================================================

/// Lazy walk over the search order, re-derived on every call to
/// [`Forest::search_trees`].
#[derive(Debug, Clone)]
pub struct SearchTrees<'a> {
    forest: &'a Forest,
    position: usize,
}

impl<'a> Iterator for SearchTrees<'a> {
    type Item = &'a Tree;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&id) = self.forest.search_order.get(self.position) {
            self.position += 1;
            if let Some(tree) = self.forest.tree(id) {
                return Some(tree);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.forest.search_order.len().saturating_sub(self.position);
        (0, Some(remaining))
    }
}

// ============================================================================
// VIEW
// ============================================================================

/// Shared access to every tree except the one being resolved.
///
/// Resolution passes hold the tree under work mutably and see the rest of
/// the forest through this view. Bindings into other trees are only ever
/// followed through it.
#[derive(Debug, Clone)]
pub struct ForestView<'a> {
    trees: Vec<Option<&'a Tree>>,
    search_order: &'a [TreeId],
}

impl<'a> ForestView<'a> {
    /// A view of nothing, for resolving a tree on its own.
    pub fn detached() -> Self {
        Self {
            trees: Vec::new(),
            search_order: &[],
        }
    }

    pub fn tree(&self, id: TreeId) -> Option<&'a Tree> {
        self.trees.get(id.index()).copied().flatten()
    }

    /// Visible trees in search order.
    pub fn others(&self) -> impl Iterator<Item = &'a Tree> + '_ {
        self.search_order.iter().filter_map(|&id| self.tree(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Access, NodePayload};

    fn index_tree(forest: &Forest, module: &str) -> Tree {
        Tree::new(forest.next_tree_id(), module)
    }

    #[test]
    fn test_search_order_primary_first_then_registration() {
        let mut forest = Forest::new();
        let core = forest.add_index_tree(index_tree(&forest, "QtCore")).unwrap();
        let primary = forest.new_primary_tree("QtWidgets").unwrap();
        let gui = forest.add_index_tree(index_tree(&forest, "QtGui")).unwrap();

        assert_eq!(forest.search_order(), &[primary, core, gui]);

        forest.set_search_priority(&["QtGui"]);
        assert_eq!(forest.search_order(), &[primary, gui, core]);

        forest.set_search_order();
        assert_eq!(forest.search_order(), &[primary, gui, core]);
    }

    #[test]
    fn test_second_primary_is_rejected() {
        let mut forest = Forest::new();
        forest.new_primary_tree("QtWidgets").unwrap();
        assert!(forest.new_primary_tree("QtGui").is_err());
    }

    #[test]
    fn test_misnumbered_index_tree_is_rejected() {
        let mut forest = Forest::new();
        let err = forest.add_index_tree(Tree::new(TreeId(5), "QtCore")).unwrap_err();
        assert!(matches!(err, DatabaseError::Invariant { .. }));
    }

    #[test]
    fn test_search_trees_restarts_from_current_order() {
        let mut forest = Forest::new();
        forest.new_primary_tree("QtWidgets").unwrap();
        let first: Vec<TreeId> = forest.search_trees().map(Tree::id).collect();
        forest.add_index_tree(index_tree(&forest, "QtCore")).unwrap();
        let second: Vec<TreeId> = forest.search_trees().map(Tree::id).collect();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(forest.roots().count(), 2);
    }

    #[test]
    fn test_relative_context_only_reaches_first_tree() {
        let mut forest = Forest::new();
        let primary = forest.new_primary_tree("QtWidgets").unwrap();
        let mut core = index_tree(&forest, "QtCore");
        let core_bar = core.create_node(NodeId::ROOT, "Bar", NodePayload::class()).unwrap();
        let core_id = forest.add_index_tree(core).unwrap();

        let tree = forest.primary_mut().unwrap();
        let foo = tree.create_node(NodeId::ROOT, "Foo", NodePayload::Namespace).unwrap();
        let foo_bar = tree.create_node(foo, "Bar", NodePayload::class()).unwrap();

        let relative = Some(NodeRef::new(primary, foo));
        assert_eq!(
            forest.find_node(&["Bar"], relative, FindFlags::NONE),
            Some(NodeRef::new(primary, foo_bar))
        );
        assert_eq!(
            forest.find_node(&["Bar"], None, FindFlags::NONE),
            Some(NodeRef::new(core_id, core_bar))
        );
    }

    #[test]
    fn test_split_primary_sees_index_trees() {
        let mut forest = Forest::new();
        let mut core = index_tree(&forest, "QtCore");
        let object = core.create_node(NodeId::ROOT, "QObject", NodePayload::class()).unwrap();
        let core_id = forest.add_index_tree(core).unwrap();
        forest.new_primary_tree("QtWidgets").unwrap();

        let (tree, view) = forest.split_primary_mut().unwrap();
        let widget = tree.create_node(NodeId::ROOT, "QWidget", NodePayload::class()).unwrap();
        tree.add_base_class(widget, "QObject", Access::Public).unwrap();
        assert!(tree.resolve_inheritance(&view).is_empty());
        tree.fix_inheritance(&view);
        let widget = tree.node_ref(widget);

        assert_eq!(forest.all_base_classes(widget), vec![NodeRef::new(core_id, object)]);
    }

    #[test]
    fn test_resolve_target_function_and_member() {
        let mut forest = Forest::new();
        let primary = forest.new_primary_tree("QtCore").unwrap();
        let tree = forest.primary_mut().unwrap();
        let class = tree.create_node(NodeId::ROOT, "QTimer", NodePayload::class()).unwrap();
        let start = tree.create_node(class, "start", NodePayload::function(vec![])).unwrap();
        let interval = tree.create_node(class, "interval", NodePayload::property()).unwrap();

        assert_eq!(
            forest.resolve_target("QTimer::start()", None),
            Some(NodeRef::new(primary, start))
        );
        assert_eq!(
            forest.resolve_target("interval", Some(NodeRef::new(primary, class))),
            Some(NodeRef::new(primary, interval))
        );
        assert_eq!(forest.resolve_type("QTimer", None), Some(NodeRef::new(primary, class)));
        assert!(forest.resolve_target("QTimer::stop()", None).is_none());
    }

    #[test]
    fn test_frozen_tree_is_not_split() {
        let mut forest = Forest::new();
        let mut core = index_tree(&forest, "QtCore");
        core.freeze();
        let core_id = forest.add_index_tree(core).unwrap();
        assert!(forest.split_tree_mut(core_id).is_none());
        assert!(forest.tree_mut(core_id).is_none());
    }
}
