//! The top-level documentation database.
//!
//! A [`Database`] owns the [`Forest`], the diagnostics of the run, the
//! collection registry and the aggregated collections. It is built once per
//! run and moves through a fixed lifecycle:
//!
//! ```text
//! Empty → Loading → Resolved → Aggregated → Queryable
//! ```
//!
//! The parser feeds facts in while `Loading`. [`Database::resolve`] freezes
//! the index trees and binds everything in the primary tree. [`Database::build_collections`]
//! aggregates, and [`Database::finalize`] hands the result to generators.

mod collections;
mod registry;

pub use collections::{Collections, NodeMultiMap};
pub use registry::{CollectionKind, Registry, qml_module_variants};

use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use rayon::prelude::*;
use smol_str::SmolStr;

use crate::base::{Location, NodeId, NodeRef, TreeId, join_path, split_path};
use crate::config::DatabaseConfig;
use crate::diagnostics::{Diagnostic, DiagnosticCollector, DiagnosticKind, RelatedInfo};
use crate::error::{DatabaseError, Result};
use crate::forest::{Forest, ForestTarget};
use crate::index::{read_index_file, tree_to_index, write_index_file};
use crate::node::{
    Access, FunctionData, FunctionRole, Node, NodeKind, NodePayload, TargetKind,
};
use crate::tree::{FindFlags, Tree};

/// Lifecycle of a [`Database`]. There is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Empty,
    Loading,
    Resolved,
    Aggregated,
    Queryable,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Empty => "empty",
            Phase::Loading => "loading",
            Phase::Resolved => "resolved",
            Phase::Aggregated => "aggregated",
            Phase::Queryable => "queryable",
        }
    }
}

/// Where a documentation link points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub node: NodeRef,
    /// Fragment inside the node's page, if the link names an anchor.
    pub anchor: Option<SmolStr>,
}

#[derive(Debug)]
pub struct Database {
    config: DatabaseConfig,
    forest: Forest,
    phase: Phase,
    diagnostics: DiagnosticCollector,
    registry: Registry,
    collections: Collections,
    /// Namespaces named by `using namespace`, in the order they were opened.
    open_namespaces: IndexSet<SmolStr>,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        let mut forest = Forest::new();
        forest.set_search_priority(&config.search_priority);
        Self {
            config,
            forest,
            phase: Phase::Empty,
            diagnostics: DiagnosticCollector::new(),
            registry: Registry::new(),
            collections: Collections::default(),
            open_namespaces: IndexSet::new(),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.diagnostics()
    }

    /// True if the run produced any recoverable problem.
    pub fn has_warnings(&self) -> bool {
        self.diagnostics.has_warnings()
    }

    pub fn primary_tree(&self) -> Option<&Tree> {
        self.forest.primary_tree()
    }

    pub fn primary_root(&self) -> Option<NodeRef> {
        self.primary_tree().map(|tree| tree.node_ref(tree.root()))
    }

    pub fn node(&self, node: NodeRef) -> Option<&Node> {
        self.forest.node(node)
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    // ========================================================================
    // PARSER INTERFACE
    // ========================================================================

    fn ensure_loading(&self) -> Result<()> {
        if self.phase >= Phase::Resolved {
            return Err(DatabaseError::Frozen(self.phase.as_str()));
        }
        Ok(())
    }

    fn primary_mut(&mut self) -> Result<&mut Tree> {
        self.ensure_loading()?;
        self.forest.primary_mut().ok_or(DatabaseError::NoPrimaryTree)
    }

    pub fn new_primary_tree(&mut self, module: impl Into<SmolStr>) -> Result<TreeId> {
        self.ensure_loading()?;
        let id = self.forest.new_primary_tree(module)?;
        self.phase = Phase::Loading;
        Ok(id)
    }

    /// Create a node in the primary tree.
    ///
    /// A function identical to an existing overload is reported as
    /// `DuplicateDefinition` and the first definition's id is returned.
    pub fn create_node(
        &mut self,
        parent: NodeId,
        name: impl Into<SmolStr>,
        payload: NodePayload,
    ) -> Result<NodeId> {
        let tree = self.primary_mut()?;
        match tree.create_node(parent, name, payload) {
            Err(DatabaseError::DuplicateDefinition {
                name,
                signature,
                existing,
            }) => {
                let location = tree.get(existing).location().clone();
                let diagnostic = Diagnostic::warning(
                    DiagnosticKind::DuplicateDefinition,
                    tree.module(),
                    location.clone(),
                    format!(
                        "'{}{}' is already declared in '{}'",
                        name,
                        signature,
                        tree.full_name(parent)
                    ),
                )
                .with_node(tree.node_ref(existing))
                .with_related(RelatedInfo {
                    node: tree.node_ref(existing),
                    location,
                    message: "first declared here".to_string(),
                });
                self.diagnostics.add(diagnostic);
                Ok(existing)
            }
            other => other,
        }
    }

    /// Mutable access to a primary tree node while loading.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        let tree = self.primary_mut()?;
        let module = SmolStr::new(tree.module());
        tree.node_mut(id)
            .ok_or(DatabaseError::UnknownNode { module, node: id })
    }

    pub fn record_base_class(&mut self, class: NodeId, base: &str, access: Access) -> Result<()> {
        self.primary_mut()?.add_base_class(class, base, access)
    }

    pub fn record_property_accessor(
        &mut self,
        property: NodeId,
        role: FunctionRole,
        function_name: &str,
    ) -> Result<()> {
        self.primary_mut()?
            .add_property_accessor(property, role, function_name)
    }

    /// Record a named anchor on `node`; registered by `resolve`.
    pub fn record_target(&mut self, node: NodeId, name: &str, kind: TargetKind) -> Result<()> {
        self.node_mut(node)?.add_anchor(kind, name, None);
        Ok(())
    }

    fn add_to_collection(
        &mut self,
        kind: CollectionKind,
        name: &str,
        node: NodeId,
    ) -> Result<NodeId> {
        self.ensure_loading()?;
        let tree = self
            .forest
            .primary_mut()
            .ok_or(DatabaseError::NoPrimaryTree)?;
        if tree.node(node).is_none() {
            return Err(DatabaseError::UnknownNode {
                module: SmolStr::new(tree.module()),
                node,
            });
        }
        let collection = self.registry.get_or_create(tree, kind, name)?;
        if let Some(data) = tree.get_mut(collection).payload_mut().as_collection_mut() {
            data.add_member(node);
        }
        Ok(collection)
    }

    /// Add `node` to group `group`, creating the group on first use.
    pub fn add_to_group(&mut self, group: &str, node: NodeId) -> Result<NodeId> {
        let collection = self.add_to_collection(CollectionKind::Group, group, node)?;
        self.node_mut(node)?.add_group(group);
        Ok(collection)
    }

    pub fn add_to_module(&mut self, module: &str, node: NodeId) -> Result<NodeId> {
        let collection = self.add_to_collection(CollectionKind::Module, module, node)?;
        self.node_mut(node)?.set_module(module);
        Ok(collection)
    }

    /// Add `node` to the QML module identified by `qmid` (e.g.
    /// `"QtQuick 2.0"`). QML types also enter the QML type map.
    pub fn add_to_qml_module(&mut self, qmid: &str, node: NodeId) -> Result<NodeId> {
        let name = qml_module_variants(qmid)
            .into_iter()
            .next()
            .unwrap_or_else(|| qmid.to_string());
        let collection = self.add_to_collection(CollectionKind::QmlModule, &name, node)?;
        let target = self.node_mut(node)?;
        target.set_qml_module(qmid);
        if target.kind() == NodeKind::QmlType {
            let type_name = target.name().to_string();
            let r = self
                .primary_tree()
                .map(|tree| tree.node_ref(node))
                .ok_or(DatabaseError::NoPrimaryTree)?;
            self.registry.register_qml_type(qmid, &type_name, r);
        }
        Ok(collection)
    }

    pub fn find_group(&self, name: &str) -> Option<NodeRef> {
        self.registry.find(CollectionKind::Group, name)
    }

    pub fn find_module(&self, name: &str) -> Option<NodeRef> {
        self.registry.find(CollectionKind::Module, name)
    }

    pub fn find_qml_module(&self, name: &str) -> Option<NodeRef> {
        self.registry.find(CollectionKind::QmlModule, name)
    }

    /// QML type `name` in module `qmid`. An empty `qmid` searches every
    /// tree by name.
    pub fn find_qml_type(&self, qmid: &str, name: &str) -> Option<NodeRef> {
        if qmid.trim().is_empty() {
            return self.forest.find_qml_type_node(&split_path(name));
        }
        self.registry.find_qml_type(qmid, name)
    }

    // ========================================================================
    // INDEX FILES
    // ========================================================================

    /// Load index trees, in parallel when configured.
    ///
    /// Trees get consecutive ids in `paths` order whatever order they finish
    /// loading in. After appending, the bases of every index tree are bound
    /// again against the whole forest. Index trees stay writable for that
    /// until `resolve` freezes them. Any bad file aborts with
    /// [`DatabaseError::MalformedIndex`] before anything is appended.
    pub fn read_indexes(&mut self, paths: &[PathBuf]) -> Result<Vec<TreeId>> {
        self.ensure_loading()?;
        let first = self.forest.next_tree_id().index();
        let load = |(i, path): (usize, &PathBuf)| -> Result<Tree> {
            let mut tree = read_index_file(path, TreeId::new(first + i))?;
            tree.resolve_targets(NodeId::ROOT);
            Ok(tree)
        };
        let trees: Vec<Tree> = if self.config.parallel_index_loading {
            paths.par_iter().enumerate().map(load).collect::<Result<_>>()?
        } else {
            paths.iter().enumerate().map(load).collect::<Result<_>>()?
        };

        let mut ids = Vec::with_capacity(trees.len());
        for tree in trees {
            self.registry.register_tree(&tree);
            ids.push(self.forest.add_index_tree(tree)?);
        }
        self.relink_index_trees();
        if self.phase == Phase::Empty {
            self.phase = Phase::Loading;
        }
        tracing::info!("[DATABASE] loaded {} index files", ids.len());
        Ok(ids)
    }

    /// Read the index files named by the configuration.
    pub fn read_configured_indexes(&mut self) -> Result<Vec<TreeId>> {
        let paths = self.config.index_files.clone();
        self.read_indexes(&paths)
    }

    fn index_tree_ids(&self) -> Vec<TreeId> {
        let primary = self.forest.primary();
        self.forest
            .trees()
            .iter()
            .map(Tree::id)
            .filter(|&id| Some(id) != primary)
            .collect()
    }

    /// Bind the unbound bases of every index tree, then flatten ancestors.
    ///
    /// All trees are bound before any is flattened, so the cached ancestor
    /// lists do not depend on load order. Bases into modules that are not
    /// loaded stay unbound without a diagnostic.
    fn relink_index_trees(&mut self) {
        let ids = self.index_tree_ids();
        for &id in &ids {
            let Some((tree, view)) = self.forest.split_tree_mut(id) else {
                continue;
            };
            let mut unbound = tree.resolve_inheritance(&view).len();
            unbound += self.resolve_qml_links(id).len();
            tracing::debug!("[DATABASE] index tree {:?}: {} links left unbound", id, unbound);
        }
        for &id in &ids {
            if let Some((tree, view)) = self.forest.split_tree_mut(id) {
                tree.fix_inheritance(&view);
            }
        }
    }

    /// Write the primary tree as an index file.
    pub fn generate_index(&self, path: &Path) -> Result<()> {
        let tree = self.primary_tree().ok_or(DatabaseError::NoPrimaryTree)?;
        let file = tree_to_index(tree, &self.config.project, &self.config.version);
        write_index_file(path, &file)
    }

    // ========================================================================
    // RESOLUTION
    // ========================================================================

    /// Run every resolution pass over the primary tree and freeze it.
    ///
    /// Order: inheritance, ancestor flattening, property accessors, QML
    /// bases and C++ counterparts, targets, then collision reports.
    pub fn resolve(&mut self) -> Result<()> {
        match self.phase {
            Phase::Empty => return Err(DatabaseError::NoPrimaryTree),
            Phase::Loading => {}
            _ => return Err(DatabaseError::Frozen(self.phase.as_str())),
        }
        let primary = self.forest.primary().ok_or(DatabaseError::NoPrimaryTree)?;
        if let Some(tree) = self.forest.tree(primary) {
            tree.check_invariants()?;
        }
        for id in self.index_tree_ids() {
            if let Some(tree) = self.forest.tree_mut(id) {
                tree.freeze();
            }
        }

        let (tree, view) = self
            .forest
            .split_tree_mut(primary)
            .ok_or(DatabaseError::NoPrimaryTree)?;
        let mut found = tree.resolve_inheritance(&view);
        tree.fix_inheritance(&view);
        found.extend(tree.resolve_properties());

        found.extend(self.resolve_qml_links(primary));

        let tree = self
            .forest
            .primary_mut()
            .ok_or(DatabaseError::NoPrimaryTree)?;
        tree.resolve_targets(NodeId::ROOT);
        found.extend(tree.collision_diagnostics());

        tracing::info!(
            "[DATABASE] resolved '{}': {} nodes, {} diagnostics",
            tree.module(),
            tree.len(),
            found.len()
        );
        self.diagnostics.extend(found);
        self.phase = Phase::Resolved;
        Ok(())
    }

    /// Bind QML base types and C++ counterparts of tree `id`'s QML types.
    fn resolve_qml_links(&mut self, id: TreeId) -> Vec<Diagnostic> {
        let Some(tree) = self.forest.tree(id) else {
            return Vec::new();
        };
        let mut bases = Vec::new();
        let mut counterparts = Vec::new();
        let mut diagnostics = Vec::new();

        for (node_id, node) in tree.iter() {
            let Some(data) = node.payload().as_qml_type() else {
                continue;
            };
            let this = tree.node_ref(node_id);

            if let (Some(base_name), None) = (&data.base_name, data.base) {
                let found = node
                    .qml_module()
                    .and_then(|qmid| self.registry.find_qml_type(qmid, base_name))
                    .or_else(|| self.forest.find_qml_type_node(&split_path(base_name)))
                    .filter(|&found| found != this);
                match found {
                    Some(base) => bases.push((node_id, base)),
                    None => diagnostics.push(
                        Diagnostic::warning(
                            DiagnosticKind::UnresolvedBase,
                            tree.module(),
                            node.location().clone(),
                            format!(
                                "QML base type '{}' of '{}' not found",
                                base_name,
                                node.name()
                            ),
                        )
                        .with_node(this),
                    ),
                }
            }

            if let (Some(class_name), None) = (&data.cpp_class_name, data.cpp_class) {
                match self.forest.find_class_node(&split_path(class_name)) {
                    Some(class) => counterparts.push((node_id, class)),
                    None => tracing::debug!(
                        "[DATABASE] C++ class '{}' of QML type '{}' not found",
                        class_name,
                        node.name()
                    ),
                }
            }
        }

        if let Some(tree) = self.forest.tree_mut(id) {
            for (node_id, base) in bases {
                if let Some(data) = tree.get_mut(node_id).payload_mut().as_qml_type_mut() {
                    data.base = Some(base);
                }
            }
            for (node_id, class) in counterparts {
                if let Some(data) = tree.get_mut(node_id).payload_mut().as_qml_type_mut() {
                    data.cpp_class = Some(class);
                }
            }
        }
        diagnostics
    }

    // ========================================================================
    // AGGREGATION
    // ========================================================================

    /// Rebuild the aggregated collections from the primary tree.
    ///
    /// Before `resolve` the result is incomplete, not wrong; a warning is
    /// logged and the build proceeds.
    pub fn build_collections(&mut self) {
        if self.phase < Phase::Resolved {
            tracing::warn!(
                "[DATABASE] building collections while {}; results will be incomplete",
                self.phase.as_str()
            );
        }
        let Some(tree) = self.forest.primary_tree() else {
            tracing::warn!("[DATABASE] no primary tree to aggregate");
            return;
        };
        self.collections.rebuild(tree, self.config.show_internal);
        if self.phase == Phase::Resolved {
            self.phase = Phase::Aggregated;
        }
    }

    /// Finish whatever phases are left and make the database queryable.
    pub fn finalize(&mut self) -> Result<()> {
        if self.phase == Phase::Loading {
            self.resolve()?;
        }
        if self.phase == Phase::Resolved {
            self.build_collections();
        }
        match self.phase {
            Phase::Aggregated | Phase::Queryable => {
                self.phase = Phase::Queryable;
                Ok(())
            }
            _ => Err(DatabaseError::NoPrimaryTree),
        }
    }

    // ========================================================================
    // OPEN NAMESPACES
    // ========================================================================

    /// Open namespace `path` (`"Qt"`, `"QtQuick::Controls"`) for the lookups
    /// below. Opening the same namespace twice keeps its first position.
    pub fn insert_open_namespace(&mut self, path: &str) {
        let path = join_path(&split_path(path));
        if !path.is_empty() {
            self.open_namespaces.insert(SmolStr::new(path));
        }
    }

    /// Close every open namespace; the parser does this per source file.
    pub fn clear_open_namespaces(&mut self) {
        self.open_namespaces.clear();
    }

    pub fn open_namespaces(&self) -> impl Iterator<Item = &str> {
        self.open_namespaces.iter().map(SmolStr::as_str)
    }

    /// `path` looked up inside each open namespace in turn.
    ///
    /// The namespace is prefixed onto `path` unless `path` already starts
    /// with it. The first hit wins and comes back with the qualified path
    /// it was found under.
    pub fn find_node_in_open_namespace(
        &self,
        path: &str,
        kinds: &[NodeKind],
    ) -> Option<(NodeRef, String)> {
        let segments = split_path(path);
        let first = *segments.first()?;
        self.open_namespaces.iter().find_map(|namespace| {
            let full: Vec<&str> = if namespace.as_str() == first {
                segments.clone()
            } else {
                split_path(namespace).into_iter().chain(segments.iter().copied()).collect()
            };
            self.forest
                .find_node_by_name_and_kind(&full, kinds)
                .map(|found| (found, join_path(&full)))
        })
    }

    /// The overload of function `path` matching `signature`, looked up
    /// inside each open namespace in turn.
    pub fn find_function_in_open_namespace(
        &self,
        path: &str,
        signature: &FunctionData,
    ) -> Option<NodeRef> {
        let segments = split_path(path);
        if segments.is_empty() {
            return None;
        }
        self.open_namespaces.iter().find_map(|namespace| {
            let full: Vec<&str> = split_path(namespace)
                .into_iter()
                .chain(segments.iter().copied())
                .collect();
            self.forest.find_function_matching(&full, signature)
        })
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn find_node(
        &self,
        path: &str,
        relative: Option<NodeRef>,
        flags: FindFlags,
    ) -> Option<NodeRef> {
        self.forest.find_node(&split_path(path), relative, flags)
    }

    pub fn find_class_node(&self, path: &str) -> Option<NodeRef> {
        self.forest.find_class_node(&split_path(path))
    }

    pub fn resolve_target(&self, target: &str, relative: Option<NodeRef>) -> Option<NodeRef> {
        self.forest.resolve_target(target, relative)
    }

    pub fn resolve_type(&self, name: &str, relative: Option<NodeRef>) -> Option<NodeRef> {
        self.forest.resolve_type(name, relative)
    }

    pub fn all_base_classes(&self, class: NodeRef) -> Vec<NodeRef> {
        self.forest.all_base_classes(class)
    }

    fn qml_module_of(&self, node: Option<NodeRef>) -> Option<&str> {
        node.and_then(|r| self.forest.node(r))
            .and_then(Node::qml_module)
    }

    /// Anchor lookup across trees, preferring the QML module of `relative`.
    pub fn find_unambiguous_target(
        &self,
        target: &str,
        relative: Option<NodeRef>,
    ) -> Option<ForestTarget> {
        self.forest
            .find_unambiguous_target(target, self.qml_module_of(relative))
    }

    /// The node a link target names.
    ///
    /// An empty target is `relative` itself; `*.html` names a page; anything
    /// else is tried as a code entity, then as a page title.
    pub fn find_node_for_target(&self, target: &str, relative: Option<NodeRef>) -> Option<NodeRef> {
        if target.is_empty() {
            return relative;
        }
        if target.ends_with(".html") {
            return self.forest.find_document_by_name(target);
        }
        self.resolve_target(target, relative).or_else(|| {
            self.forest
                .find_doc_node_by_title(target, self.qml_module_of(relative))
        })
    }

    /// Resolve a `\l` link, falling back to anchors. Misses are recorded as
    /// `UnresolvedTarget`, ties as `AmbiguousTarget`.
    pub fn resolve_link(&mut self, target: &str, relative: Option<NodeRef>) -> Option<Link> {
        if let Some(node) = self.find_node_for_target(target, relative) {
            return Some(Link { node, anchor: None });
        }

        let (module, location) = self.diagnostic_site(relative);
        match self.find_unambiguous_target(target, relative) {
            Some(hit) => {
                if !hit.ambiguous.is_empty() {
                    let mut diagnostic = Diagnostic::warning(
                        DiagnosticKind::AmbiguousTarget,
                        module,
                        location,
                        format!(
                            "target '{}' matches {} nodes at equal priority; using the best ranked",
                            target,
                            hit.ambiguous.len() + 1
                        ),
                    )
                    .with_node(hit.node);
                    for &other in &hit.ambiguous {
                        diagnostic = diagnostic.with_related(RelatedInfo {
                            node: other,
                            location: self
                                .forest
                                .node(other)
                                .map(|n| n.location().clone())
                                .unwrap_or_default(),
                            message: "also matches".to_string(),
                        });
                    }
                    self.diagnostics.add(diagnostic);
                }
                let anchor = (!hit.reference.is_empty()).then_some(hit.reference);
                Some(Link {
                    node: hit.node,
                    anchor,
                })
            }
            None => {
                let mut diagnostic = Diagnostic::warning(
                    DiagnosticKind::UnresolvedTarget,
                    module,
                    location,
                    format!("can't link to '{target}'"),
                );
                if let Some(r) = relative {
                    diagnostic = diagnostic.with_node(r);
                }
                self.diagnostics.add(diagnostic);
                None
            }
        }
    }

    fn diagnostic_site(&self, relative: Option<NodeRef>) -> (SmolStr, Location) {
        let module = relative
            .and_then(|r| self.forest.module_of(r))
            .or_else(|| self.primary_tree().map(Tree::module))
            .unwrap_or_default();
        let location = relative
            .and_then(|r| self.forest.node(r))
            .map(|n| n.location().clone())
            .unwrap_or_default();
        (SmolStr::new(module), location)
    }
}
