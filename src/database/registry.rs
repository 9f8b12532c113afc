//! Groups, modules, QML modules and the QML type map.
//!
//! Collection nodes live in the trees like any other node; the registry only
//! maps names to them. Lookups with `find_*` never create. `get_or_create`
//! creates missing collections in the primary tree.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::base::{NodeId, NodeRef};
use crate::error::Result;
use crate::node::{NodeKind, NodePayload};
use crate::tree::Tree;

/// Which registry a collection belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Group,
    Module,
    QmlModule,
}

impl CollectionKind {
    fn payload(self) -> NodePayload {
        match self {
            CollectionKind::Group => NodePayload::group(),
            CollectionKind::Module => NodePayload::module(),
            CollectionKind::QmlModule => NodePayload::qml_module(),
        }
    }

    fn of(kind: NodeKind) -> Option<Self> {
        match kind {
            NodeKind::Group => Some(CollectionKind::Group),
            NodeKind::Module => Some(CollectionKind::Module),
            NodeKind::QmlModule => Some(CollectionKind::QmlModule),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    groups: IndexMap<SmolStr, Vec<NodeRef>>,
    modules: IndexMap<SmolStr, Vec<NodeRef>>,
    qml_modules: IndexMap<SmolStr, Vec<NodeRef>>,
    qml_types: IndexMap<SmolStr, NodeRef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, kind: CollectionKind) -> &IndexMap<SmolStr, Vec<NodeRef>> {
        match kind {
            CollectionKind::Group => &self.groups,
            CollectionKind::Module => &self.modules,
            CollectionKind::QmlModule => &self.qml_modules,
        }
    }

    fn map_mut(&mut self, kind: CollectionKind) -> &mut IndexMap<SmolStr, Vec<NodeRef>> {
        match kind {
            CollectionKind::Group => &mut self.groups,
            CollectionKind::Module => &mut self.modules,
            CollectionKind::QmlModule => &mut self.qml_modules,
        }
    }

    /// The collection named `name` in `primary`, created under its root if
    /// it does not exist yet.
    pub fn get_or_create(
        &mut self,
        primary: &mut Tree,
        kind: CollectionKind,
        name: &str,
    ) -> Result<NodeId> {
        let existing = self
            .map(kind)
            .get(name)
            .and_then(|refs| refs.iter().find(|r| r.tree == primary.id()))
            .map(|r| r.node);
        if let Some(node) = existing {
            return Ok(node);
        }

        let node = primary.create_node(primary.root(), name, kind.payload())?;
        tracing::debug!("[REGISTRY] created {:?} '{}' in {}", kind, name, primary.module());
        self.map_mut(kind)
            .entry(SmolStr::new(name))
            .or_default()
            .insert(0, primary.node_ref(node));
        Ok(node)
    }

    /// Primary tree's collection first, then index trees in load order.
    pub fn find(&self, kind: CollectionKind, name: &str) -> Option<NodeRef> {
        self.map(kind).get(name).and_then(|refs| refs.first().copied())
    }

    pub fn all(&self, kind: CollectionKind, name: &str) -> &[NodeRef] {
        self.map(kind).get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names(&self, kind: CollectionKind) -> impl Iterator<Item = &str> {
        self.map(kind).keys().map(SmolStr::as_str)
    }

    /// Register the collections and QML types of a loaded index tree.
    pub fn register_tree(&mut self, tree: &Tree) {
        for (id, node) in tree.iter() {
            if let Some(kind) = CollectionKind::of(node.kind()) {
                let refs = self.map_mut(kind).entry(SmolStr::new(node.name())).or_default();
                let r = tree.node_ref(id);
                if !refs.contains(&r) {
                    refs.push(r);
                }
            } else if node.kind() == NodeKind::QmlType {
                if let Some(qmid) = node.qml_module() {
                    self.register_qml_type(qmid, node.name(), tree.node_ref(id));
                }
            }
        }
    }

    /// Key the QML type under every variant of its module identifier.
    /// Earlier registrations win.
    pub fn register_qml_type(&mut self, qmid: &str, name: &str, node: NodeRef) {
        for variant in qml_module_variants(qmid) {
            let key = SmolStr::new(format!("{variant}::{name}"));
            self.qml_types.entry(key).or_insert(node);
        }
    }

    pub fn find_qml_type(&self, qmid: &str, name: &str) -> Option<NodeRef> {
        qml_module_variants(qmid).into_iter().find_map(|variant| {
            self.qml_types
                .get(format!("{variant}::{name}").as_str())
                .copied()
        })
    }

    pub fn qml_type_count(&self) -> usize {
        self.qml_types.len()
    }
}

/// `"QtQuick 2.0"` → `["QtQuick", "QtQuick2.0", "QtQuick2"]`.
pub fn qml_module_variants(qmid: &str) -> Vec<String> {
    let mut parts = qmid.split_whitespace();
    let Some(name) = parts.next() else {
        return Vec::new();
    };
    let mut variants = vec![name.to_string()];
    if let Some(version) = parts.next() {
        variants.push(format!("{name}{version}"));
        let major = version.split('.').next().unwrap_or(version);
        let short = format!("{name}{major}");
        if !variants.contains(&short) {
            variants.push(short);
        }
    }
    variants
}
