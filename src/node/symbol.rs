use smol_str::SmolStr;

use super::anchor::{Anchor, TargetKind};
use super::children::ChildMap;
use super::kind::{Access, Genus, NodeKind, Status};
use super::payload::NodePayload;
use crate::base::{Location, NodeId, canonical_title};

/// Documentation metadata the parser attaches to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeMeta {
    /// Version the symbol first appeared in (`\since`).
    pub since: Option<SmolStr>,
    pub legalese: Option<String>,
    /// Documentation module (`\inmodule`).
    pub module: Option<SmolStr>,
    /// QML module identifier, e.g. `"QtQuick 2.0"`.
    pub qml_module: Option<SmolStr>,
    pub groups: Vec<SmolStr>,
}

/// A single symbol in a tree's arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: SmolStr,
    parent: Option<NodeId>,
    status: Status,
    access: Access,
    location: Location,
    documented: bool,
    doc: Option<String>,
    meta: NodeMeta,
    anchors: Vec<Anchor>,
    children: ChildMap,
    payload: NodePayload,
}

impl Node {
    pub fn new(name: impl Into<SmolStr>, parent: Option<NodeId>, payload: NodePayload) -> Self {
        Self {
            name: name.into(),
            parent,
            status: Status::Normal,
            access: Access::Public,
            location: Location::unknown(),
            documented: false,
            doc: None,
            meta: NodeMeta::default(),
            anchors: Vec::new(),
            children: ChildMap::new(),
            payload,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn genus(&self) -> Genus {
        self.kind().genus()
    }

    pub fn is_inner(&self) -> bool {
        self.kind().is_inner()
    }

    pub fn is_function(&self) -> bool {
        self.kind() == NodeKind::Function
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn is_internal(&self) -> bool {
        self.status == Status::Internal
    }

    pub fn is_obsolete(&self) -> bool {
        self.status == Status::Obsolete
    }

    pub fn is_private(&self) -> bool {
        self.access == Access::Private
    }

    /// True if the node carried documentation, even if the text itself was
    /// dropped when the node came from an index file.
    pub fn has_doc(&self) -> bool {
        self.documented
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    pub fn since(&self) -> Option<&str> {
        self.meta.since.as_deref()
    }

    pub fn qml_module(&self) -> Option<&str> {
        self.meta.qml_module.as_deref()
    }

    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    pub fn children(&self) -> &ChildMap {
        &self.children
    }

    pub fn payload(&self) -> &NodePayload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut NodePayload {
        &mut self.payload
    }

    pub fn title(&self) -> Option<&str> {
        self.payload.title()
    }

    // ============================================================
    // Builders (used by the parser while the tree is loading)
    // ============================================================

    pub fn set_status(&mut self, status: Status) -> &mut Self {
        self.status = status;
        self
    }

    pub fn set_access(&mut self, access: Access) -> &mut Self {
        self.access = access;
        self
    }

    pub fn set_location(&mut self, location: Location) -> &mut Self {
        self.location = location;
        self
    }

    pub fn set_doc(&mut self, text: impl Into<String>) -> &mut Self {
        self.doc = Some(text.into());
        self.documented = true;
        self
    }

    /// Mark as documented without text (index trees).
    pub fn set_documented(&mut self, documented: bool) -> &mut Self {
        self.documented = documented;
        self
    }

    pub fn set_since(&mut self, since: impl Into<SmolStr>) -> &mut Self {
        self.meta.since = Some(since.into());
        self
    }

    pub fn set_legalese(&mut self, text: impl Into<String>) -> &mut Self {
        self.meta.legalese = Some(text.into());
        self
    }

    pub fn set_module(&mut self, module: impl Into<SmolStr>) -> &mut Self {
        self.meta.module = Some(module.into());
        self
    }

    pub fn set_qml_module(&mut self, qml_module: impl Into<SmolStr>) -> &mut Self {
        self.meta.qml_module = Some(qml_module.into());
        self
    }

    pub fn add_group(&mut self, group: impl Into<SmolStr>) -> &mut Self {
        let group = group.into();
        if !self.meta.groups.contains(&group) {
            self.meta.groups.push(group);
        }
        self
    }

    /// Record an anchor. Without an explicit reference the canonical form of
    /// the name is used.
    pub fn add_anchor(&mut self, kind: TargetKind, name: &str, reference: Option<&str>) {
        let reference = match reference {
            Some(r) => SmolStr::new(r),
            None => SmolStr::new(canonical_title(name)),
        };
        let anchor = Anchor {
            kind,
            name: SmolStr::new(name),
            reference,
        };
        if !self.anchors.contains(&anchor) {
            self.anchors.push(anchor);
        }
    }

    pub(crate) fn children_mut(&mut self) -> &mut ChildMap {
        &mut self.children
    }

    pub(crate) fn meta_mut(&mut self) -> &mut NodeMeta {
        &mut self.meta
    }
}
