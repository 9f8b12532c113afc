//! Variant-specific node data.
//!
//! [`NodePayload`] is the closed tagged union over every node variant. The
//! discriminant is exposed as [`NodeKind`] through [`NodePayload::kind`].

use smol_str::SmolStr;

use super::kind::{Access, FunctionRole, NodeKind, Virtualness};
use crate::base::{NodeId, NodeRef};

/// A declared base class of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedClass {
    pub access: Access,
    /// The base as written, split on `::`.
    pub path: Vec<SmolStr>,
    /// Bound by inheritance resolution; `None` while unresolved.
    pub node: Option<NodeRef>,
}

impl RelatedClass {
    pub fn new(path: Vec<SmolStr>, access: Access) -> Self {
        Self {
            access,
            path,
            node: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.node.is_some()
    }

    pub fn path_string(&self) -> String {
        crate::base::join_path(&self.path)
    }
}

/// A class known to derive from this one (same-tree only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedClass {
    pub access: Access,
    pub node: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassData {
    pub bases: Vec<RelatedClass>,
    pub derived: Vec<DerivedClass>,
    /// Flattened preorder ancestor list, cached by `fix_inheritance`.
    pub ancestors: Option<Vec<NodeRef>>,
    pub service_name: Option<SmolStr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub ty: SmolStr,
    pub name: SmolStr,
}

impl Parameter {
    pub fn new(ty: impl Into<SmolStr>, name: impl Into<SmolStr>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionData {
    pub parameters: Vec<Parameter>,
    pub return_type: Option<SmolStr>,
    pub is_const: bool,
    pub virtualness: Virtualness,
    pub reimplemented_from: Option<NodeRef>,
    pub associated_property: Option<(NodeId, FunctionRole)>,
}

impl FunctionData {
    pub fn with_parameters(parameters: Vec<Parameter>) -> Self {
        Self {
            parameters,
            ..Self::default()
        }
    }

    /// Structural signature equality: parameter types and constness.
    /// Parameter names do not take part.
    pub fn same_signature(&self, other: &FunctionData) -> bool {
        self.is_const == other.is_const
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.ty == b.ty)
    }

    pub fn signature(&self) -> String {
        let params: Vec<&str> = self.parameters.iter().map(|p| p.ty.as_str()).collect();
        let mut s = format!("({})", params.join(", "));
        if self.is_const {
            s.push_str(" const");
        }
        s
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyData {
    pub type_name: Option<SmolStr>,
    pub accessors: Vec<(FunctionRole, NodeId)>,
}

impl PropertyData {
    pub fn accessors_for(&self, role: FunctionRole) -> impl Iterator<Item = NodeId> + '_ {
        self.accessors
            .iter()
            .filter(move |(r, _)| *r == role)
            .map(|(_, id)| *id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QmlTypeData {
    pub base_name: Option<SmolStr>,
    pub base: Option<NodeRef>,
    pub cpp_class_name: Option<SmolStr>,
    pub cpp_class: Option<NodeRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageData {
    pub title: SmolStr,
    pub subtitle: Option<SmolStr>,
}

impl PageData {
    pub fn titled(title: impl Into<SmolStr>) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
        }
    }
}

/// Group, module and QML module pages list their members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionData {
    pub title: Option<SmolStr>,
    pub members: Vec<NodeId>,
}

impl CollectionData {
    /// Returns false if the node was already a member.
    pub fn add_member(&mut self, node: NodeId) -> bool {
        if self.members.contains(&node) {
            return false;
        }
        self.members.push(node);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionData {
    pub members: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodePayload {
    Namespace,
    Class(ClassData),
    Function(FunctionData),
    Property(PropertyData),
    Enum,
    EnumValue { value: Option<SmolStr> },
    QmlType(QmlTypeData),
    Page(PageData),
    Document(PageData),
    Group(CollectionData),
    Module(CollectionData),
    QmlModule(CollectionData),
    Collision(CollisionData),
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Namespace => NodeKind::Namespace,
            NodePayload::Class(_) => NodeKind::Class,
            NodePayload::Function(_) => NodeKind::Function,
            NodePayload::Property(_) => NodeKind::Property,
            NodePayload::Enum => NodeKind::Enum,
            NodePayload::EnumValue { .. } => NodeKind::EnumValue,
            NodePayload::QmlType(_) => NodeKind::QmlType,
            NodePayload::Page(_) => NodeKind::Page,
            NodePayload::Document(_) => NodeKind::Document,
            NodePayload::Group(_) => NodeKind::Group,
            NodePayload::Module(_) => NodeKind::Module,
            NodePayload::QmlModule(_) => NodeKind::QmlModule,
            NodePayload::Collision(_) => NodeKind::Collision,
        }
    }

    pub fn class() -> Self {
        NodePayload::Class(ClassData::default())
    }

    pub fn function(parameters: Vec<Parameter>) -> Self {
        NodePayload::Function(FunctionData::with_parameters(parameters))
    }

    pub fn property() -> Self {
        NodePayload::Property(PropertyData::default())
    }

    pub fn qml_type() -> Self {
        NodePayload::QmlType(QmlTypeData::default())
    }

    pub fn page(title: impl Into<SmolStr>) -> Self {
        NodePayload::Page(PageData::titled(title))
    }

    pub fn group() -> Self {
        NodePayload::Group(CollectionData::default())
    }

    pub fn module() -> Self {
        NodePayload::Module(CollectionData::default())
    }

    pub fn qml_module() -> Self {
        NodePayload::QmlModule(CollectionData::default())
    }

    /// Title of pages and documents, or of collections that set one.
    pub fn title(&self) -> Option<&str> {
        match self {
            NodePayload::Page(page) | NodePayload::Document(page) => Some(&page.title),
            NodePayload::Group(c) | NodePayload::Module(c) | NodePayload::QmlModule(c) => {
                c.title.as_deref()
            }
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassData> {
        match self {
            NodePayload::Class(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_class_mut(&mut self) -> Option<&mut ClassData> {
        match self {
            NodePayload::Class(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionData> {
        match self {
            NodePayload::Function(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionData> {
        match self {
            NodePayload::Function(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_property(&self) -> Option<&PropertyData> {
        match self {
            NodePayload::Property(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_property_mut(&mut self) -> Option<&mut PropertyData> {
        match self {
            NodePayload::Property(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_qml_type(&self) -> Option<&QmlTypeData> {
        match self {
            NodePayload::QmlType(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_qml_type_mut(&mut self) -> Option<&mut QmlTypeData> {
        match self {
            NodePayload::QmlType(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&CollectionData> {
        match self {
            NodePayload::Group(c) | NodePayload::Module(c) | NodePayload::QmlModule(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut CollectionData> {
        match self {
            NodePayload::Group(c) | NodePayload::Module(c) | NodePayload::QmlModule(c) => Some(c),
            _ => None,
        }
    }
}
