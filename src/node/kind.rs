use std::fmt;

use serde::{Deserialize, Serialize};

/// Discriminant of a node's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Namespace,
    Class,
    Function,
    Property,
    Enum,
    EnumValue,
    QmlType,
    Page,
    Document,
    Group,
    Module,
    QmlModule,
    Collision,
}

/// Which lookup family a node belongs to.
///
/// Ordinary C++ lookups never see QML or collision nodes, QML lookups never
/// see C++ nodes. Documentation nodes are visible to both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Genus {
    Cpp,
    Qml,
    Doc,
    Collision,
}

impl NodeKind {
    /// Returns true if nodes of this kind own children.
    pub fn is_inner(&self) -> bool {
        matches!(
            self,
            NodeKind::Namespace
                | NodeKind::Class
                | NodeKind::Enum
                | NodeKind::QmlType
                | NodeKind::Document
        )
    }

    pub fn genus(&self) -> Genus {
        match self {
            NodeKind::Namespace
            | NodeKind::Class
            | NodeKind::Function
            | NodeKind::Property
            | NodeKind::Enum
            | NodeKind::EnumValue => Genus::Cpp,
            NodeKind::QmlType => Genus::Qml,
            NodeKind::Page
            | NodeKind::Document
            | NodeKind::Group
            | NodeKind::Module
            | NodeKind::QmlModule => Genus::Doc,
            NodeKind::Collision => Genus::Collision,
        }
    }

    /// Returns true if this kind can name a type in a signature or base list.
    pub fn is_type_like(&self) -> bool {
        matches!(
            self,
            NodeKind::Class | NodeKind::Enum | NodeKind::Namespace | NodeKind::QmlType
        )
    }

    /// Kinds that get their own generated page; two of these sharing a name
    /// under one parent is a collision.
    pub fn produces_page(&self) -> bool {
        matches!(
            self,
            NodeKind::Namespace
                | NodeKind::Class
                | NodeKind::QmlType
                | NodeKind::Page
                | NodeKind::Document
                | NodeKind::Group
                | NodeKind::Module
                | NodeKind::QmlModule
        )
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, NodeKind::Group | NodeKind::Module | NodeKind::QmlModule)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Namespace => "namespace",
            NodeKind::Class => "class",
            NodeKind::Function => "function",
            NodeKind::Property => "property",
            NodeKind::Enum => "enum",
            NodeKind::EnumValue => "enum value",
            NodeKind::QmlType => "QML type",
            NodeKind::Page => "page",
            NodeKind::Document => "document",
            NodeKind::Group => "group",
            NodeKind::Module => "module",
            NodeKind::QmlModule => "QML module",
            NodeKind::Collision => "collision",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Documentation status of a node. Frozen once resolution completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Normal,
    Internal,
    Obsolete,
    Compat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Access {
    #[default]
    Public,
    Protected,
    Private,
}

/// Role a function plays for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FunctionRole {
    Getter,
    Setter,
    Resetter,
    Notifier,
}

impl FunctionRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionRole::Getter => "getter",
            FunctionRole::Setter => "setter",
            FunctionRole::Resetter => "resetter",
            FunctionRole::Notifier => "notifier",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Virtualness {
    #[default]
    NonVirtual,
    /// Not declared virtual but overrides a virtual in a base class.
    ImpureVirtual,
    Virtual,
    PureVirtual,
}
