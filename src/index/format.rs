//! On-disk index file structures (JSON).
//!
//! An index file is the serialized form of one module's tree, without
//! documentation text. Nodes are listed in preorder: the root first, each
//! parent before its children, and every node's `id` equal to its position.
//! Cross-tree bindings are not stored; bases are written as names and bound
//! again after loading.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::base::Location;
use crate::node::{Access, Anchor, FunctionRole, Status, Virtualness};

/// Version of the index format written by this crate.
pub const INDEX_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    pub format: u32,
    pub module: SmolStr,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub version: String,
    pub nodes: Vec<IndexNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexNode {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    pub name: SmolStr,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub access: Access,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub documented: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legalese: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qml_module: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<SmolStr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anchors: Vec<Anchor>,
    #[serde(flatten)]
    pub payload: IndexPayload,
}

/// Variant data, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum IndexPayload {
    Namespace,
    #[serde(rename_all = "camelCase")]
    Class {
        #[serde(default)]
        bases: Vec<IndexBase>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        service_name: Option<SmolStr>,
    },
    #[serde(rename_all = "camelCase")]
    Function {
        #[serde(default)]
        parameters: Vec<IndexParameter>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_type: Option<SmolStr>,
        #[serde(default)]
        is_const: bool,
        #[serde(default)]
        virtualness: Virtualness,
    },
    #[serde(rename_all = "camelCase")]
    Property {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_name: Option<SmolStr>,
        #[serde(default)]
        accessors: Vec<IndexAccessor>,
    },
    Enum,
    EnumValue {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<SmolStr>,
    },
    #[serde(rename_all = "camelCase")]
    QmlType {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base_name: Option<SmolStr>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cpp_class_name: Option<SmolStr>,
    },
    Page(IndexPage),
    Document(IndexPage),
    Group(IndexCollection),
    Module(IndexCollection),
    QmlModule(IndexCollection),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBase {
    #[serde(default)]
    pub access: Access,
    /// `::`-separated name as declared.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexParameter {
    #[serde(rename = "type")]
    pub ty: SmolStr,
    #[serde(default)]
    pub name: SmolStr,
}

/// An accessor binding; `function` is a node id of the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexAccessor {
    pub role: FunctionRole,
    pub function: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPage {
    pub title: SmolStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<SmolStr>,
}

/// Members are node ids of the same file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<SmolStr>,
    #[serde(default)]
    pub members: Vec<u32>,
}
