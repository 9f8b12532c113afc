//! Index files: the persisted form of a resolved tree.
//!
//! [`tree_to_index`] and [`index_to_tree`] convert between a [`Tree`] and
//! the [`IndexFile`] structure; [`read_index_file`] and [`write_index_file`]
//! add the JSON encoding and file IO. Anything that does not describe a
//! well-formed tree is a [`DatabaseError::MalformedIndex`].

mod format;

pub use format::{
    INDEX_FORMAT_VERSION, IndexAccessor, IndexBase, IndexCollection, IndexFile, IndexNode,
    IndexPage, IndexParameter, IndexPayload,
};

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::base::{NodeId, TreeId};
use crate::error::{DatabaseError, Result};
use crate::node::{
    CollectionData, FunctionData, Node, NodePayload, PageData, Parameter, PropertyData,
    QmlTypeData,
};
use crate::tree::Tree;

// ============================================================================
// TREE → INDEX
// ============================================================================

/// Serialize `tree` in preorder. Documentation text and collision nodes are
/// left out; collisions are recomputed on load.
pub fn tree_to_index(tree: &Tree, project: &str, version: &str) -> IndexFile {
    let order: Vec<NodeId> = tree
        .preorder(tree.root())
        .into_iter()
        .filter(|&id| !matches!(tree.get(id).payload(), NodePayload::Collision(_)))
        .collect();
    let position: FxHashMap<NodeId, u32> = order
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i as u32))
        .collect();

    let nodes = order
        .iter()
        .filter_map(|&id| {
            let node = tree.get(id);
            let payload = encode_payload(node.payload(), &position)?;
            let meta = node.meta();
            Some(IndexNode {
                id: position[&id],
                parent: node.parent().and_then(|p| position.get(&p).copied()),
                name: node.name().into(),
                status: node.status(),
                access: node.access(),
                location: node.location().clone(),
                documented: node.has_doc(),
                since: meta.since.clone(),
                legalese: meta.legalese.clone(),
                module: meta.module.clone(),
                qml_module: meta.qml_module.clone(),
                groups: meta.groups.clone(),
                anchors: node.anchors().to_vec(),
                payload,
            })
        })
        .collect();

    IndexFile {
        format: INDEX_FORMAT_VERSION,
        module: tree.module().into(),
        project: project.to_string(),
        version: version.to_string(),
        nodes,
    }
}

fn encode_payload(payload: &NodePayload, position: &FxHashMap<NodeId, u32>) -> Option<IndexPayload> {
    let ids = |members: &[NodeId]| -> Vec<u32> {
        members
            .iter()
            .filter_map(|id| position.get(id).copied())
            .collect()
    };
    Some(match payload {
        NodePayload::Namespace => IndexPayload::Namespace,
        NodePayload::Class(data) => IndexPayload::Class {
            bases: data
                .bases
                .iter()
                .map(|base| IndexBase {
                    access: base.access,
                    path: base.path_string(),
                })
                .collect(),
            service_name: data.service_name.clone(),
        },
        NodePayload::Function(data) => IndexPayload::Function {
            parameters: data
                .parameters
                .iter()
                .map(|p| IndexParameter {
                    ty: p.ty.clone(),
                    name: p.name.clone(),
                })
                .collect(),
            return_type: data.return_type.clone(),
            is_const: data.is_const,
            virtualness: data.virtualness,
        },
        NodePayload::Property(data) => IndexPayload::Property {
            type_name: data.type_name.clone(),
            accessors: data
                .accessors
                .iter()
                .filter_map(|(role, f)| {
                    position.get(f).map(|&function| IndexAccessor {
                        role: *role,
                        function,
                    })
                })
                .collect(),
        },
        NodePayload::Enum => IndexPayload::Enum,
        NodePayload::EnumValue { value } => IndexPayload::EnumValue {
            value: value.clone(),
        },
        NodePayload::QmlType(data) => IndexPayload::QmlType {
            base_name: data.base_name.clone(),
            cpp_class_name: data.cpp_class_name.clone(),
        },
        NodePayload::Page(page) => IndexPayload::Page(encode_page(page)),
        NodePayload::Document(page) => IndexPayload::Document(encode_page(page)),
        NodePayload::Group(c) => IndexPayload::Group(IndexCollection {
            title: c.title.clone(),
            members: ids(&c.members),
        }),
        NodePayload::Module(c) => IndexPayload::Module(IndexCollection {
            title: c.title.clone(),
            members: ids(&c.members),
        }),
        NodePayload::QmlModule(c) => IndexPayload::QmlModule(IndexCollection {
            title: c.title.clone(),
            members: ids(&c.members),
        }),
        NodePayload::Collision(_) => return None,
    })
}

fn encode_page(page: &PageData) -> IndexPage {
    IndexPage {
        title: page.title.clone(),
        subtitle: page.subtitle.clone(),
    }
}

// ============================================================================
// INDEX → TREE
// ============================================================================

/// Rebuild a tree from `file`. `path` only labels errors.
///
/// Same-file references (accessors, collection members) are translated after
/// all nodes exist. Bases stay unbound.
pub fn index_to_tree(file: &IndexFile, id: TreeId, path: &Path) -> Result<Tree> {
    let malformed = |message: String| DatabaseError::malformed(path, message);

    if file.format != INDEX_FORMAT_VERSION {
        return Err(malformed(format!(
            "unsupported format version {} (expected {})",
            file.format, INDEX_FORMAT_VERSION
        )));
    }
    let Some((root, rest)) = file.nodes.split_first() else {
        return Err(malformed("index has no nodes".to_string()));
    };
    if root.id != 0 || root.parent.is_some() || root.payload != IndexPayload::Namespace {
        return Err(malformed("first node must be the root namespace".to_string()));
    }

    let mut tree = Tree::new(id, file.module.clone());
    apply_meta(tree.get_mut(NodeId::ROOT), root);

    let mut ids: Vec<NodeId> = Vec::with_capacity(file.nodes.len());
    ids.push(NodeId::ROOT);

    for (offset, entry) in rest.iter().enumerate() {
        let position = offset + 1;
        if entry.id as usize != position {
            return Err(malformed(format!(
                "node '{}' has id {} at position {}",
                entry.name, entry.id, position
            )));
        }
        let parent = match entry.parent {
            Some(parent) if (parent as usize) < position => ids[parent as usize],
            Some(parent) => {
                return Err(malformed(format!(
                    "node {} lists parent {} which does not precede it",
                    entry.id, parent
                )));
            }
            None => return Err(malformed(format!("node {} has no parent", entry.id))),
        };

        let created = tree
            .create_node(parent, entry.name.clone(), decode_payload(&entry.payload))
            .map_err(|e| malformed(e.to_string()))?;
        apply_meta(tree.get_mut(created), entry);
        if let IndexPayload::Class { bases, .. } = &entry.payload {
            for base in bases {
                tree.add_base_class(created, &base.path, base.access)
                    .map_err(|e| malformed(e.to_string()))?;
            }
        }
        ids.push(created);
    }

    // Same-file references, now that every node exists.
    let lookup = |raw: u32| -> Result<NodeId> {
        ids.get(raw as usize)
            .copied()
            .ok_or_else(|| malformed(format!("reference to unknown node {raw}")))
    };
    for (entry, &node) in file.nodes.iter().zip(&ids) {
        match &entry.payload {
            IndexPayload::Property { accessors, .. } => {
                for accessor in accessors {
                    let function = lookup(accessor.function)?;
                    let Some(data) = tree
                        .node_mut(function)
                        .and_then(|n| n.payload_mut().as_function_mut())
                    else {
                        return Err(malformed(format!(
                            "accessor {} of property {} is not a function",
                            accessor.function, entry.id
                        )));
                    };
                    data.associated_property = Some((node, accessor.role));
                    if let Some(property) = tree.get_mut(node).payload_mut().as_property_mut() {
                        property.accessors.push((accessor.role, function));
                    }
                }
            }
            IndexPayload::Group(c) | IndexPayload::Module(c) | IndexPayload::QmlModule(c) => {
                let members = c
                    .members
                    .iter()
                    .map(|&raw| lookup(raw))
                    .collect::<Result<Vec<_>>>()?;
                if let Some(data) = tree.get_mut(node).payload_mut().as_collection_mut() {
                    for member in members {
                        data.add_member(member);
                    }
                }
            }
            _ => {}
        }
    }

    tree.check_invariants()
        .map_err(|e| malformed(e.to_string()))?;
    Ok(tree)
}

fn decode_payload(payload: &IndexPayload) -> NodePayload {
    match payload {
        IndexPayload::Namespace => NodePayload::Namespace,
        IndexPayload::Class { service_name, .. } => {
            let mut class = NodePayload::class();
            if let Some(data) = class.as_class_mut() {
                data.service_name = service_name.clone();
            }
            class
        }
        IndexPayload::Function {
            parameters,
            return_type,
            is_const,
            virtualness,
        } => NodePayload::Function(FunctionData {
            parameters: parameters
                .iter()
                .map(|p| Parameter::new(p.ty.clone(), p.name.clone()))
                .collect(),
            return_type: return_type.clone(),
            is_const: *is_const,
            virtualness: *virtualness,
            ..FunctionData::default()
        }),
        IndexPayload::Property { type_name, .. } => NodePayload::Property(PropertyData {
            type_name: type_name.clone(),
            accessors: Vec::new(),
        }),
        IndexPayload::Enum => NodePayload::Enum,
        IndexPayload::EnumValue { value } => NodePayload::EnumValue {
            value: value.clone(),
        },
        IndexPayload::QmlType {
            base_name,
            cpp_class_name,
        } => NodePayload::QmlType(QmlTypeData {
            base_name: base_name.clone(),
            cpp_class_name: cpp_class_name.clone(),
            ..QmlTypeData::default()
        }),
        IndexPayload::Page(page) => NodePayload::Page(decode_page(page)),
        IndexPayload::Document(page) => NodePayload::Document(decode_page(page)),
        IndexPayload::Group(c) => NodePayload::Group(decode_collection(c)),
        IndexPayload::Module(c) => NodePayload::Module(decode_collection(c)),
        IndexPayload::QmlModule(c) => NodePayload::QmlModule(decode_collection(c)),
    }
}

fn decode_page(page: &IndexPage) -> PageData {
    PageData {
        title: page.title.clone(),
        subtitle: page.subtitle.clone(),
    }
}

/// Members are filled in once all nodes exist.
fn decode_collection(collection: &IndexCollection) -> CollectionData {
    CollectionData {
        title: collection.title.clone(),
        members: Vec::new(),
    }
}

fn apply_meta(node: &mut Node, entry: &IndexNode) {
    node.set_status(entry.status)
        .set_access(entry.access)
        .set_location(entry.location.clone())
        .set_documented(entry.documented);
    let meta = node.meta_mut();
    meta.since = entry.since.clone();
    meta.legalese = entry.legalese.clone();
    meta.module = entry.module.clone();
    meta.qml_module = entry.qml_module.clone();
    for group in &entry.groups {
        node.add_group(group.clone());
    }
    for anchor in &entry.anchors {
        node.add_anchor(anchor.kind, &anchor.name, Some(&anchor.reference));
    }
}

// ============================================================================
// FILE IO
// ============================================================================

pub fn read_index_file(path: &Path, id: TreeId) -> Result<Tree> {
    let text = std::fs::read_to_string(path).map_err(|e| DatabaseError::io(path, e))?;
    let file: IndexFile =
        serde_json::from_str(&text).map_err(|e| DatabaseError::malformed(path, e.to_string()))?;
    let tree = index_to_tree(&file, id, path)?;
    tracing::debug!(
        "[INDEX] read {} nodes of '{}' from {}",
        tree.len(),
        tree.module(),
        path.display()
    );
    Ok(tree)
}

pub fn write_index_file(path: &Path, file: &IndexFile) -> Result<()> {
    let text = serde_json::to_string_pretty(file)
        .map_err(|e| DatabaseError::malformed(path, e.to_string()))?;
    std::fs::write(path, text).map_err(|e| DatabaseError::io(path, e))?;
    tracing::info!(
        "[INDEX] wrote {} nodes of '{}' to {}",
        file.nodes.len(),
        file.module,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Location;
    use crate::node::{Access, FunctionRole, NodeKind, Status, TargetKind};
    use crate::tree::FindFlags;

    fn sample_tree() -> Tree {
        let mut tree = Tree::new(TreeId(0), "QtWidgets");
        let ns = tree.create_node(NodeId::ROOT, "QtWidgets", NodePayload::Namespace).unwrap();
        let button = tree.create_node(ns, "QPushButton", NodePayload::class()).unwrap();
        tree.add_base_class(button, "QAbstractButton", Access::Public).unwrap();
        tree.get_mut(button)
            .set_doc("The QPushButton widget provides a command button.")
            .set_since("4.0")
            .set_location(Location::new("qpushbutton.cpp", 12, 1));
        let property = tree.create_node(button, "flat", NodePayload::property()).unwrap();
        tree.create_node(button, "isFlat", NodePayload::function(vec![])).unwrap();
        tree.add_property_accessor(property, FunctionRole::Getter, "isFlat").unwrap();
        tree.resolve_properties();
        let page = tree
            .create_node(NodeId::ROOT, "buttons.html", NodePayload::page("Buttons"))
            .unwrap();
        tree.get_mut(page).add_anchor(TargetKind::Target, "Push Buttons", None);
        let group = tree.create_node(NodeId::ROOT, "buttons", NodePayload::group()).unwrap();
        tree.get_mut(group)
            .payload_mut()
            .as_collection_mut()
            .unwrap()
            .add_member(button);
        tree.create_node(ns, "QPushButton", NodePayload::page("QPushButton")).unwrap();
        tree
    }

    #[test]
    fn test_round_trip_preserves_lookups() {
        let original = sample_tree();
        let file = tree_to_index(&original, "Qt", "6.5");
        let restored = index_to_tree(&file, TreeId(3), Path::new("qtwidgets.index")).unwrap();

        let paths: [&[&str]; 4] = [
            &["QtWidgets", "QPushButton"],
            &["QtWidgets", "QPushButton", "flat"],
            &["QtWidgets", "QPushButton", "isFlat"],
            &["QPushButton"],
        ];
        for path in paths {
            let before = original.find_node(path, None, FindFlags::NONE);
            let after = restored.find_node(path, None, FindFlags::NONE);
            assert_eq!(
                before.map(|id| original.full_name(id)),
                after.map(|id| restored.full_name(id)),
                "lookup of {path:?} changed"
            );
        }
        assert_eq!(restored.id(), TreeId(3));
        restored.check_invariants().unwrap();
    }

    #[test]
    fn test_round_trip_drops_text_but_keeps_flags() {
        let file = tree_to_index(&sample_tree(), "Qt", "6.5");
        let restored = index_to_tree(&file, TreeId(1), Path::new("qtwidgets.index")).unwrap();

        let button = restored.find_class_node(&["QtWidgets", "QPushButton"]).unwrap();
        let node = restored.get(button);
        assert!(node.has_doc());
        assert!(node.doc().is_none());
        assert_eq!(node.since(), Some("4.0"));
        assert_eq!(node.location().line, 12);
        let bases = &node.payload().as_class().unwrap().bases;
        assert_eq!(bases[0].path_string(), "QAbstractButton");
        assert!(bases[0].node.is_none());

        let property = restored
            .find_node(&["QtWidgets", "QPushButton", "flat"], None, FindFlags::NON_FUNCTION)
            .unwrap();
        let getter = restored
            .get(property)
            .payload()
            .as_property()
            .unwrap()
            .accessors_for(FunctionRole::Getter)
            .next()
            .unwrap();
        assert_eq!(restored.get(getter).name(), "isFlat");

        assert_eq!(restored.collision_nodes().count(), 1);
        let group = restored.find_node_by_kind(&["buttons"], &[NodeKind::Group]).unwrap();
        let members = &restored.get(group).payload().as_collection().unwrap().members;
        assert_eq!(members, &vec![button]);
    }

    #[test]
    fn test_wrong_format_version_is_malformed() {
        let mut file = tree_to_index(&sample_tree(), "Qt", "6.5");
        file.format = 99;
        let err = index_to_tree(&file, TreeId(1), Path::new("x.index")).unwrap_err();
        assert!(matches!(err, DatabaseError::MalformedIndex { .. }));
    }

    #[test]
    fn test_child_before_parent_is_malformed() {
        let mut file = tree_to_index(&sample_tree(), "Qt", "6.5");
        file.nodes[1].parent = Some(5);
        let err = index_to_tree(&file, TreeId(1), Path::new("x.index")).unwrap_err();
        assert!(matches!(err, DatabaseError::MalformedIndex { .. }));
    }

    #[test]
    fn test_json_encoding_is_tagged_by_kind() {
        let file = tree_to_index(&sample_tree(), "Qt", "6.5");
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["format"], 1);
        assert_eq!(json["nodes"][0]["kind"], "namespace");
        assert_eq!(json["nodes"][2]["kind"], "class");
        assert_eq!(json["nodes"][2]["status"], serde_json::json!(Status::Normal));

        let back: IndexFile = serde_json::from_value(json).unwrap();
        assert_eq!(back, file);
    }
}
