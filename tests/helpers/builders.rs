//! Database builders for integration tests.

use std::path::{Path, PathBuf};

use docforest::node::Access;
use docforest::{Database, DatabaseConfig, NodeId, NodePayload, NodeRef};

/// A database with an empty primary tree for `module`.
pub fn loading_db(module: &str) -> Database {
    let mut db = Database::new(DatabaseConfig::new("Qt", "6.5"));
    db.new_primary_tree(module).expect("primary tree");
    db
}

pub fn add_namespace(db: &mut Database, parent: NodeId, name: &str) -> NodeId {
    db.create_node(parent, name, NodePayload::Namespace)
        .expect("create namespace")
}

/// Create a class and record its bases in declaration order.
pub fn add_class(db: &mut Database, parent: NodeId, name: &str, bases: &[&str]) -> NodeId {
    let class = db
        .create_node(parent, name, NodePayload::class())
        .expect("create class");
    for base in bases {
        db.record_base_class(class, base, Access::Public)
            .expect("record base");
    }
    class
}

pub fn add_function(db: &mut Database, parent: NodeId, name: &str) -> NodeId {
    db.create_node(parent, name, NodePayload::function(vec![]))
        .expect("create function")
}

/// The primary tree's address for `node`.
pub fn primary_ref(db: &Database, node: NodeId) -> NodeRef {
    NodeRef::new(db.forest().primary().expect("primary tree"), node)
}

/// Build a module with `build`, finalize it and write its index into `dir`.
pub fn write_index(dir: &Path, module: &str, build: impl FnOnce(&mut Database)) -> PathBuf {
    let mut db = loading_db(module);
    build(&mut db);
    db.finalize().expect("finalize");
    let path = dir.join(format!("{}.index.json", module.to_lowercase()));
    db.generate_index(&path).expect("write index");
    path
}

/// A small QtCore-like module used by several tests.
///
/// ```text
/// QObject
/// QString { toUpper() }
/// Qt { Alignment { AlignLeft } }
/// ```
pub fn qt_core(db: &mut Database) {
    let root = NodeId::ROOT;
    add_class(db, root, "QObject", &[]);
    let string = add_class(db, root, "QString", &[]);
    add_function(db, string, "toUpper");
    let qt = add_namespace(db, root, "Qt");
    let alignment = db
        .create_node(qt, "Alignment", NodePayload::Enum)
        .expect("create enum");
    db.create_node(alignment, "AlignLeft", NodePayload::EnumValue { value: Some("0x1".into()) })
        .expect("create enum value");
}
