//! Search order across the primary tree and index trees.

use std::path::{Path, PathBuf};

use docforest::node::FunctionData;
use docforest::{Database, DatabaseConfig, FindFlags, NodeId, NodeKind};
use rstest::rstest;

use crate::helpers::assertions::{assert_finds, full_name};
use crate::helpers::builders::{
    add_class, add_function, add_namespace, loading_db, primary_ref, write_index,
};

fn write_lib(dir: &Path, module: &str) -> PathBuf {
    write_index(dir, module, |db| {
        add_class(db, NodeId::ROOT, "Shared", &[]);
        add_class(db, NodeId::ROOT, module, &[]);
    })
}

#[test]
fn test_relative_scope_applies_to_primary_only() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lib = write_index(dir.path(), "Lib", |db| {
        add_class(db, NodeId::ROOT, "Bar", &[]);
        add_class(db, NodeId::ROOT, "Baz", &[]);
    });

    let mut db = loading_db("App");
    db.read_indexes(&[lib]).expect("read index");
    let foo = add_namespace(&mut db, NodeId::ROOT, "Foo");
    add_class(&mut db, foo, "Bar", &[]);
    db.resolve().expect("resolve");
    let foo = primary_ref(&db, foo);

    let bar = assert_finds(&db, "Bar", Some(foo), FindFlags::NONE, "Foo::Bar");
    assert_eq!(bar.tree, foo.tree);

    let baz = assert_finds(&db, "Baz", Some(foo), FindFlags::NONE, "Baz");
    assert_eq!(db.forest().module_of(baz), Some("Lib"));
}

#[test]
fn test_primary_shadows_index_trees() {
    let dir = tempfile::tempdir().expect("temp dir");
    let lib = write_lib(dir.path(), "LibA");

    let mut db = loading_db("App");
    db.read_indexes(&[lib]).expect("read index");
    add_class(&mut db, NodeId::ROOT, "Shared", &[]);
    db.resolve().expect("resolve");

    let shared = db.find_class_node("Shared").expect("Shared");
    assert_eq!(db.forest().module_of(shared), Some("App"));
    assert_eq!(db.forest().search_order()[0], shared.tree);
}

#[rstest]
#[case::registration_order(&[], "LibA")]
#[case::priority_first(&["LibB"], "LibB")]
#[case::unknown_priority_ignored(&["QtNothing"], "LibA")]
fn test_index_tree_priority(#[case] priority: &[&str], #[case] expected: &str) {
    let dir = tempfile::tempdir().expect("temp dir");
    let paths = vec![write_lib(dir.path(), "LibA"), write_lib(dir.path(), "LibB")];

    let mut config = DatabaseConfig::new("App", "1.0");
    config.search_priority = priority.iter().map(|m| m.to_string()).collect();
    let mut db = Database::new(config);
    db.new_primary_tree("App").expect("primary tree");
    db.read_indexes(&paths).expect("read indexes");

    let shared = db.find_class_node("Shared").expect("Shared");
    assert_eq!(db.forest().module_of(shared), Some(expected));
    assert_eq!(full_name(&db, shared), "Shared");
    // Names unique to one tree are found wherever it sits in the order.
    assert!(db.find_class_node("LibA").is_some());
    assert!(db.find_class_node("LibB").is_some());
}

#[test]
fn test_serial_and_parallel_loading_agree() {
    let dir = tempfile::tempdir().expect("temp dir");
    let paths: Vec<PathBuf> = ["LibA", "LibB", "LibC"]
        .iter()
        .map(|m| write_lib(dir.path(), m))
        .collect();

    let load = |parallel: bool| {
        let mut config = DatabaseConfig::new("App", "1.0");
        config.parallel_index_loading = parallel;
        let mut db = Database::new(config);
        let ids = db.read_indexes(&paths).expect("read indexes");
        let modules: Vec<String> = ids
            .iter()
            .map(|&id| db.forest().tree(id).expect("tree").module().to_string())
            .collect();
        (modules, db.find_class_node("Shared"))
    };

    let serial = load(false);
    assert_eq!(serial.0, vec!["LibA", "LibB", "LibC"]);
    assert_eq!(serial, load(true));
}

#[test]
fn test_open_namespaces_reach_index_trees() {
    let dir = tempfile::tempdir().expect("temp dir");
    let core = write_index(dir.path(), "QtCore", |db| {
        let qt = add_namespace(db, NodeId::ROOT, "Qt");
        add_class(db, qt, "QFlags", &[]);
        let test = add_namespace(db, NodeId::ROOT, "QTest");
        add_function(db, test, "qWait");
    });

    let mut db = loading_db("App");
    db.read_indexes(&[core]).expect("read index");
    db.insert_open_namespace("QTest");
    db.insert_open_namespace("Qt");
    db.resolve().expect("resolve");

    let (flags, path) = db
        .find_node_in_open_namespace("QFlags", &[NodeKind::Class])
        .expect("QFlags through Qt");
    assert_eq!(path, "Qt::QFlags");
    assert_eq!(db.forest().module_of(flags), Some("QtCore"));

    let wait = db
        .find_function_in_open_namespace("qWait", &FunctionData::default())
        .expect("qWait through QTest");
    assert_eq!(full_name(&db, wait), "QTest::qWait");

    db.clear_open_namespaces();
    assert!(db.find_node_in_open_namespace("QFlags", &[NodeKind::Class]).is_none());
}
