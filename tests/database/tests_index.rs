//! Index files written by one run and read by another.

use docforest::node::TargetKind;
use docforest::{Database, DatabaseConfig, DatabaseError, FindFlags, NodeId, NodePayload};
use rstest::rstest;

use crate::helpers::assertions::{base_names, full_name};
use crate::helpers::builders::{add_class, loading_db, primary_ref, qt_core, write_index};

fn build_core(db: &mut Database) {
    qt_core(db);
    let app = add_class(db, NodeId::ROOT, "QCoreApplication", &["QObject"]);
    db.node_mut(app)
        .expect("app")
        .set_doc("Provides an event loop.")
        .set_since("4.0");
    db.add_to_group("application", app).expect("group");
    let page = db
        .create_node(NodeId::ROOT, "signalsandslots.html", NodePayload::page("Signals & Slots"))
        .expect("page");
    db.record_target(page, "Queued Connections", TargetKind::Target)
        .expect("target");
}

const PATHS: &[&str] = &[
    "QObject",
    "QString",
    "QString::toUpper",
    "Qt",
    "Qt::Alignment",
    "Qt::AlignLeft",
    "QCoreApplication",
    "Missing",
];

#[test]
fn test_round_trip_preserves_lookups() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut original = loading_db("QtCore");
    build_core(&mut original);
    original.finalize().expect("finalize");
    let path = dir.path().join("qtcore.index.json");
    original.generate_index(&path).expect("write index");

    let mut loaded = Database::new(DatabaseConfig::new("Qt", "6.5"));
    let ids = loaded.read_indexes(&[path]).expect("read index");
    assert_eq!(ids.len(), 1);

    let flags = FindFlags::SEARCH_ENUM_VALUES;
    for path in PATHS {
        let before = original.find_node(path, None, flags).map(|n| full_name(&original, n));
        let after = loaded.find_node(path, None, flags).map(|n| full_name(&loaded, n));
        assert_eq!(before, after, "lookup of '{path}' changed");
    }
}

#[test]
fn test_round_trip_rebinds_and_registers() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_index(dir.path(), "QtCore", build_core);

    let mut db = loading_db("QtWidgets");
    db.read_indexes(&[path]).expect("read index");

    let app = db.find_class_node("QCoreApplication").expect("class");
    assert_eq!(base_names(&db, app), vec!["QObject"]);
    let node = db.node(app).expect("node");
    assert!(node.doc().is_none());
    assert!(node.has_doc());
    assert_eq!(node.since(), Some("4.0"));

    assert!(db.find_group("application").is_some());
    let page = db
        .find_node_for_target("signalsandslots.html", None)
        .expect("page");
    assert_eq!(db.find_node_for_target("Signals & Slots", None), Some(page));
    let link = db.resolve_link("Queued Connections", None).expect("link");
    assert_eq!(link.node, page);
    assert_eq!(link.anchor.as_deref(), Some("queued-connections"));
}

#[test]
fn test_index_trees_are_frozen_by_resolve() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_index(dir.path(), "QtCore", qt_core);

    let mut db = loading_db("QtWidgets");
    let ids = db.read_indexes(&[path]).expect("read index");
    assert!(!db.forest().tree(ids[0]).expect("tree").is_read_only());

    db.resolve().expect("resolve");
    assert!(db.forest().tree(ids[0]).expect("tree").is_read_only());
    assert!(!db.primary_tree().expect("primary").is_read_only());
}

#[rstest]
#[case::not_json("{ not json")]
#[case::future_format(r#"{"format": 99, "module": "QtCore", "nodes": []}"#)]
#[case::no_nodes(r#"{"format": 1, "module": "QtCore", "nodes": []}"#)]
#[case::root_not_namespace(
    r#"{"format": 1, "module": "QtCore", "nodes": [{"id": 0, "name": "", "kind": "class"}]}"#
)]
fn test_malformed_index_is_fatal(#[case] text: &str) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("broken.index.json");
    std::fs::write(&path, text).expect("write");

    let mut db = loading_db("QtWidgets");
    let err = db.read_indexes(&[path.clone()]).unwrap_err();
    match err {
        DatabaseError::MalformedIndex { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected MalformedIndex, got {other:?}"),
    }
    assert_eq!(db.forest().len(), 1);
}

#[test]
fn test_missing_index_file_is_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut db = loading_db("QtWidgets");
    let err = db
        .read_indexes(&[dir.path().join("absent.index.json")])
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Io { .. }));
}

#[test]
fn test_configured_index_files_are_read() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_index(dir.path(), "QtCore", qt_core);
    let text = serde_json::json!({
        "project": "Qt",
        "version": "6.5",
        "indexFiles": [path],
        "parallelIndexLoading": false,
    })
    .to_string();

    let mut db = Database::new(DatabaseConfig::from_json_str(&text).expect("config"));
    db.new_primary_tree("QtWidgets").expect("primary tree");
    let widget = add_class(&mut db, NodeId::ROOT, "QWidget", &["QObject"]);
    db.read_configured_indexes().expect("read indexes");
    db.finalize().expect("finalize");

    assert_eq!(base_names(&db, primary_ref(&db, widget)), vec!["QObject"]);
}
