//! Inheritance resolution through the database.

use std::path::{Path, PathBuf};

use docforest::{Database, DiagnosticKind, NodeId};
use rstest::rstest;

use crate::helpers::assertions::{base_names, count_diagnostics};
use crate::helpers::builders::{add_class, add_namespace, loading_db, primary_ref, write_index};

#[test]
fn test_single_base_is_bound() {
    let mut db = loading_db("Shapes");
    add_class(&mut db, NodeId::ROOT, "A", &[]);
    let b = add_class(&mut db, NodeId::ROOT, "B", &["A"]);
    db.resolve().expect("resolve");

    assert_eq!(base_names(&db, primary_ref(&db, b)), vec!["A"]);
    assert_eq!(count_diagnostics(&db, DiagnosticKind::UnresolvedBase), 0);
}

#[test]
fn test_missing_base_is_reported_not_fatal() {
    let mut db = loading_db("Shapes");
    let b = add_class(&mut db, NodeId::ROOT, "B", &["A"]);
    db.resolve().expect("resolve");

    assert!(base_names(&db, primary_ref(&db, b)).is_empty());
    assert_eq!(count_diagnostics(&db, DiagnosticKind::UnresolvedBase), 1);
    let diagnostic = &db.diagnostics()[0];
    assert_eq!(diagnostic.node, Some(primary_ref(&db, b)));
    assert!(diagnostic.message.contains('A'));
}

#[rstest]
#[case::declared_in_order(&["C1", "C2", "C3"])]
#[case::declared_reversed(&["C3", "C2", "C1"])]
#[case::declared_mixed(&["C2", "C3", "C1"])]
fn test_chain_converges_regardless_of_order(#[case] order: &[&str]) {
    let mut db = loading_db("Chain");
    let mut c3 = None;
    for &name in order {
        let bases: &[&str] = match name {
            "C3" => &["C2"],
            "C2" => &["C1"],
            _ => &[],
        };
        let id = add_class(&mut db, NodeId::ROOT, name, bases);
        if name == "C3" {
            c3 = Some(id);
        }
    }
    db.resolve().expect("resolve");

    let c3 = primary_ref(&db, c3.expect("C3 created"));
    assert_eq!(base_names(&db, c3), vec!["C2", "C1"]);
    assert!(!db.has_warnings());
}

#[test]
fn test_base_in_enclosing_namespace() {
    let mut db = loading_db("QtGui");
    let gui = add_namespace(&mut db, NodeId::ROOT, "Gui");
    add_class(&mut db, gui, "QPaintDevice", &[]);
    let painting = add_namespace(&mut db, gui, "Painting");
    let image = add_class(&mut db, painting, "QImage", &["QPaintDevice"]);
    db.resolve().expect("resolve");

    assert_eq!(base_names(&db, primary_ref(&db, image)), vec!["Gui::QPaintDevice"]);
}

#[test]
fn test_base_from_index_tree() {
    let dir = tempfile::tempdir().expect("temp dir");
    let core = write_index(dir.path(), "QtCore", |db| {
        add_class(db, NodeId::ROOT, "QObject", &[]);
    });

    let mut db = loading_db("QtWidgets");
    db.read_indexes(&[core]).expect("read index");
    let widget = add_class(&mut db, NodeId::ROOT, "QWidget", &["QObject"]);
    let button = add_class(&mut db, NodeId::ROOT, "QAbstractButton", &["QWidget"]);
    db.resolve().expect("resolve");

    let widget = primary_ref(&db, widget);
    let bases = db.all_base_classes(widget);
    assert_eq!(bases.len(), 1);
    assert_ne!(bases[0].tree, widget.tree);
    assert_eq!(db.forest().module_of(bases[0]), Some("QtCore"));
    assert_eq!(
        base_names(&db, primary_ref(&db, button)),
        vec!["QWidget", "QObject"]
    );
}

fn write_gui(dir: &Path) -> PathBuf {
    write_index(dir, "QtGui", |db| {
        add_class(db, NodeId::ROOT, "Y", &["Z"]);
        add_class(db, NodeId::ROOT, "Z", &[]);
    })
}

fn write_widgets(dir: &Path) -> PathBuf {
    write_index(dir, "QtWidgets", |db| {
        add_class(db, NodeId::ROOT, "X", &["Y"]);
    })
}

fn ancestors_of(db: &Database, name: &str) -> Vec<String> {
    let class = db.find_class_node(name).expect("class");
    base_names(db, class)
}

#[rstest]
#[case::dependency_first(true)]
#[case::dependent_first(false)]
fn test_index_ancestors_ignore_load_order(#[case] gui_first: bool) {
    let dir = tempfile::tempdir().expect("temp dir");
    let gui = write_gui(dir.path());
    let widgets = write_widgets(dir.path());
    let paths = if gui_first { vec![gui, widgets] } else { vec![widgets, gui] };

    let mut db = loading_db("App");
    db.read_indexes(&paths).expect("read indexes");

    assert_eq!(ancestors_of(&db, "X"), vec!["Y", "Z"]);
    db.resolve().expect("resolve");
    assert_eq!(ancestors_of(&db, "X"), vec!["Y", "Z"]);
}

#[test]
fn test_later_index_binds_earlier_bases() {
    let dir = tempfile::tempdir().expect("temp dir");
    let gui = write_gui(dir.path());
    let widgets = write_widgets(dir.path());

    let mut db = loading_db("App");
    db.read_indexes(&[widgets]).expect("read widgets");
    assert!(ancestors_of(&db, "X").is_empty());

    db.read_indexes(&[gui]).expect("read gui");
    assert_eq!(ancestors_of(&db, "X"), vec!["Y", "Z"]);
}
