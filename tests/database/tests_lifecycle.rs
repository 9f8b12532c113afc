//! Lifecycle, determinism and aggregation.

use docforest::{Database, DatabaseError, NodeId, NodePayload, Phase};
use rstest::rstest;

use crate::helpers::builders::{add_class, add_function, loading_db, qt_core};

fn resolved_core() -> Database {
    let mut db = loading_db("QtCore");
    qt_core(&mut db);
    db.resolve().expect("resolve");
    db
}

#[test]
fn test_queries_are_deterministic() {
    let first = resolved_core();
    let second = resolved_core();

    for target in ["QString", "QString::toUpper()", "Qt::AlignLeft", "Missing"] {
        let a = first.resolve_target(target, None);
        assert_eq!(a, first.resolve_target(target, None), "repeat of '{target}'");
        assert_eq!(a, second.resolve_target(target, None), "rebuild of '{target}'");
    }
    assert_eq!(first.find_class_node("QObject"), second.find_class_node("QObject"));
    assert_eq!(
        first.find_unambiguous_target("QString", None),
        second.find_unambiguous_target("QString", None)
    );
}

#[test]
fn test_build_collections_twice_is_identical() {
    let mut db = resolved_core();
    db.build_collections();
    let first = db.collections().clone();
    db.build_collections();

    assert_eq!(db.collections(), &first);
    assert_eq!(db.collections().class_count(), 2);
    assert_eq!(db.collections().classes["QString"].len(), 1);
}

#[test]
fn test_collections_before_resolve_still_build() {
    let mut db = loading_db("QtCore");
    qt_core(&mut db);
    db.build_collections();

    assert_eq!(db.phase(), Phase::Loading);
    assert!(db.collections().classes.contains_key("QObject"));
}

#[rstest]
#[case::from_loading(false, false)]
#[case::from_resolved(true, false)]
#[case::from_aggregated(true, true)]
fn test_finalize_completes_remaining_phases(#[case] resolve: bool, #[case] aggregate: bool) {
    let mut db = loading_db("QtCore");
    qt_core(&mut db);
    if resolve {
        db.resolve().expect("resolve");
    }
    if aggregate {
        db.build_collections();
    }

    db.finalize().expect("finalize");
    assert_eq!(db.phase(), Phase::Queryable);
    assert!(db.collections().namespaces.contains_key("Qt"));
}

#[test]
fn test_recoverable_problems_leave_database_usable() {
    let mut db = loading_db("QtWidgets");
    let widget = add_class(&mut db, NodeId::ROOT, "QWidget", &["QPaintDevice"]);
    add_function(&mut db, widget, "show");
    add_function(&mut db, widget, "show");

    db.finalize().expect("finalize");

    assert!(db.has_warnings());
    assert_eq!(db.phase(), Phase::Queryable);
    assert!(db.find_class_node("QWidget").is_some());
}

#[test]
fn test_structural_errors_are_fatal() {
    let mut db = loading_db("QtCore");
    let value = db
        .create_node(NodeId::ROOT, "Leaf", NodePayload::EnumValue { value: None })
        .expect("create value");

    let err = db
        .create_node(value, "Child", NodePayload::class())
        .unwrap_err();
    assert!(matches!(err, DatabaseError::NotInnerNode { .. }));
    assert!(!err.is_recoverable());
}
