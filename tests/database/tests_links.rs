//! Link targets, anchors and their tie-breaks.

use docforest::node::{NodePayload, TargetKind};
use docforest::tree::TargetRec;
use docforest::{Database, DiagnosticKind, NodeId, Tree, TreeId};
use rstest::rstest;

use crate::helpers::assertions::{assert_no_warnings, count_diagnostics, full_name};
use crate::helpers::builders::{add_class, add_function, loading_db, primary_ref, qt_core};

fn resolved_core() -> Database {
    let mut db = loading_db("QtCore");
    qt_core(&mut db);
    db.resolve().expect("resolve");
    db
}

#[rstest]
#[case::class("QString", Some("QString"))]
#[case::function_call("QString::toUpper()", Some("QString::toUpper"))]
#[case::function_without_parens("QString::toUpper", None)]
#[case::enum_value("Qt::AlignLeft", Some("Qt::Alignment::AlignLeft"))]
#[case::missing("QStringView", None)]
fn test_resolve_target(#[case] target: &str, #[case] expected: Option<&str>) {
    let db = resolved_core();
    let found = db.resolve_target(target, None).map(|n| full_name(&db, n));
    assert_eq!(found.as_deref(), expected);
}

#[test]
fn test_resolve_type_skips_functions() {
    let mut db = loading_db("QtCore");
    let string = add_class(&mut db, NodeId::ROOT, "QString", &[]);
    add_function(&mut db, string, "QChar");
    add_class(&mut db, NodeId::ROOT, "QChar", &[]);
    db.resolve().expect("resolve");

    let relative = Some(primary_ref(&db, string));
    let found = db.resolve_type("QChar", relative).expect("type");
    assert_eq!(full_name(&db, found), "QChar");
}

#[test]
fn test_class_beats_keyword_at_equal_priority() {
    let mut tree = Tree::new(TreeId(0), "QtWidgets");
    let page = tree
        .create_node(NodeId::ROOT, "widgets.html", NodePayload::page("Widgets"))
        .expect("page");
    let class = tree
        .create_node(NodeId::ROOT, "QWidget", NodePayload::class())
        .expect("class");
    tree.insert_target("QWidget", TargetRec::new(page, TargetKind::Keyword, "qwidget").with_priority(5));
    tree.insert_target("QWidget", TargetRec::new(class, TargetKind::Class, "").with_priority(5));

    let hit = tree.find_unambiguous_target("QWidget", None).expect("target");
    assert_eq!(hit.node, class);
    assert_eq!(hit.ambiguous, vec![page]);
}

#[test]
fn test_ambiguous_anchor_picks_first_and_reports() {
    let mut db = loading_db("QtDoc");
    let first = db
        .create_node(NodeId::ROOT, "a.html", NodePayload::page("Page A"))
        .expect("page");
    let second = db
        .create_node(NodeId::ROOT, "b.html", NodePayload::page("Page B"))
        .expect("page");
    db.record_target(first, "Examples", TargetKind::Target).expect("target");
    db.record_target(second, "Examples", TargetKind::Target).expect("target");
    db.resolve().expect("resolve");
    assert_no_warnings(&db);

    let link = db.resolve_link("Examples", None).expect("link");
    assert_eq!(link.node, primary_ref(&db, first));
    assert_eq!(count_diagnostics(&db, DiagnosticKind::AmbiguousTarget), 1);
    assert_eq!(db.diagnostics()[0].related.len(), 1);
    assert_eq!(db.diagnostics()[0].related[0].node, primary_ref(&db, second));
}

#[test]
fn test_anchor_in_callers_qml_module_wins() {
    let mut db = loading_db("QtQuick");
    let controls = db
        .create_node(NodeId::ROOT, "Button", NodePayload::qml_type())
        .expect("type");
    let quick = db
        .create_node(NodeId::ROOT, "MouseArea", NodePayload::qml_type())
        .expect("type");
    db.add_to_qml_module("QtQuick.Controls 2.0", controls).expect("module");
    db.add_to_qml_module("QtQuick 2.0", quick).expect("module");
    db.record_target(controls, "pressed", TargetKind::Keyword).expect("target");
    db.record_target(quick, "pressed", TargetKind::Keyword).expect("target");
    db.resolve().expect("resolve");

    let hit = db
        .find_unambiguous_target("pressed", Some(primary_ref(&db, quick)))
        .expect("target");
    assert_eq!(hit.node, primary_ref(&db, quick));
    assert_eq!(hit.ambiguous, vec![primary_ref(&db, controls)]);
}

#[test]
fn test_unresolved_link_is_recorded() {
    let mut db = resolved_core();
    let string = db.find_class_node("QString").expect("class");

    assert!(db.resolve_link("QStringView", Some(string)).is_none());
    assert_eq!(count_diagnostics(&db, DiagnosticKind::UnresolvedTarget), 1);
    let diagnostic = &db.diagnostics()[0];
    assert_eq!(diagnostic.node, Some(string));
    assert_eq!(diagnostic.module.as_str(), "QtCore");
    assert_eq!(diagnostic.code(), "W0003");
}

#[test]
fn test_empty_target_is_the_relative_node() {
    let db = resolved_core();
    let string = db.find_class_node("QString");
    assert_eq!(db.find_node_for_target("", string), string);
}
