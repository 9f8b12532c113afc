//! Assertion helpers over database query results.

use docforest::{Database, DiagnosticKind, FindFlags, NodeRef};

/// Full `::` name of a node in any tree.
pub fn full_name(db: &Database, node: NodeRef) -> String {
    db.forest()
        .full_name(node)
        .unwrap_or_else(|| panic!("{:?} is not in the forest", node))
}

/// Assert `path` resolves from `relative` and return the hit.
pub fn assert_finds(
    db: &Database,
    path: &str,
    relative: Option<NodeRef>,
    flags: FindFlags,
    expected: &str,
) -> NodeRef {
    let found = db
        .find_node(path, relative, flags)
        .unwrap_or_else(|| panic!("'{}' did not resolve", path));
    assert_eq!(
        full_name(db, found),
        expected,
        "'{}' resolved to the wrong node",
        path
    );
    found
}

/// Full names of every ancestor of `class`, nearest first.
pub fn base_names(db: &Database, class: NodeRef) -> Vec<String> {
    db.all_base_classes(class)
        .into_iter()
        .map(|base| full_name(db, base))
        .collect()
}

pub fn count_diagnostics(db: &Database, kind: DiagnosticKind) -> usize {
    db.diagnostics().iter().filter(|d| d.kind == kind).count()
}

pub fn assert_no_warnings(db: &Database) {
    assert!(
        !db.has_warnings(),
        "Expected no warnings, got {}:\n{}",
        db.diagnostics().len(),
        db.diagnostics()
            .iter()
            .map(|d| format!("  {}", d))
            .collect::<Vec<_>>()
            .join("\n")
    );
}
