//! Recoverable problems found while building the database.
//!
//! None of these unwind a resolution pass. They are collected, attached to
//! the offending node's location, and surfaced after the run. A run that only
//! produced diagnostics still yields a complete, queryable database.

use std::fmt;

use smol_str::SmolStr;

use crate::base::{Location, NodeRef};

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// What went wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// A function with an identical signature was declared twice; the first wins.
    DuplicateDefinition,
    /// A base class (C++ or QML) could not be bound.
    UnresolvedBase,
    /// A link target matched nothing in any tree.
    UnresolvedTarget,
    /// A property accessor function was not found next to the property.
    UnresolvedAccessor,
    /// Distinct nodes claim the same target with equal strength.
    AmbiguousTarget,
    /// Sibling page-producing nodes of different kinds share a name.
    NameCollision,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::DuplicateDefinition => codes::DUPLICATE_DEFINITION,
            DiagnosticKind::UnresolvedBase => codes::UNRESOLVED_BASE,
            DiagnosticKind::UnresolvedTarget => codes::UNRESOLVED_TARGET,
            DiagnosticKind::UnresolvedAccessor => codes::UNRESOLVED_ACCESSOR,
            DiagnosticKind::AmbiguousTarget => codes::AMBIGUOUS_TARGET,
            DiagnosticKind::NameCollision => codes::NAME_COLLISION,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Module of the tree the offending node lives in.
    pub module: SmolStr,
    pub location: Location,
    /// The offending node, when there is one.
    pub node: Option<NodeRef>,
    pub severity: Severity,
    pub message: String,
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug)]
pub struct RelatedInfo {
    pub node: NodeRef,
    pub location: Location,
    pub message: String,
}

impl Diagnostic {
    /// Create a new warning diagnostic.
    pub fn warning(
        kind: DiagnosticKind,
        module: impl Into<SmolStr>,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            module: module.into(),
            location,
            node: None,
            severity: Severity::Warning,
            message: message.into(),
            related: Vec::new(),
        }
    }

    pub fn with_node(mut self, node: NodeRef) -> Self {
        self.node = Some(node);
        self
    }

    /// Add related information.
    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.location,
            self.code(),
            self.module,
            self.message
        )
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
///
/// All resolution diagnostics are warnings; fatal conditions are
/// [`DatabaseError`](crate::DatabaseError)s instead.
pub mod codes {
    /// Structurally identical function declared twice.
    pub const DUPLICATE_DEFINITION: &str = "W0001";
    /// Base class not found.
    pub const UNRESOLVED_BASE: &str = "W0002";
    /// Documentation link target not found.
    pub const UNRESOLVED_TARGET: &str = "W0003";
    /// Property accessor function not found.
    pub const UNRESOLVED_ACCESSOR: &str = "W0004";
    /// Equal-strength candidates for one target.
    pub const AMBIGUOUS_TARGET: &str = "W0005";
    /// Sibling pages share a name.
    pub const NAME_COLLISION: &str = "W0006";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during a run.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("[DIAG] {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.add(diagnostic);
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Warning)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
