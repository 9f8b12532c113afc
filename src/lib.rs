//! # docforest-base
//!
//! Symbol database for documentation generators: per-module symbol trees,
//! a forest of loaded modules with a defined search order, and the
//! resolution passes that bind inheritance, property accessors, QML types
//! and link targets.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! database  → Lifecycle, parser interface, collections, link resolution
//!   ↓
//! index     → JSON index files for cross-module linking
//!   ↓
//! forest    → Trees of all loaded modules, search order, cross-tree lookup
//!   ↓
//! tree      → One module's arena: lookup, targets, inheritance, properties
//!   ↓
//! node      → Node kinds, payloads, anchors, child maps
//!   ↓
//! base      → Primitives (NodeId, TreeId, NodeRef, Location, title keys)
//! ```
//!
//! `diagnostics`, `error` and `config` sit beside the stack and are used by
//! every layer above `node`.

// ============================================================================
// MODULES (dependency order: base → node → tree → forest → index → database)
// ============================================================================

/// Foundation types: ids, locations, key normalization
pub mod base;

/// Node data model: kinds, payloads, anchors
pub mod node;

/// Single-module symbol tree and its resolution passes
pub mod tree;

/// All loaded trees and the search order across them
pub mod forest;

/// Index file format, reading and writing
pub mod index;

/// Top-level database and its lifecycle
pub mod database;

/// Recoverable problems found while resolving
pub mod diagnostics;

/// Fatal errors
pub mod error;

/// Run configuration
pub mod config;

// Re-export foundation types
pub use base::{Location, NodeId, NodeRef, TreeId};

pub use config::DatabaseConfig;
pub use database::{Database, Link, Phase};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use error::{DatabaseError, Result};
pub use forest::{Forest, ForestTarget, ForestView};
pub use node::{Node, NodeKind, NodePayload, TargetKind};
pub use tree::{FindFlags, Tree};
