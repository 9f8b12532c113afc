//! Fatal error types.
//!
//! Anything here aborts the run: the database cannot be trusted afterwards.
//! Recoverable conditions are [`Diagnostic`](crate::diagnostics::Diagnostic)s.

use std::path::PathBuf;

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::NodeId;
use crate::node::NodeKind;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An index file could not be parsed or violates the format.
    #[error("malformed index file {}: {message}", path.display())]
    MalformedIndex { path: PathBuf, message: String },

    /// IO error while reading or writing a file.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file could not be read.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A structural invariant of a tree does not hold.
    #[error("invariant violated in module '{module}': {message}")]
    Invariant { module: SmolStr, message: String },

    /// A child was added to a node that cannot own children.
    #[error("cannot add '{child}' under {kind} node {parent:?}")]
    NotInnerNode {
        parent: NodeId,
        kind: NodeKind,
        child: SmolStr,
    },

    /// A node id does not exist in the tree it was used with.
    #[error("unknown node {node:?} in module '{module}'")]
    UnknownNode { module: SmolStr, node: NodeId },

    /// A structurally identical function already exists under the parent.
    #[error("duplicate definition of '{name}{signature}'")]
    DuplicateDefinition {
        name: SmolStr,
        signature: String,
        existing: NodeId,
    },

    #[error("no primary tree has been created")]
    NoPrimaryTree,

    /// Parser-facing mutation after resolution has completed.
    #[error("the database is {0} and no longer accepts changes to the primary tree")]
    Frozen(&'static str),
}

impl DatabaseError {
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedIndex {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invariant(module: impl Into<SmolStr>, message: impl Into<String>) -> Self {
        Self::Invariant {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Returns true for the one error the parser is expected to recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::DuplicateDefinition { .. })
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
