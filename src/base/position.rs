//! Source provenance of a node.
//!
//! Stores where a symbol was declared (file and 1-based line/column) so that
//! diagnostics can point back at it. The owning module is known from the tree.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<SmolStr>,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<SmolStr>, line: u32, column: u32) -> Self {
        Self {
            file: Some(file.into()),
            line,
            column,
        }
    }

    /// A location with no source file (synthetic nodes, index trees without provenance)
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_known(&self) -> bool {
        self.file.is_some()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file, self.line, self.column),
            None => f.write_str("<unknown>"),
        }
    }
}
