//! Database configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, Result};

/// Settings for one documentation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// Name of the project being documented.
    pub project: String,
    /// Version string reported to generators.
    pub version: String,
    /// Include `Internal` nodes in the aggregated collections.
    pub show_internal: bool,
    /// Index files of previously documented modules.
    pub index_files: Vec<PathBuf>,
    /// Module names in search priority order. Modules not listed follow in
    /// registration order.
    pub search_priority: Vec<String>,
    /// Deserialize index files on the rayon pool.
    pub parallel_index_loading: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            project: String::new(),
            version: String::new(),
            show_internal: false,
            index_files: Vec::new(),
            search_priority: Vec::new(),
            parallel_index_loading: true,
        }
    }
}

impl DatabaseConfig {
    pub fn new(project: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| DatabaseError::Config(e.to_string()))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| DatabaseError::io(path, e))?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!("[CONFIG] loaded {}", path.display());
        Ok(config)
    }
}
