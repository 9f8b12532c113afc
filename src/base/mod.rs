//! Foundation types for the documentation database.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`NodeId`], [`TreeId`], [`NodeRef`] - Arena and forest addresses
//! - [`Location`] - Source provenance for diagnostics
//! - [`canonical_title`], [`split_path`] - Key normalization helpers
//!
//! This module has NO dependencies on other docforest modules.

mod ids;
mod position;
mod text;

pub use ids::{NodeId, NodeRef, TreeId};
pub use position::Location;
pub use text::{canonical_title, join_path, split_path};
