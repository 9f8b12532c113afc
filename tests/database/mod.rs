//! Database layer tests
//!
//! End-to-end tests through the public [`docforest::Database`] API:
//! - Lifecycle and aggregation
//! - Inheritance resolution within and across modules
//! - Search order across the forest
//! - Index file round trips
//! - Link target resolution

mod tests_forest;
mod tests_index;
mod tests_inheritance;
mod tests_lifecycle;
mod tests_links;
