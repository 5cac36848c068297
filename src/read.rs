//! Read operations.
//!
//! - Getting one item by its primary key facets
//! - Querying an index through a [`query::QueryChain`], either by access pattern or routed
//!   from an arbitrary bag of attributes

/// Get item operation for retrieving a single item by primary key.
pub mod get_item;

/// Query chains over one index.
pub mod query;
