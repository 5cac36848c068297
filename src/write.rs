//! Write operations.
//!
//! Every write composes the keys it needs from attribute values and accepts an optional
//! condition compiled with the same expression compiler as query filters.

/// Condition and placeholder handling shared by write operations.
pub mod common;

/// Delete item operation for removing one item by primary key.
pub mod delete_item;

/// Put item operation for creating or replacing a whole item.
pub mod put_item;

/// Update item operation for assigning attributes of one item.
pub mod update_item;
