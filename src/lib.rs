#![deny(missing_docs)]

//! # DynamoDB Facet
//!
//! Access patterns for single-table DynamoDB designs, derived from a declarative entity schema.
//!
//! ## Overview
//!
//! An entity schema names the attributes of an entity and the indexes it is reachable through.
//! Every index composes its partition and sort keys from ordered attributes, its facets.
//! From that schema the crate:
//! - Composes the physical key strings of any index, truncating sort keys at the first
//!   missing facet so they can serve as prefixes
//! - Routes an arbitrary bag of attributes to the most specific index
//! - Compiles filter and condition functions into parameterized expressions whose
//!   placeholders never collide
//!
//! ## Quick Example
//!
//! ```rust
//! use dynamodb_facet::{entity, schema};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema: schema::EntitySchema = serde_json::from_value(json!({
//!     "service": "MallStoreDirectory",
//!     "entity": "MallStores",
//!     "table": "StoreDirectory",
//!     "version": "1",
//!     "attributes": {
//!         "id": {"field": "storeLocationId"},
//!         "mall": {"field": "mallId", "required": true},
//!         "building": {"required": true},
//!         "unit": {"required": true},
//!         "store": {"required": true},
//!         "rent": {"default": "0.00"}
//!     },
//!     "indexes": {
//!         "store": {"pk": {"field": "pk", "facets": ["id"]}},
//!         "units": {
//!             "index": "gsi1pk-gsi1sk-index",
//!             "pk": {"field": "gsi1pk", "facets": ["mall"]},
//!             "sk": {"field": "gsi1sk", "facets": ["building", "unit", "store"]}
//!         }
//!     }
//! }))?;
//! let mall_stores = entity::Entity::new(schema)?;
//! let params = mall_stores
//!     .query("units", &json!({"mall": "EastPointe", "building": "BuildingA"}))?
//!     .between(&json!({"unit": "A1"}), &json!({"unit": "F6"}))?
//!     .filter(|attributes| attributes.attribute("rent").gte("20.00"))?
//!     .params()?;
//! assert_eq!(
//!     params.key_condition_expression,
//!     "#pk = :pk and #sk1 BETWEEN :sk1 AND :sk2"
//! );
//! assert_eq!(
//!     params.expression_attribute_values[":sk1"],
//!     json!("$MallStores#building_BuildingA#unit_A1")
//! );
//! assert_eq!(params.filter_expression.as_deref(), Some("#rent >= :rent1"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`mod@schema`] - Declarative schemas and their validation
//! - [`mod@index`] - The index registry and index selection
//! - [`mod@common`] - Key composition, facet checks and the expression compiler
//! - [`mod@entity`] - The entity facade handing out operations
//! - [`mod@read`] - Get item and query chains
//! - [`mod@write`] - Put, update and delete item

/// Key composition, facet expectations and the filter/condition expression compiler.
pub mod common;

/// The entity facade.
pub mod entity;

/// Error types.
pub mod error;

/// The index registry and index selection.
pub mod index;

/// Read operations: get item and query chains.
pub mod read;

/// Entity schemas and the attribute model.
pub mod schema;

/// Write operations: put, update and delete item.
pub mod write;

#[cfg(test)]
mod fixtures;
