//! The entity facade: a resolved schema and the operations it hands out.

use crate::{
    common::{self, condition, facet},
    error::{Error, Result},
    index, read, schema, write,
};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections;

/// An entity bound to its resolved schema.
///
/// Building an entity validates the schema once; every operation afterwards reads the same
/// immutable model, so an entity can be shared freely between tasks.
///
/// ```rust
/// use dynamodb_facet::{entity, schema};
/// use serde_json::json;
///
/// let schema: schema::EntitySchema = serde_json::from_value(json!({
///     "service": "MallStoreDirectory",
///     "entity": "MallStores",
///     "table": "StoreDirectory",
///     "version": "1",
///     "attributes": {"id": {}, "mall": {}, "unit": {}},
///     "indexes": {
///         "store": {"pk": {"field": "pk", "facets": ["id"]}},
///         "units": {
///             "index": "gsi1",
///             "pk": {"field": "gsi1pk", "facets": ["mall"]},
///             "sk": {"field": "gsi1sk", "facets": ["unit"]}
///         }
///     }
/// }))
/// .unwrap();
/// let mall_stores = entity::Entity::new(schema).unwrap();
/// let params = mall_stores.get(&json!({"id": "1"})).unwrap().params();
/// assert_eq!(params.key["pk"], json!("$MallStoreDirectory_1#id_1"));
/// ```
#[derive(Clone, Debug)]
pub struct Entity {
    model: schema::Model,
}

impl Entity {
    /// Resolve and validate a schema.
    pub fn new(schema: schema::EntitySchema) -> Result<Self> {
        let model: schema::Model = schema.try_into()?;
        Ok(Self { model })
    }

    /// The indexes of the entity.
    pub fn registry(&self) -> &index::IndexRegistry {
        &self.model.registry
    }

    /// The attributes of the entity, in declaration order.
    pub fn attributes(&self) -> &IndexMap<String, schema::attribute::Attribute> {
        &self.model.attributes
    }

    /// The table the entity is stored in.
    pub fn table(&self) -> &str {
        &self.model.table
    }

    /// The attribute surface handed to filter and condition functions.
    pub fn filter_attributes(&self) -> condition::FilterAttributes<'_> {
        condition::FilterAttributes::new(&self.model.attributes)
    }

    pub(crate) fn custom_filter(&self, name: &str) -> Option<&condition::CustomFilter> {
        self.model.filters.get(name)
    }

    /// Serialize caller values and validate the ones naming a known attribute.
    ///
    /// Unknown names are kept untouched, `null` values are kept and count as missing.
    pub(crate) fn facet_values<T: Serialize>(&self, values: &T) -> Result<common::Facets> {
        let values = common::to_facets(values)?;
        for (name, value) in &values {
            if value.is_null() {
                continue;
            }
            if let Some(attribute) = self.model.attributes.get(name) {
                attribute
                    .is_valid(value)
                    .map_err(|reason| Error::invalid_attribute(name, reason))?;
            }
        }
        Ok(values)
    }

    /// Compose the primary key of one item, keyed by physical field.
    pub(crate) fn primary_key(&self, facets: &common::Facets) -> Result<IndexMap<String, Value>> {
        let primary = self.registry().primary();
        facet::expect_facets(facets, &primary.pk.facets, Some("partition keys"))?;
        facet::expect_facets(facets, primary.sk_facets(), Some("sort keys"))?;
        let keys = self.registry().compose(&primary.id, facets, &[facets])?;
        let mut key = IndexMap::from([(primary.pk.field.clone(), Value::String(keys.pk))]);
        if let (Some(sk), Some(value)) = (&primary.sk, keys.sk.into_iter().next()) {
            key.insert(sk.field.clone(), Value::String(value));
        }
        Ok(key)
    }

    /// Translate a stored item back to attribute names, dropping key fields.
    pub(crate) fn format_item(
        &self,
        item: collections::HashMap<String, types::AttributeValue>,
    ) -> Result<common::Facets> {
        let mut stored: common::Facets = serde_dynamo::from_item(item)?;
        let formatted = self
            .model
            .attributes
            .values()
            .filter_map(|attribute| {
                stored
                    .remove(&attribute.field)
                    .map(|value| (attribute.name.clone(), value))
            })
            .collect();
        Ok(formatted)
    }

    /// Read one item by its primary key facets.
    pub fn get<T: Serialize>(&self, facets: &T) -> Result<read::get_item::GetItem<'_>> {
        read::get_item::GetItem::new(self, facets)
    }

    /// Delete one item by its primary key facets.
    pub fn delete<T: Serialize>(&self, facets: &T) -> Result<write::delete_item::DeleteItem<'_>> {
        write::delete_item::DeleteItem::new(self, facets)
    }

    /// Write a whole item, with the keys of every index.
    pub fn put<T: Serialize>(&self, item: &T) -> Result<write::put_item::PutItem<'_>> {
        write::put_item::PutItem::new(self, item)
    }

    /// Update the item identified by its primary key facets.
    pub fn update<T: Serialize>(&self, facets: &T) -> Result<write::update_item::UpdateItem<'_>> {
        write::update_item::UpdateItem::new(self, facets)
    }

    /// Query the index declared under `access_pattern`.
    pub fn query<T: Serialize>(
        &self,
        access_pattern: &str,
        facets: &T,
    ) -> Result<read::query::QueryChain<'_>> {
        let index = self.registry().by_name(access_pattern)?;
        let facets = self.facet_values(facets)?;
        read::query::QueryChain::new(self, index, facets)
    }

    /// Query the index that makes use of the most supplied attributes.
    ///
    /// Attributes the chosen index cannot use become equality filters.
    pub fn find<T: Serialize>(&self, attributes: &T) -> Result<read::query::QueryChain<'_>> {
        let supplied = self.facet_values(attributes)?;
        let names: Vec<_> = supplied
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, _)| name.as_str())
            .collect();
        let matched = self.registry().find_best_match(&names);
        if matched.is_empty() {
            let primary = self.registry().primary();
            let missing = primary
                .pk
                .facets
                .iter()
                .filter(|facet| !common::is_present(&supplied, facet))
                .cloned()
                .collect();
            return Err(Error::incomplete_facets(Some("partition keys"), missing));
        }
        let index = self.registry().get(&matched.index)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(index = %index.name, keys = matched.keys.len(), "routed find to index");
        let (facets, remaining): (common::Facets, common::Facets) = supplied
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .partition(|(name, _)| matched.keys.iter().any(|key| &key.name == name));
        let chain = read::query::QueryChain::new(self, index, facets)?;
        if remaining.is_empty() {
            return Ok(chain);
        }
        chain.filter(|attributes| {
            condition::FilterExpression::all(
                remaining
                    .into_iter()
                    .map(|(name, value)| attributes.attribute(&name).eq(value))
                    .collect(),
            )
        })
    }
}
