use crate::{
    common,
    error::Result,
    index::IndexRegistry,
};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use serde_dynamo::to_attribute_value;
use serde_json::Value;
use std::collections;

/// Separator placed before every `name_value` segment of a composite key.
const SEGMENT_SEPARATOR: char = '#';

/// Composite keys of one index.
///
/// `sk` holds one string per supplied sort key partial.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct KeyResult {
    /// The partition key.
    pub pk: String,
    /// The sort keys, one per partial.
    pub sk: Vec<String>,
}

pub(crate) fn render_value(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}

/// Walk the facets in order, stopping at the first one without a value.
fn compose_key(prefix: &str, facets: &[String], values: &common::Facets) -> String {
    let mut key = prefix.to_string();
    for facet in facets {
        match values.get(facet) {
            Some(value) if !value.is_null() => {
                key.push(SEGMENT_SEPARATOR);
                key.push_str(facet);
                key.push('_');
                key.push_str(&render_value(value));
            }
            _ => break,
        }
    }
    key
}

impl IndexRegistry {
    /// Compose the partition key and one sort key per partial for an index.
    ///
    /// The partition key is scoped by service and version, the sort key by entity. A sort key
    /// ends right before the first facet missing from its partial, which yields a prefix usable
    /// with `begins_with` and range comparisons.
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
    ///     "attributes": {"mall": {}, "building": {}, "unit": {}},
    ///     "indexes": {
    ///         "units": {
    ///             "pk": {"field": "pk", "facets": ["mall"]},
    ///             "sk": {"field": "sk", "facets": ["building", "unit"]}
    ///         }
    ///     }
    /// })).unwrap();
    /// let entity = entity::Entity::new(schema).unwrap();
    /// let pk = json!({"mall": "EastPointe"});
    /// let sk = json!({"unit": "B54"});
    /// let keys = entity
    ///     .registry()
    ///     .compose("", pk.as_object().unwrap(), &[sk.as_object().unwrap()])
    ///     .unwrap();
    /// assert_eq!(keys.pk, "$MallStoreDirectory_1#mall_EastPointe");
    /// assert_eq!(keys.sk, vec!["$MallStores".to_string()]);
    /// ```
    pub fn compose(
        &self,
        index_id: &str,
        pk_values: &common::Facets,
        sk_partials: &[&common::Facets],
    ) -> Result<KeyResult> {
        let index = self.get(index_id)?;
        let pk = compose_key(&self.pk_prefix, &index.pk.facets, pk_values);
        let sk = sk_partials
            .iter()
            .map(|partial| compose_key(&self.sk_prefix, index.sk_facets(), partial))
            .collect();
        Ok(KeyResult { pk, sk })
    }
}

/// Convert an ordered map of JSON values into DynamoDB attribute values.
pub(crate) fn to_attribute_values(
    values: IndexMap<String, Value>,
) -> Result<collections::HashMap<String, types::AttributeValue>> {
    let mut attribute_values = collections::HashMap::with_capacity(values.len());
    for (name, value) in values {
        let value = to_attribute_value(value)?;
        attribute_values.insert(name, value);
    }
    Ok(attribute_values)
}
