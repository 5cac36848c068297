use crate::{entity::Entity, schema::EntitySchema};

use rstest::fixture;
use serde_json::{Value, json};

/// Store directory of a shopping mall, reachable through five access patterns.
#[fixture]
pub(crate) fn mall_stores() -> Entity {
    let schema: EntitySchema = serde_json::from_value(json!({
        "service": "MallStoreDirectory",
        "entity": "MallStores",
        "table": "StoreDirectory",
        "version": "1",
        "attributes": {
            "id": {"field": "storeLocationId"},
            "mall": {"field": "mallId", "required": true},
            "store": {"field": "storeId", "required": true},
            "building": {"field": "buildingId", "required": true},
            "unit": {"field": "unitId", "required": true},
            "category": {
                "type": ["food/coffee", "food/meal", "clothing", "electronics", "department", "misc"],
                "required": true
            },
            "leaseEnd": {"required": true},
            "rent": {"default": "0.00"},
            "adjustments": {}
        },
        "indexes": {
            "store": {
                "pk": {"field": "pk", "facets": ["id"]}
            },
            "units": {
                "index": "gsi1pk-gsi1sk-index",
                "pk": {"field": "gsi1pk", "facets": ["mall"]},
                "sk": {"field": "gsi1sk", "facets": ["building", "unit", "store"]}
            },
            "leases": {
                "index": "gsi2pk-gsi2sk-index",
                "pk": {"field": "gsi2pk", "facets": ["mall"]},
                "sk": {"field": "gsi2sk", "facets": ["leaseEnd", "store", "building", "unit"]}
            },
            "categories": {
                "index": "gsi3pk-gsi3sk-index",
                "pk": {"field": "gsi3pk", "facets": ["mall"]},
                "sk": {"field": "gsi3sk", "facets": ["category", "building", "unit", "store"]}
            },
            "shops": {
                "index": "gsi4pk-gsi4sk-index",
                "pk": {"field": "gsi4pk", "facets": ["store"]},
                "sk": {"field": "gsi4sk", "facets": ["mall", "building", "unit"]}
            }
        }
    }))
    .unwrap();
    let schema = schema.filter("maxRent", |attributes, args| {
        let max = args.first().cloned().unwrap_or(Value::Null);
        attributes.attribute("rent").lte(max)
    });
    Entity::new(schema).unwrap()
}
