//! Declarative entity schemas and their one-time resolution.
//!
//! An [`EntitySchema`] is plain data, usually deserialized from JSON. Resolving it checks the
//! structure once and produces the immutable attributes and [`crate::index::IndexRegistry`]
//! every operation reads from.

/// Attribute model: types, defaults and validation of single values.
pub mod attribute;

use crate::{
    common::condition,
    error::{Error, Result},
    index,
};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::{collections, iter};

/// A key field and the ordered facets composed into it.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
pub struct KeyDefinition {
    /// The physical field the composed key is stored under.
    pub field: String,
    /// The attributes composed into the key, in order.
    #[serde(default)]
    pub facets: Vec<String>,
}

/// Declaration of one attribute.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    /// Static value used when none is supplied.
    #[serde(default)]
    pub default: Option<Value>,
    /// Physical field name, defaults to the attribute name.
    #[serde(default)]
    pub field: Option<String>,
    /// Human readable label, defaults to the attribute name.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether updates may change the attribute.
    #[serde(default)]
    pub read_only: bool,
    /// Whether a value must be present on writes.
    #[serde(default)]
    pub required: bool,
    /// The attribute type, `string` when omitted.
    #[serde(default, rename = "type")]
    pub kind: attribute::AttributeType,
}

/// Declaration of one index.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct IndexDefinition {
    /// The physical index name; omitted for the primary index.
    #[serde(default)]
    pub index: Option<String>,
    /// The partition key.
    pub pk: KeyDefinition,
    /// The sort key, if any.
    #[serde(default)]
    pub sk: Option<KeyDefinition>,
}

/// Declarative schema of an entity.
///
/// ```rust
/// use dynamodb_facet::schema;
/// use serde_json::json;
///
/// let schema: schema::EntitySchema = serde_json::from_value(json!({
///     "service": "MallStoreDirectory",
///     "entity": "MallStores",
///     "table": "StoreDirectory",
///     "version": "1",
///     "attributes": {
///         "id": {"field": "storeLocationId"},
///         "rent": {"default": "0.00"}
///     },
///     "indexes": {
///         "store": {"pk": {"field": "pk", "facets": ["id"]}}
///     }
/// }))
/// .unwrap();
/// let schema = schema.filter("maxRent", |attributes, args| {
///     attributes.attribute("rent").lte(args[0].clone())
/// });
/// assert!(schema.filters.contains_key("maxRent"));
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct EntitySchema {
    /// Attribute declarations, in order.
    pub attributes: IndexMap<String, AttributeDefinition>,
    /// Entity name, scopes sort keys.
    pub entity: String,
    /// Named custom filters, registered with [`EntitySchema::filter`].
    #[serde(skip)]
    pub filters: IndexMap<String, condition::CustomFilter>,
    /// Index declarations keyed by access pattern name, in order.
    pub indexes: IndexMap<String, IndexDefinition>,
    /// Service name, scopes partition keys.
    pub service: String,
    /// Table name.
    pub table: String,
    /// Schema version, scopes partition keys.
    pub version: String,
}

impl EntitySchema {
    /// Register a named custom filter.
    pub fn filter<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: Fn(&condition::FilterAttributes<'_>, &[Value]) -> condition::FilterExpression
            + Send
            + Sync
            + 'static,
    {
        self.filters
            .insert(name.into(), condition::CustomFilter::new(filter));
        self
    }
}

/// Resolved, immutable form of an entity schema.
#[derive(Clone, Debug)]
pub(crate) struct Model {
    pub(crate) attributes: IndexMap<String, attribute::Attribute>,
    pub(crate) filters: IndexMap<String, condition::CustomFilter>,
    pub(crate) registry: index::IndexRegistry,
    pub(crate) table: String,
}

fn check_filter_names(filters: &IndexMap<String, condition::CustomFilter>) -> Result<()> {
    if filters
        .keys()
        .any(|name| condition::RESERVED_FILTER_NAMES.contains(&name.as_str()))
    {
        return Err(Error::InvalidSchema(
            "Invalid filter name. Filter cannot be named \"go\", \"params\", or \"filter\""
                .to_string(),
        ));
    }
    Ok(())
}

fn resolve_indexes(
    indexes: IndexMap<String, IndexDefinition>,
    attributes: &IndexMap<String, AttributeDefinition>,
) -> Result<Vec<index::Index>> {
    let mut resolved = Vec::with_capacity(indexes.len());
    for (name, definition) in indexes {
        let index = index::Index {
            id: definition.index.unwrap_or_default(),
            name,
            pk: definition.pk,
            sk: definition.sk,
        };
        if let Some(facet) = index
            .facet_names()
            .into_iter()
            .find(|facet| !attributes.contains_key(facet))
        {
            return Err(Error::InvalidSchema(format!(
                "Facet \"{facet}\" of index \"{}\" is not a defined attribute",
                index.name
            )));
        }
        resolved.push(index);
    }
    Ok(resolved)
}

fn check_fields(
    attributes: &IndexMap<String, attribute::Attribute>,
    registry: &index::IndexRegistry,
) -> Result<()> {
    let attribute_fields = attributes
        .values()
        .map(|attribute| (attribute.field.as_str(), format!("attribute \"{}\"", attribute.name)));
    let key_fields = registry.indexes().iter().flat_map(|index| {
        iter::once(&index.pk)
            .chain(&index.sk)
            .map(move |key| (key.field.as_str(), format!("index \"{}\"", index.name)))
    });
    let mut used = collections::HashMap::new();
    for (field, owner) in attribute_fields.chain(key_fields) {
        if let Some(previous) = used.insert(field, owner.clone()) {
            if previous != owner {
                return Err(Error::InvalidSchema(format!(
                    "Duplicate field \"{field}\": used by {previous} and {owner}"
                )));
            }
            return Err(Error::InvalidSchema(format!(
                "Duplicate field \"{field}\": used twice by {owner}"
            )));
        }
    }
    Ok(())
}

impl TryFrom<EntitySchema> for Model {
    type Error = Error;

    fn try_from(schema: EntitySchema) -> Result<Self> {
        check_filter_names(&schema.filters)?;
        let indexes = resolve_indexes(schema.indexes, &schema.attributes)?;
        let registry = index::IndexRegistry::new(
            format!("${}_{}", schema.service, schema.version),
            format!("${}", schema.entity),
            indexes,
        )?;
        let primary_facets = registry.primary().facet_names();
        let attributes: IndexMap<_, _> = schema
            .attributes
            .into_iter()
            .map(|(name, definition)| {
                let attribute = attribute::Attribute {
                    default: definition.default,
                    field: definition.field.unwrap_or_else(|| name.clone()),
                    kind: definition.kind,
                    label: definition.label.unwrap_or_else(|| name.clone()),
                    name: name.clone(),
                    read_only: definition.read_only || primary_facets.contains(&name),
                    required: definition.required,
                };
                (name, attribute)
            })
            .collect();
        check_fields(&attributes, &registry)?;
        let model = Self {
            attributes,
            filters: schema.filters,
            registry,
            table: schema.table,
        };
        Ok(model)
    }
}
