use crate::{
    common::{self, condition, facet, key},
    entity,
    error::Result,
    write,
};

use aws_sdk_dynamodb::Client;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Parameters of a put item request.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutItemParams {
    /// The table to write to.
    pub table_name: String,
    /// The stored item: attributes under their fields, then the key fields of every index.
    pub item: IndexMap<String, Value>,
    /// The condition expression and its placeholders.
    #[serde(flatten)]
    pub expressions: write::common::ExpressionParams,
}

/// Put item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_facet::entity::Entity;
/// use serde_json::json;
///
/// # async fn example(client: &Client, mall_stores: &Entity) -> Result<(), Box<dyn std::error::Error>> {
/// let store = mall_stores
///     .put(&json!({
///         "id": "123",
///         "mall": "EastPointe",
///         "store": "LatteLarrys",
///         "building": "BuildingA",
///         "unit": "B54",
///         "category": "food/coffee",
///         "leaseEnd": "2020-01-20",
///     }))?
///     .condition(|attributes| attributes.attribute("id").not_exists())?
///     .go(client)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PutItem<'a> {
    attributes: common::Facets,
    clauses: condition::ClauseState,
    entity: &'a entity::Entity,
    item: IndexMap<String, Value>,
}

impl<'a> PutItem<'a> {
    pub(crate) fn new<T: Serialize>(entity: &'a entity::Entity, item: &T) -> Result<Self> {
        let supplied = entity.facet_values(item)?;
        let mut attributes = common::Facets::new();
        for attribute in entity.attributes().values() {
            if let Some(value) = attribute.val(supplied.get(&attribute.name))? {
                attributes.insert(attribute.name.clone(), value);
            }
        }
        let mut required: Vec<String> = Vec::new();
        for facet in entity.registry().facets() {
            if !required.contains(&facet.name) {
                required.push(facet.name);
            }
        }
        facet::expect_facets(&attributes, &required, None)?;
        let mut stored: IndexMap<_, _> = entity
            .attributes()
            .values()
            .filter_map(|attribute| {
                attributes
                    .get(&attribute.name)
                    .map(|value| (attribute.field.clone(), value.clone()))
            })
            .collect();
        for index in entity.registry().indexes() {
            let keys = entity
                .registry()
                .compose(&index.id, &attributes, &[&attributes])?;
            stored.insert(index.pk.field.clone(), Value::String(keys.pk));
            if let (Some(sk), Some(value)) = (&index.sk, keys.sk.into_iter().next()) {
                stored.insert(sk.field.clone(), Value::String(value));
            }
        }
        let put_item = Self {
            attributes,
            clauses: condition::ClauseState::default(),
            entity,
            item: stored,
        };
        Ok(put_item)
    }

    /// Only write when the condition holds for the stored item.
    pub fn condition<F>(mut self, condition: F) -> Result<Self>
    where
        F: FnOnce(&condition::FilterAttributes<'a>) -> condition::FilterExpression,
    {
        self.clauses = write::common::apply_condition(self.entity, self.clauses, condition)?;
        Ok(self)
    }

    /// The request parameters.
    pub fn params(&self) -> PutItemParams {
        PutItemParams {
            table_name: self.entity.table().to_string(),
            item: self.item.clone(),
            expressions: write::common::ExpressionParams::new(
                IndexMap::new(),
                IndexMap::new(),
                &self.clauses,
            ),
        }
    }

    /// Execute the put item operation, returning the written attributes.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_facet.put_item", skip_all, err)
    )]
    pub async fn go(self, client: &Client) -> Result<common::Facets> {
        let params = self.params();
        let item = key::to_attribute_values(params.item)?;
        let write_input = write::common::WriteInput::new(params.table_name, params.expressions)?;
        let builder = client.put_item().set_item(Some(item));
        crate::apply_write_operation!(builder, write_input)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;
        Ok(self.attributes)
    }
}
