use crate::{
    common::{self, condition, facet, key},
    entity,
    error::{Error, Result},
    write,
};

use aws_sdk_dynamodb::Client;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::iter;

/// Separator between the assignments of a SET clause.
const ASSIGNMENT_SEPARATOR: &str = ", ";

/// Parameters of an update item request.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateItemParams {
    /// The table to write to.
    pub table_name: String,
    /// The primary key of the item, keyed by physical field.
    pub key: IndexMap<String, Value>,
    /// The SET clause.
    pub update_expression: String,
    /// The condition expression and the placeholders of both expressions.
    #[serde(flatten)]
    pub expressions: write::common::ExpressionParams,
}

/// Update item operation.
///
/// Secondary index keys are rewritten along with the attributes they are composed from, as
/// long as every facet of the key is known from the primary key facets or the set values.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_facet::entity::Entity;
/// use serde_json::json;
///
/// # async fn example(client: &Client, mall_stores: &Entity) -> Result<(), Box<dyn std::error::Error>> {
/// mall_stores
///     .update(&json!({"id": "123"}))?
///     .set(&json!({"rent": "20.00", "category": "food/meal"}))?
///     .go(client)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct UpdateItem<'a> {
    clauses: condition::ClauseState,
    entity: &'a entity::Entity,
    facets: common::Facets,
    key: IndexMap<String, Value>,
    set: common::Facets,
}

impl<'a> UpdateItem<'a> {
    pub(crate) fn new<T: Serialize>(entity: &'a entity::Entity, facets: &T) -> Result<Self> {
        let facets = entity.facet_values(facets)?;
        let key = entity.primary_key(&facets)?;
        let facets =
            facet::expect_facets(&facets, &entity.registry().primary().facet_names(), None)?;
        let update_item = Self {
            clauses: condition::ClauseState::default(),
            entity,
            facets,
            key,
            set: common::Facets::new(),
        };
        Ok(update_item)
    }

    /// Assign new values to attributes; later calls override earlier ones.
    ///
    /// Names that are not attributes of the entity are ignored.
    pub fn set<T: Serialize>(mut self, values: &T) -> Result<Self> {
        for (name, value) in self.entity.facet_values(values)? {
            let Some(attribute) = self.entity.attributes().get(&name) else {
                continue;
            };
            if attribute.read_only {
                return Err(Error::InvalidChain(format!(
                    "Attribute {name} is Read-Only and cannot be updated"
                )));
            }
            if let Some(value) = attribute.val(Some(&value))? {
                self.set.insert(name, value);
            }
        }
        Ok(self)
    }

    /// Only update when the condition holds for the stored item.
    pub fn condition<F>(mut self, condition: F) -> Result<Self>
    where
        F: FnOnce(&condition::FilterAttributes<'a>) -> condition::FilterExpression,
    {
        self.clauses = write::common::apply_condition(self.entity, self.clauses, condition)?;
        Ok(self)
    }

    /// The secondary key fields touched by the set values, with their new composite keys.
    fn index_keys(&self) -> Result<Vec<(&'a str, String)>> {
        let registry = self.entity.registry();
        let mut known = self.facets.clone();
        known.extend(self.set.clone());
        let mut index_keys = Vec::new();
        for index in registry.indexes().iter().filter(|index| !index.is_primary()) {
            let keys = registry.compose(&index.id, &known, &[&known])?;
            let parts = iter::once((&index.pk, keys.pk))
                .chain(index.sk.as_ref().zip(keys.sk.into_iter().next()));
            for (definition, value) in parts {
                if !definition
                    .facets
                    .iter()
                    .any(|facet| self.set.contains_key(facet))
                {
                    continue;
                }
                if !definition
                    .facets
                    .iter()
                    .all(|facet| common::is_present(&known, facet))
                {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        index = %index.name,
                        field = %definition.field,
                        "skipped key with unknown facets"
                    );
                    continue;
                }
                index_keys.push((definition.field.as_str(), value));
            }
        }
        Ok(index_keys)
    }

    /// The request parameters.
    pub fn params(&self) -> Result<UpdateItemParams> {
        if self.set.is_empty() {
            return Err(Error::InvalidChain(
                "Nothing to update: set at least one attribute".to_string(),
            ));
        }
        let (taken_names, taken_values) = (self.clauses.names(), self.clauses.values());
        let mut assignments = Vec::new();
        let mut names = IndexMap::new();
        let mut values = IndexMap::new();
        let mut assign = |identifier: &str, field: &str, value: Value| {
            let name = common::bind_name(
                &mut names,
                taken_names,
                &common::name_placeholder(identifier),
                field,
            );
            let placeholder = common::bind_value(
                &mut values,
                taken_values,
                &common::value_placeholder(identifier),
                value,
            );
            assignments.push(format!("{name} = {placeholder}"));
        };
        for attribute in self.entity.attributes().values() {
            if let Some(value) = self.set.get(&attribute.name) {
                assign(&attribute.name, &attribute.field, value.clone());
            }
        }
        for (field, value) in self.index_keys()? {
            assign(field, field, Value::String(value));
        }
        let params = UpdateItemParams {
            table_name: self.entity.table().to_string(),
            key: self.key.clone(),
            update_expression: format!("SET {}", assignments.join(ASSIGNMENT_SEPARATOR)),
            expressions: write::common::ExpressionParams::new(names, values, &self.clauses),
        };
        Ok(params)
    }

    /// Execute the update item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_facet.update_item", skip_all, err)
    )]
    pub async fn go(self, client: &Client) -> Result<()> {
        let params = self.params()?;
        let key = key::to_attribute_values(params.key)?;
        let write_input = write::common::WriteInput::new(params.table_name, params.expressions)?;
        let builder = client
            .update_item()
            .set_key(Some(key))
            .update_expression(params.update_expression);
        crate::apply_write_operation!(builder, write_input)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;
        Ok(())
    }
}
