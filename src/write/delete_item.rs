use crate::{
    common::condition,
    entity,
    error::Result,
    write,
};

use aws_sdk_dynamodb::Client;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Parameters of a delete item request.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteItemParams {
    /// The table to delete from.
    pub table_name: String,
    /// The primary key of the item, keyed by physical field.
    pub key: IndexMap<String, Value>,
    /// The condition expression and its placeholders.
    #[serde(flatten)]
    pub expressions: write::common::ExpressionParams,
}

/// Delete item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_facet::entity::Entity;
/// use serde_json::json;
///
/// # async fn example(client: &Client, mall_stores: &Entity) -> Result<(), Box<dyn std::error::Error>> {
/// mall_stores
///     .delete(&json!({"id": "123"}))?
///     .condition(|attributes| attributes.attribute("mall").eq("EastPointe"))?
///     .go(client)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct DeleteItem<'a> {
    clauses: condition::ClauseState,
    entity: &'a entity::Entity,
    key: IndexMap<String, Value>,
}

impl<'a> DeleteItem<'a> {
    pub(crate) fn new<T: Serialize>(entity: &'a entity::Entity, facets: &T) -> Result<Self> {
        let facets = entity.facet_values(facets)?;
        let key = entity.primary_key(&facets)?;
        let delete_item = Self {
            clauses: condition::ClauseState::default(),
            entity,
            key,
        };
        Ok(delete_item)
    }

    /// Only delete when the condition holds for the stored item.
    pub fn condition<F>(mut self, condition: F) -> Result<Self>
    where
        F: FnOnce(&condition::FilterAttributes<'a>) -> condition::FilterExpression,
    {
        self.clauses = write::common::apply_condition(self.entity, self.clauses, condition)?;
        Ok(self)
    }

    /// The request parameters.
    pub fn params(&self) -> DeleteItemParams {
        DeleteItemParams {
            table_name: self.entity.table().to_string(),
            key: self.key.clone(),
            expressions: write::common::ExpressionParams::new(
                IndexMap::new(),
                IndexMap::new(),
                &self.clauses,
            ),
        }
    }

    /// Execute the delete item operation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_facet.delete_item", skip_all, err)
    )]
    pub async fn go(self, client: &Client) -> Result<()> {
        let params = self.params();
        let key = crate::common::key::to_attribute_values(params.key)?;
        let write_input = write::common::WriteInput::new(params.table_name, params.expressions)?;
        let builder = client.delete_item().set_key(Some(key));
        crate::apply_write_operation!(builder, write_input)
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;
        Ok(())
    }
}
