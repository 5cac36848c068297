use crate::{
    common::{self, key},
    entity,
    error::Result,
};

use aws_sdk_dynamodb::Client;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Parameters of a get item request.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemParams {
    /// The table to read from.
    pub table_name: String,
    /// The primary key of the item, keyed by physical field.
    pub key: IndexMap<String, Value>,
}

/// Get item operation.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::Client;
/// use dynamodb_facet::entity::Entity;
/// use serde_json::json;
///
/// # async fn example(client: &Client, mall_stores: &Entity) -> Result<(), Box<dyn std::error::Error>> {
/// let store = mall_stores.get(&json!({"id": "123"}))?.go(client).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct GetItem<'a> {
    entity: &'a entity::Entity,
    key: IndexMap<String, Value>,
}

impl<'a> GetItem<'a> {
    pub(crate) fn new<T: Serialize>(entity: &'a entity::Entity, facets: &T) -> Result<Self> {
        let facets = entity.facet_values(facets)?;
        let key = entity.primary_key(&facets)?;
        Ok(Self { entity, key })
    }

    /// The request parameters.
    pub fn params(&self) -> GetItemParams {
        GetItemParams {
            table_name: self.entity.table().to_string(),
            key: self.key.clone(),
        }
    }

    /// Execute the get item operation, returning the item under its attribute names.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_facet.get_item", skip_all, err)
    )]
    pub async fn go(self, client: &Client) -> Result<Option<common::Facets>> {
        let params = self.params();
        let output = client
            .get_item()
            .table_name(params.table_name)
            .set_key(Some(key::to_attribute_values(params.key)?))
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;
        output
            .item
            .map(|item| self.entity.format_item(item))
            .transpose()
    }
}
