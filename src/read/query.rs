use crate::{
    common::{self, condition, facet, key},
    entity,
    error::{Error, Result},
    index,
};

use aws_sdk_dynamodb::Client;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::{mem, ops};

/// Phase of a query chain.
///
/// A chain starts `Seeded` with its partition key bound, becomes `Ranged` once a sort key
/// condition is applied and `Filtered` after its first filter. Materializing the chain does
/// not change it.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChainState {
    /// The partition key is bound.
    Seeded,
    /// A sort key condition is applied.
    Ranged,
    /// At least one filter is applied.
    Filtered,
}

/// Sort key comparison.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Comparison {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ops::Deref for Comparison {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum SortKeyCondition {
    BeginsWith(String),
    Between(String, String),
    Compare(Comparison, String),
}

/// Parameters of a query request.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryParams {
    /// The table to query.
    pub table_name: String,
    /// The secondary index to query, absent for the primary index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,
    /// The key condition.
    pub key_condition_expression: String,
    /// The combined filter clauses, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    /// Name placeholders of the key condition and the filters.
    pub expression_attribute_names: IndexMap<String, String>,
    /// Value placeholders of the key condition and the filters.
    pub expression_attribute_values: IndexMap<String, Value>,
}

/// Query chain over one index.
///
/// Without a sort key condition the chain matches `begins_with` the sort key composed from
/// its facets. That prefix ends right after the last supplied facet value, with no trailing
/// delimiter, so `building: "BuildingA"` also matches items in `BuildingA2`. Supply the next
/// facet, or use a range condition, when values of a facet can prefix one another.
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
///     "attributes": {"id": {}, "mall": {}, "building": {}, "unit": {}, "store": {}, "rent": {}},
///     "indexes": {
///         "store": {"pk": {"field": "pk", "facets": ["id"]}},
///         "units": {
///             "index": "gsi1pk-gsi1sk-index",
///             "pk": {"field": "gsi1pk", "facets": ["mall"]},
///             "sk": {"field": "gsi1sk", "facets": ["building", "unit", "store"]}
///         }
///     }
/// }))
/// .unwrap();
/// let mall_stores = entity::Entity::new(schema).unwrap();
/// let params = mall_stores
///     .query("units", &json!({"mall": "EastPointe", "building": "BuildingA"}))
///     .unwrap()
///     .between(&json!({"unit": "A1"}), &json!({"unit": "F6"}))
///     .unwrap()
///     .filter(|attributes| attributes.attribute("rent").lte("50.00"))
///     .unwrap()
///     .params()
///     .unwrap();
/// assert_eq!(
///     params.key_condition_expression,
///     "#pk = :pk and #sk1 BETWEEN :sk1 AND :sk2"
/// );
/// assert_eq!(params.filter_expression.as_deref(), Some("#rent <= :rent1"));
/// ```
#[derive(Clone, Debug)]
pub struct QueryChain<'a> {
    clauses: condition::ClauseState,
    entity: &'a entity::Entity,
    facets: common::Facets,
    index: &'a index::Index,
    pk: String,
    sort_key: Option<SortKeyCondition>,
    state: ChainState,
}

impl<'a> QueryChain<'a> {
    pub(crate) fn new(
        entity: &'a entity::Entity,
        index: &'a index::Index,
        facets: common::Facets,
    ) -> Result<Self> {
        facet::expect_facets(&facets, &index.pk.facets, Some("partition keys"))?;
        let keys = entity.registry().compose(&index.id, &facets, &[])?;
        let chain = Self {
            clauses: condition::ClauseState::default(),
            entity,
            facets,
            index,
            pk: keys.pk,
            sort_key: None,
            state: ChainState::Seeded,
        };
        Ok(chain)
    }

    /// The current phase of the chain.
    pub fn state(&self) -> ChainState {
        self.state
    }

    /// The index the chain queries.
    pub fn index(&self) -> &'a index::Index {
        self.index
    }

    fn check_range(&self) -> Result<()> {
        match self.state {
            ChainState::Seeded if self.index.sk.is_none() => Err(Error::InvalidChain(format!(
                "Index \"{}\" has no sort key",
                self.index.name
            ))),
            ChainState::Seeded => Ok(()),
            ChainState::Ranged => Err(Error::InvalidChain(
                "Only one sort key condition may be applied: between, gt, gte, lt, lte or begins_with"
                    .to_string(),
            )),
            ChainState::Filtered => Err(Error::InvalidChain(
                "Sort key conditions must be applied before filters".to_string(),
            )),
        }
    }

    /// Compose the sort key of a partial merged over the chain facets.
    fn compose_sk<T: Serialize>(&self, partial: &T) -> Result<String> {
        let mut facets = self.facets.clone();
        facets.extend(self.entity.facet_values(partial)?);
        let keys = self
            .entity
            .registry()
            .compose(&self.index.id, &facets, &[&facets])?;
        if keys.pk != self.pk {
            return Err(Error::InvalidChain(format!(
                "Sort key conditions cannot change the partition key of index \"{}\"",
                self.index.name
            )));
        }
        Ok(keys.sk.into_iter().next().unwrap_or_default())
    }

    fn range(mut self, condition: SortKeyCondition) -> Self {
        self.sort_key = Some(condition);
        self.state = ChainState::Ranged;
        self
    }

    fn compare<T: Serialize>(self, comparison: Comparison, partial: &T) -> Result<Self> {
        self.check_range()?;
        let sk = self.compose_sk(partial)?;
        Ok(self.range(SortKeyCondition::Compare(comparison, sk)))
    }

    /// Keep items whose sort key lies between the keys of two partials, inclusive.
    pub fn between<S: Serialize, E: Serialize>(self, start: &S, end: &E) -> Result<Self> {
        self.check_range()?;
        let start = self.compose_sk(start)?;
        let end = self.compose_sk(end)?;
        Ok(self.range(SortKeyCondition::Between(start, end)))
    }

    /// Keep items whose sort key starts with the key of a partial.
    pub fn begins_with<T: Serialize>(self, partial: &T) -> Result<Self> {
        self.check_range()?;
        let sk = self.compose_sk(partial)?;
        Ok(self.range(SortKeyCondition::BeginsWith(sk)))
    }

    /// Keep items whose sort key sorts after the key of a partial.
    pub fn gt<T: Serialize>(self, partial: &T) -> Result<Self> {
        self.compare(Comparison::Gt, partial)
    }

    /// Keep items whose sort key sorts after or equal to the key of a partial.
    pub fn gte<T: Serialize>(self, partial: &T) -> Result<Self> {
        self.compare(Comparison::Gte, partial)
    }

    /// Keep items whose sort key sorts before the key of a partial.
    pub fn lt<T: Serialize>(self, partial: &T) -> Result<Self> {
        self.compare(Comparison::Lt, partial)
    }

    /// Keep items whose sort key sorts before or equal to the key of a partial.
    pub fn lte<T: Serialize>(self, partial: &T) -> Result<Self> {
        self.compare(Comparison::Lte, partial)
    }

    /// Append a filter clause built from the entity attributes.
    pub fn filter<F>(mut self, filter: F) -> Result<Self>
    where
        F: FnOnce(&condition::FilterAttributes<'a>) -> condition::FilterExpression,
    {
        let attributes = self.entity.filter_attributes();
        let expression = filter(&attributes);
        self.clauses = mem::take(&mut self.clauses).apply(&expression, attributes)?;
        self.state = ChainState::Filtered;
        Ok(self)
    }

    /// Append the clause of a filter registered with the schema.
    pub fn named_filter(mut self, name: &str, args: &[Value]) -> Result<Self> {
        let entity = self.entity;
        let filter = entity
            .custom_filter(name)
            .ok_or_else(|| Error::InvalidChain(format!("Unknown filter \"{name}\"")))?;
        self.clauses = filter.clause(
            mem::take(&mut self.clauses),
            entity.filter_attributes(),
            args,
        )?;
        self.state = ChainState::Filtered;
        Ok(self)
    }

    fn sort_key_condition(&self) -> Result<SortKeyCondition> {
        if let Some(condition) = &self.sort_key {
            return Ok(condition.clone());
        }
        let keys = self
            .entity
            .registry()
            .compose(&self.index.id, &self.facets, &[&self.facets])?;
        Ok(SortKeyCondition::BeginsWith(
            keys.sk.into_iter().next().unwrap_or_default(),
        ))
    }

    /// The request parameters; calling it does not consume or change the chain.
    ///
    /// Key condition placeholders step aside for the filter placeholders they would clash with.
    pub fn params(&self) -> Result<QueryParams> {
        let (taken_names, taken_values) = (self.clauses.names(), self.clauses.values());
        let mut names = IndexMap::new();
        let mut values = IndexMap::new();
        let pk_name = common::bind_name(
            &mut names,
            taken_names,
            &common::name_placeholder("pk"),
            &self.index.pk.field,
        );
        let pk_value = common::bind_value(
            &mut values,
            taken_values,
            &common::value_placeholder("pk"),
            Value::String(self.pk.clone()),
        );
        let mut key_condition_expression = format!("{pk_name} = {pk_value}");
        if let Some(sk) = &self.index.sk {
            let sk_name = common::bind_name(
                &mut names,
                taken_names,
                &common::name_placeholder("sk1"),
                &sk.field,
            );
            let mut bind_sk_value = |identifier: &str, value: String| {
                common::bind_value(
                    &mut values,
                    taken_values,
                    &common::value_placeholder(identifier),
                    Value::String(value),
                )
            };
            let condition = match self.sort_key_condition()? {
                SortKeyCondition::BeginsWith(prefix) => {
                    let prefix = bind_sk_value("sk1", prefix);
                    format!(" and begins_with({sk_name}, {prefix})")
                }
                SortKeyCondition::Compare(comparison, sk) => {
                    let sk = bind_sk_value("sk1", sk);
                    format!(" and {sk_name} {} {sk}", &*comparison)
                }
                SortKeyCondition::Between(start, end) => {
                    let start = bind_sk_value("sk1", start);
                    let end = bind_sk_value("sk2", end);
                    common::bind_name(
                        &mut names,
                        taken_names,
                        &common::name_placeholder("sk2"),
                        &sk.field,
                    );
                    format!(" and {sk_name} BETWEEN {start} AND {end}")
                }
            };
            key_condition_expression.push_str(&condition);
        }
        let filter_expression = self
            .clauses
            .clone()
            .into_expression_input()
            .map(|input| input.merge_into(&mut names, &mut values));
        let params = QueryParams {
            table_name: self.entity.table().to_string(),
            index_name: (!self.index.is_primary()).then(|| self.index.id.clone()),
            key_condition_expression,
            filter_expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
        };
        Ok(params)
    }

    /// Execute the query, returning one page of items under their attribute names.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_facet.query", skip_all, err)
    )]
    pub async fn go(self, client: &Client) -> Result<Vec<common::Facets>> {
        let params = self.params()?;
        let output = client
            .query()
            .table_name(params.table_name)
            .set_index_name(params.index_name)
            .key_condition_expression(params.key_condition_expression)
            .set_filter_expression(params.filter_expression)
            .set_expression_attribute_names(Some(
                params.expression_attribute_names.into_iter().collect(),
            ))
            .set_expression_attribute_values(Some(key::to_attribute_values(
                params.expression_attribute_values,
            )?))
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;
        output
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|item| self.entity.format_item(item))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entity::Entity, fixtures::mall_stores};

    use rstest::rstest;
    use serde_json::json;

    const MALL_PK: &str = "$MallStoreDirectory_1#mall_EastPointe";

    fn units_params(key_condition_expression: &str, values: &[(&str, &str)]) -> QueryParams {
        let mut names = IndexMap::from([
            ("#pk".to_string(), "gsi1pk".to_string()),
            ("#sk1".to_string(), "gsi1sk".to_string()),
        ]);
        if values.len() > 1 {
            names.insert("#sk2".to_string(), "gsi1sk".to_string());
        }
        let mut expression_attribute_values = IndexMap::from([(":pk".to_string(), json!(MALL_PK))]);
        for (placeholder, value) in values {
            expression_attribute_values.insert(placeholder.to_string(), json!(value));
        }
        QueryParams {
            table_name: "StoreDirectory".to_string(),
            index_name: Some("gsi1pk-gsi1sk-index".to_string()),
            key_condition_expression: key_condition_expression.to_string(),
            filter_expression: None,
            expression_attribute_names: names,
            expression_attribute_values,
        }
    }

    #[rstest]
    #[case::pk_only(
        json!({"mall": "EastPointe"}),
        "$MallStores"
    )]
    #[case::one_sk_facet(
        json!({"mall": "EastPointe", "building": "BuildingA"}),
        "$MallStores#building_BuildingA"
    )]
    #[case::stops_at_gap(
        json!({"mall": "EastPointe", "building": "BuildingA", "store": "LatteLarrys"}),
        "$MallStores#building_BuildingA"
    )]
    #[case::two_sk_facets(
        json!({"mall": "EastPointe", "building": "BuildingA", "unit": "B54"}),
        "$MallStores#building_BuildingA#unit_B54"
    )]
    fn test_begins_with_by_default(
        mall_stores: Entity,
        #[case] facets: Value,
        #[case] expected_sk: &str,
    ) {
        let chain = mall_stores.query("units", &facets).unwrap();
        assert_eq!(chain.state(), ChainState::Seeded);
        assert_eq!(
            chain.params().unwrap(),
            units_params(
                "#pk = :pk and begins_with(#sk1, :sk1)",
                &[(":sk1", expected_sk)]
            )
        );
    }

    #[rstest]
    fn test_between_end_to_end(mall_stores: Entity) {
        let chain = mall_stores
            .query("units", &json!({"mall": "EastPointe", "building": "BuildingA"}))
            .unwrap()
            .between(&json!({"unit": "A1"}), &json!({"unit": "F6"}))
            .unwrap();
        assert_eq!(chain.state(), ChainState::Ranged);
        let params = chain.params().unwrap();
        assert_eq!(
            params,
            units_params(
                "#pk = :pk and #sk1 BETWEEN :sk1 AND :sk2",
                &[
                    (":sk1", "$MallStores#building_BuildingA#unit_A1"),
                    (":sk2", "$MallStores#building_BuildingA#unit_F6"),
                ]
            )
        );
        assert_eq!(
            serde_json::to_string(&params).unwrap(),
            concat!(
                r#"{"TableName":"StoreDirectory","IndexName":"gsi1pk-gsi1sk-index","#,
                r##""KeyConditionExpression":"#pk = :pk and #sk1 BETWEEN :sk1 AND :sk2","##,
                r##""ExpressionAttributeNames":{"#pk":"gsi1pk","#sk1":"gsi1sk","#sk2":"gsi1sk"},"##,
                r#""ExpressionAttributeValues":{":pk":"$MallStoreDirectory_1#mall_EastPointe","#,
                r#"":sk1":"$MallStores#building_BuildingA#unit_A1","#,
                r#"":sk2":"$MallStores#building_BuildingA#unit_F6"}}"#,
            )
        );
    }

    #[rstest]
    #[case::over_buildings(
        json!({"mall": "EastPointe"}),
        json!({"building": "BuildingA", "unit": "B54"}),
        json!({"building": "BuildingF", "unit": "B54"}),
        "$MallStores#building_BuildingA#unit_B54",
        "$MallStores#building_BuildingF#unit_B54"
    )]
    #[case::stops_at_gap(
        json!({"mall": "EastPointe", "building": "BuildingA"}),
        json!({"store": "LatteLarrys"}),
        json!({"store": "LatteLarrys"}),
        "$MallStores#building_BuildingA",
        "$MallStores#building_BuildingA"
    )]
    fn test_between(
        mall_stores: Entity,
        #[case] facets: Value,
        #[case] start: Value,
        #[case] end: Value,
        #[case] expected_start: &str,
        #[case] expected_end: &str,
    ) {
        let params = mall_stores
            .query("units", &facets)
            .unwrap()
            .between(&start, &end)
            .unwrap()
            .params()
            .unwrap();
        assert_eq!(
            params,
            units_params(
                "#pk = :pk and #sk1 BETWEEN :sk1 AND :sk2",
                &[(":sk1", expected_start), (":sk2", expected_end)]
            )
        );
    }

    #[rstest]
    #[case::gt("gt", "#pk = :pk and #sk1 > :sk1")]
    #[case::gte("gte", "#pk = :pk and #sk1 >= :sk1")]
    #[case::lt("lt", "#pk = :pk and #sk1 < :sk1")]
    #[case::lte("lte", "#pk = :pk and #sk1 <= :sk1")]
    #[case::begins_with("begins_with", "#pk = :pk and begins_with(#sk1, :sk1)")]
    fn test_sort_key_operators(
        mall_stores: Entity,
        #[case] operator: &str,
        #[case] expected: &str,
    ) {
        let chain = mall_stores
            .query("units", &json!({"mall": "EastPointe"}))
            .unwrap();
        let partial = json!({"building": "BuildingA"});
        let chain = match operator {
            "gt" => chain.gt(&partial),
            "gte" => chain.gte(&partial),
            "lt" => chain.lt(&partial),
            "lte" => chain.lte(&partial),
            _ => chain.begins_with(&partial),
        }
        .unwrap();
        assert_eq!(
            chain.params().unwrap(),
            units_params(expected, &[(":sk1", "$MallStores#building_BuildingA")])
        );
    }

    #[rstest]
    fn test_params_is_idempotent(mall_stores: Entity) {
        let chain = mall_stores
            .query("units", &json!({"mall": "EastPointe"}))
            .unwrap()
            .gte(&json!({"building": "BuildingA"}))
            .unwrap()
            .filter(|attributes| attributes.attribute("rent").gte("20.00"))
            .unwrap();
        assert_eq!(chain.params().unwrap(), chain.params().unwrap());
    }

    #[rstest]
    fn test_filters_share_placeholder_counters(mall_stores: Entity) {
        let chain = mall_stores
            .query("units", &json!({"mall": "EastPointe"}))
            .unwrap()
            .filter(|attributes| attributes.attribute("rent").gte("20.00"))
            .unwrap()
            .filter(|attributes| {
                let mall = attributes.attribute("mall");
                attributes.attribute("rent").lte("50.00").and(mall.eq("EastPointe"))
            })
            .unwrap();
        assert_eq!(chain.state(), ChainState::Filtered);
        let params = chain.params().unwrap();
        assert_eq!(
            params.filter_expression.as_deref(),
            Some("(#rent >= :rent1) AND (#rent <= :rent2 AND #mall = :mall1)")
        );
        assert_eq!(
            params.expression_attribute_names,
            IndexMap::from([
                ("#pk".to_string(), "gsi1pk".to_string()),
                ("#sk1".to_string(), "gsi1sk".to_string()),
                ("#rent".to_string(), "rent".to_string()),
                ("#mall".to_string(), "mallId".to_string()),
            ])
        );
        assert_eq!(
            params.expression_attribute_values,
            IndexMap::from([
                (":pk".to_string(), json!(MALL_PK)),
                (":sk1".to_string(), json!("$MallStores")),
                (":rent1".to_string(), json!("20.00")),
                (":rent2".to_string(), json!("50.00")),
                (":mall1".to_string(), json!("EastPointe")),
            ])
        );
    }

    fn labelled_records() -> Entity {
        let schema = serde_json::from_value(json!({
            "service": "s",
            "entity": "e",
            "table": "t",
            "version": "1",
            "attributes": {
                "mall": {},
                "store": {},
                "pk": {"field": "pkLabel"},
                "sk": {"field": "sortLabel"},
            },
            "indexes": {
                "records": {
                    "pk": {"field": "pk", "facets": ["mall"]},
                    "sk": {"field": "sk", "facets": ["store"]}
                },
            },
        }))
        .unwrap();
        Entity::new(schema).unwrap()
    }

    #[rstest]
    #[case::begins_with(
        None,
        "#pk1 = :pk and begins_with(#sk1, :sk11)",
        &[(":sk11", "$e")]
    )]
    #[case::between(
        Some((json!({"store": "A"}), json!({"store": "F"}))),
        "#pk1 = :pk and #sk1 BETWEEN :sk11 AND :sk2",
        &[(":sk11", "$e#store_A"), (":sk2", "$e#store_F")]
    )]
    fn test_filter_placeholders_survive_key_condition(
        #[case] range: Option<(Value, Value)>,
        #[case] key_condition_expression: &str,
        #[case] sort_key_values: &[(&str, &str)],
    ) {
        let records = labelled_records();
        let mut chain = records.query("records", &json!({"mall": "M"})).unwrap();
        if let Some((start, end)) = &range {
            chain = chain.between(start, end).unwrap();
        }
        let params = chain
            .filter(|attributes| {
                let pk = attributes.attribute("pk");
                attributes.attribute("sk").eq("label-x").and(pk.exists())
            })
            .unwrap()
            .params()
            .unwrap();
        assert_eq!(params.key_condition_expression, key_condition_expression);
        assert_eq!(
            params.filter_expression.as_deref(),
            Some("#sk = :sk1 AND attribute_exists(#pk)")
        );
        let mut names = IndexMap::from([
            ("#pk1".to_string(), "pk".to_string()),
            ("#sk1".to_string(), "sk".to_string()),
            ("#sk".to_string(), "sortLabel".to_string()),
            ("#pk".to_string(), "pkLabel".to_string()),
        ]);
        if range.is_some() {
            names.insert("#sk2".to_string(), "sk".to_string());
        }
        assert_eq!(params.expression_attribute_names, names);
        let mut values = IndexMap::from([
            (":pk".to_string(), json!("$s_1#mall_M")),
            (":sk1".to_string(), json!("label-x")),
        ]);
        for (placeholder, value) in sort_key_values {
            values.insert(placeholder.to_string(), json!(value));
        }
        assert_eq!(params.expression_attribute_values, values);
    }

    #[rstest]
    fn test_named_filter(mall_stores: Entity) {
        let params = mall_stores
            .query("leases", &json!({"mall": "EastPointe"}))
            .unwrap()
            .named_filter("maxRent", &[json!("50.00")])
            .unwrap()
            .params()
            .unwrap();
        assert_eq!(params.index_name.as_deref(), Some("gsi2pk-gsi2sk-index"));
        assert_eq!(params.filter_expression.as_deref(), Some("#rent <= :rent1"));
        assert_eq!(params.expression_attribute_values[":rent1"], json!("50.00"));
    }

    #[rstest]
    fn test_primary_index_without_sort_key(mall_stores: Entity) {
        let params = mall_stores
            .query("store", &json!({"id": "123"}))
            .unwrap()
            .params()
            .unwrap();
        assert_eq!(
            params,
            QueryParams {
                table_name: "StoreDirectory".to_string(),
                index_name: None,
                key_condition_expression: "#pk = :pk".to_string(),
                filter_expression: None,
                expression_attribute_names: IndexMap::from([(
                    "#pk".to_string(),
                    "pk".to_string()
                )]),
                expression_attribute_values: IndexMap::from([(
                    ":pk".to_string(),
                    json!("$MallStoreDirectory_1#id_123")
                )]),
            }
        );
    }

    #[rstest]
    #[case::second_range_operator(
        "second_range",
        "Only one sort key condition may be applied: between, gt, gte, lt, lte or begins_with"
    )]
    #[case::range_after_filter(
        "range_after_filter",
        "Sort key conditions must be applied before filters"
    )]
    #[case::between_changes_partition_key(
        "between_other_mall",
        "Sort key conditions cannot change the partition key of index \"units\""
    )]
    #[case::unknown_named_filter(
        "unknown_filter",
        "Unknown filter \"minRent\""
    )]
    fn test_invalid_chain(mall_stores: Entity, #[case] scenario: &str, #[case] expected: &str) {
        let chain = mall_stores
            .query("units", &json!({"mall": "EastPointe"}))
            .unwrap();
        let building = json!({"building": "BuildingA"});
        let result = match scenario {
            "second_range" => chain.gt(&building).and_then(|chain| chain.lt(&building)),
            "range_after_filter" => chain
                .filter(|attributes| attributes.attribute("rent").exists())
                .and_then(|chain| chain.gte(&building)),
            "between_other_mall" => {
                chain.between(&building, &json!({"mall": "WestPointe", "building": "BuildingF"}))
            }
            _ => chain.named_filter("minRent", &[]),
        };
        let error = result.unwrap_err();
        assert!(matches!(error, Error::InvalidChain(_)));
        assert_eq!(error.to_string(), expected);
    }

    #[rstest]
    fn test_range_on_index_without_sort_key(mall_stores: Entity) {
        let error = mall_stores
            .query("store", &json!({"id": "123"}))
            .unwrap()
            .gt(&json!({"id": "100"}))
            .unwrap_err();
        assert!(matches!(error, Error::InvalidChain(_)));
        assert_eq!(error.to_string(), "Index \"store\" has no sort key");
    }

    #[rstest]
    #[case::missing(json!({"building": "BuildingA"}))]
    #[case::null(json!({"mall": null}))]
    fn test_missing_partition_key(mall_stores: Entity, #[case] facets: Value) {
        let error = mall_stores.query("units", &facets).unwrap_err();
        assert!(matches!(error, Error::IncompleteFacets { .. }));
        assert_eq!(
            error.to_string(),
            "Incomplete or invalid partition keys supplied. Missing properties: mall"
        );
    }

    #[rstest]
    fn test_invalid_filter_attribute(mall_stores: Entity) {
        let error = mall_stores
            .query("units", &json!({"mall": "EastPointe"}))
            .unwrap()
            .filter(|attributes| attributes.attribute("color").eq("red"))
            .unwrap_err();
        assert!(matches!(error, Error::InvalidAttribute { .. }));
    }
}
