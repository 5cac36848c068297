use crate::{
    common::{condition, key},
    entity,
    error::Result,
};

use aws_sdk_dynamodb::types;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::collections;

/// Condition expression and placeholders shared by write requests.
///
/// Update requests also carry the placeholders of their update expression here.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExpressionParams {
    /// The combined condition clauses, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition_expression: Option<String>,
    /// Name placeholders and the fields they stand for.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub expression_attribute_names: IndexMap<String, String>,
    /// Value placeholders and their values.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub expression_attribute_values: IndexMap<String, Value>,
}

impl ExpressionParams {
    /// Merge the condition clauses over already collected placeholders.
    pub(crate) fn new(
        mut names: IndexMap<String, String>,
        mut values: IndexMap<String, Value>,
        clauses: &condition::ClauseState,
    ) -> Self {
        let condition_expression = clauses
            .clone()
            .into_expression_input()
            .map(|input| input.merge_into(&mut names, &mut values));
        Self {
            condition_expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
        }
    }
}

/// Compile a condition function onto the clauses of a write operation.
pub(crate) fn apply_condition<'a, F>(
    entity: &'a entity::Entity,
    clauses: condition::ClauseState,
    condition: F,
) -> Result<condition::ClauseState>
where
    F: FnOnce(&condition::FilterAttributes<'a>) -> condition::FilterExpression,
{
    let attributes = entity.filter_attributes();
    let expression = condition(&attributes);
    clauses.apply(&expression, attributes)
}

/// Write parameters converted for the SDK; empty placeholder maps are left unset.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct WriteInput {
    pub(crate) condition_expression: Option<String>,
    pub(crate) expression_attribute_names: Option<collections::HashMap<String, String>>,
    pub(crate) expression_attribute_values:
        Option<collections::HashMap<String, types::AttributeValue>>,
    pub(crate) table_name: String,
}

impl WriteInput {
    pub(crate) fn new(table_name: String, expressions: ExpressionParams) -> Result<Self> {
        let expression_attribute_names = (!expressions.expression_attribute_names.is_empty())
            .then(|| expressions.expression_attribute_names.into_iter().collect());
        let expression_attribute_values = if expressions.expression_attribute_values.is_empty() {
            None
        } else {
            Some(key::to_attribute_values(
                expressions.expression_attribute_values,
            )?)
        };
        let input = Self {
            condition_expression: expressions.condition_expression,
            expression_attribute_names,
            expression_attribute_values,
            table_name,
        };
        Ok(input)
    }
}

/// apply common write operation settings to a builder
#[macro_export]
macro_rules! apply_write_operation {
    ($builder:expr, $write_input:expr) => {
        $builder
            .set_condition_expression($write_input.condition_expression)
            .set_expression_attribute_names($write_input.expression_attribute_names)
            .set_expression_attribute_values($write_input.expression_attribute_values)
            .table_name($write_input.table_name)
    };
}
