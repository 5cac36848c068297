//! Common utilities for entity operations.
//!
//! This module provides the pieces shared by read and write operations:
//! composite key encoding, facet expectations and the filter/condition expression compiler.

/// Filter and condition expression building.
pub mod condition;

/// Required facet validation.
pub mod facet;

/// Composite key encoding.
pub mod key;

use crate::error::{Error, Result};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Attribute values keyed by attribute name.
pub type Facets = serde_json::Map<String, Value>;

/// Serialize caller supplied values into a facet map.
pub(crate) fn to_facets<T: Serialize>(values: &T) -> Result<Facets> {
    match serde_json::to_value(values)? {
        Value::Object(facets) => Ok(facets),
        Value::Null => Ok(Facets::new()),
        other => Err(Error::InvalidChain(format!(
            "Expected an object of attribute values, received {other}"
        ))),
    }
}

/// Whether a facet carries a usable value.
pub(crate) fn is_present(facets: &Facets, name: &str) -> bool {
    facets.get(name).is_some_and(|value| !value.is_null())
}

pub(crate) fn name_placeholder(identifier: &str) -> String {
    format!("#{identifier}")
}

pub(crate) fn value_placeholder(identifier: &str) -> String {
    format!(":{identifier}")
}

/// The first of `base`, `base1`, `base2`, ... that `available` accepts.
fn free_placeholder(base: &str, available: impl Fn(&str) -> bool) -> String {
    if available(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|placeholder| available(placeholder))
        .unwrap_or_else(|| base.to_string())
}

/// Bind a name placeholder to `field`, stepping past placeholders that stand for other fields
/// in `names` or in the clause names of `taken`.
pub(crate) fn bind_name(
    names: &mut IndexMap<String, String>,
    taken: &IndexMap<String, String>,
    base: &str,
    field: &str,
) -> String {
    let placeholder = free_placeholder(base, |placeholder| {
        [&*names, taken]
            .iter()
            .all(|bound| bound.get(placeholder).is_none_or(|other| other == field))
    });
    names.insert(placeholder.clone(), field.to_string());
    placeholder
}

/// Bind a value placeholder that is neither in `values` nor in the clause values of `taken`.
pub(crate) fn bind_value(
    values: &mut IndexMap<String, Value>,
    taken: &IndexMap<String, Value>,
    base: &str,
    value: Value,
) -> String {
    let placeholder = free_placeholder(base, |placeholder| {
        !values.contains_key(placeholder) && !taken.contains_key(placeholder)
    });
    values.insert(placeholder.clone(), value);
    placeholder
}

/// Expression text with the name and value placeholders it references.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ExpressionInput {
    pub(crate) expression: String,
    pub(crate) expression_attribute_names: IndexMap<String, String>,
    pub(crate) expression_attribute_values: IndexMap<String, Value>,
}

impl ExpressionInput {
    /// Merge names and values into existing maps, keeping entries already present.
    ///
    /// Placeholders in the existing maps are expected to come from [`bind_name`] and
    /// [`bind_value`] against these clauses, so a shared placeholder carries the same binding.
    pub(crate) fn merge_into(
        self,
        names: &mut IndexMap<String, String>,
        values: &mut IndexMap<String, Value>,
    ) -> String {
        for (placeholder, name) in self.expression_attribute_names {
            names.entry(placeholder).or_insert(name);
        }
        for (placeholder, value) in self.expression_attribute_values {
            values.entry(placeholder).or_insert(value);
        }
        self.expression
    }
}
