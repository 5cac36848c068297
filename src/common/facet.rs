use crate::{
    common,
    error::{Error, Result},
};

/// Restrict supplied values to the required facets, failing when any is missing.
///
/// The returned map follows the order of `required`. `label` names the kind of facets in the
/// error message and defaults to `key facets`.
///
/// ```rust
/// use dynamodb_facet::common::facet;
/// use serde_json::json;
///
/// let supplied = json!({"store": "LatteLarrys", "building": "BuildingA"});
/// let required = ["mall".to_string(), "building".to_string()];
/// let error = facet::expect_facets(supplied.as_object().unwrap(), &required, Some("partition keys"))
///     .unwrap_err();
/// assert_eq!(
///     error.to_string(),
///     "Incomplete or invalid partition keys supplied. Missing properties: mall"
/// );
/// ```
pub fn expect_facets(
    supplied: &common::Facets,
    required: &[String],
    label: Option<&str>,
) -> Result<common::Facets> {
    let missing: Vec<_> = required
        .iter()
        .filter(|name| !common::is_present(supplied, name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(Error::incomplete_facets(label, missing));
    }
    let facets = required
        .iter()
        .filter_map(|name| {
            supplied
                .get(name)
                .map(|value| (name.clone(), value.clone()))
        })
        .collect();
    Ok(facets)
}
