//! Error types shared by every operation of the crate.

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or executing entity operations.
///
/// Everything but [`Error::Execution`] is raised synchronously, before any request
/// leaves the process.
#[derive(Debug, Error)]
pub enum Error {
    /// An index identifier or access pattern that is not registered.
    #[error("Invalid index: {0}")]
    InvalidIndex(String),
    /// Required key facets are missing from the supplied values.
    #[error(
        "Incomplete or invalid {label} supplied. Missing properties: {}",
        .missing.join(", ")
    )]
    IncompleteFacets {
        /// What kind of facets were expected, e.g. `partition keys`.
        label: String,
        /// The missing facet names, in declared order.
        missing: Vec<String>,
    },
    /// An operation that the current chain state does not allow.
    #[error("{0}")]
    InvalidChain(String),
    /// A structural problem found while resolving an entity schema.
    #[error("{0}")]
    InvalidSchema(String),
    /// A value rejected by the attribute model, or an attribute the schema does not define.
    #[error("Invalid attribute {name}: {reason}")]
    InvalidAttribute {
        /// The attribute name.
        name: String,
        /// Why the attribute was rejected.
        reason: String,
    },
    /// Facet values that could not be turned into a JSON object.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// Conversion between JSON values and DynamoDB attribute values failed.
    #[error(transparent)]
    Dynamo(#[from] serde_dynamo::Error),
    /// The request was sent and DynamoDB (or the transport) failed it.
    #[error(transparent)]
    Execution(#[from] aws_sdk_dynamodb::Error),
}

impl Error {
    pub(crate) fn incomplete_facets(label: Option<&str>, missing: Vec<String>) -> Self {
        Self::IncompleteFacets {
            label: label.unwrap_or("key facets").to_string(),
            missing,
        }
    }

    pub(crate) fn invalid_attribute(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
