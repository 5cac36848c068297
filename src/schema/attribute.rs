use crate::error::{Error, Result};

use serde::Deserialize;
use serde_json::Value;

/// Scalar attribute types.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// JSON strings.
    #[default]
    String,
    /// JSON numbers.
    Number,
    /// JSON booleans.
    Boolean,
}

impl ScalarType {
    fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// Type of an attribute: a scalar type name or a list of accepted string values.
///
/// ```rust
/// use dynamodb_facet::schema::attribute;
///
/// let scalar: attribute::AttributeType = serde_json::from_str(r#""number""#).unwrap();
/// let category: attribute::AttributeType = serde_json::from_str(r#"["food/coffee", "misc"]"#).unwrap();
/// assert_eq!(scalar, attribute::AttributeType::Scalar(attribute::ScalarType::Number));
/// assert!(matches!(category, attribute::AttributeType::Enum(_)));
/// ```
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(untagged)]
pub enum AttributeType {
    /// A scalar type.
    Scalar(ScalarType),
    /// An enumerated string type.
    Enum(Vec<String>),
}

impl Default for AttributeType {
    fn default() -> Self {
        Self::Scalar(ScalarType::default())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A resolved attribute of an entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    /// The static value used when none is supplied.
    pub default: Option<Value>,
    /// The physical field name the attribute is stored under.
    pub field: String,
    /// The attribute type.
    pub kind: AttributeType,
    /// A human readable label, defaults to the name.
    pub label: String,
    /// The attribute name.
    pub name: String,
    /// Whether updates may change the attribute.
    pub read_only: bool,
    /// Whether a value (supplied or default) must be present.
    pub required: bool,
}

impl Attribute {
    /// Check a value against the attribute type, returning the reason it is rejected.
    pub fn is_valid(&self, value: &Value) -> std::result::Result<(), String> {
        match &self.kind {
            AttributeType::Enum(accepted) => match value.as_str() {
                Some(value) if accepted.iter().any(|candidate| candidate == value) => Ok(()),
                _ => Err(format!(
                    "Value not found in set of acceptable values: {}",
                    accepted.join(", ")
                )),
            },
            AttributeType::Scalar(scalar) => {
                let received = type_name(value);
                if received == scalar.as_str() {
                    Ok(())
                } else {
                    Err(format!(
                        "Received value of type {received}, expected value of type {}",
                        scalar.as_str()
                    ))
                }
            }
        }
    }

    /// Resolve the value to store: apply the default, enforce `required`, validate.
    ///
    /// `null` counts as missing.
    pub fn val(&self, value: Option<&Value>) -> Result<Option<Value>> {
        let value = match value {
            Some(value) if !value.is_null() => Some(value.clone()),
            _ => self.default.clone(),
        };
        match value {
            Some(value) => {
                self.is_valid(&value)
                    .map_err(|reason| Error::invalid_attribute(&self.name, reason))?;
                Ok(Some(value))
            }
            None if self.required => Err(Error::invalid_attribute(&self.name, "Value is required")),
            None => Ok(None),
        }
    }
}
