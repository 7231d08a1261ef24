//! Tool call request value objects.
//!
//! A call carries the tool name and a JSON object of arguments. Handlers
//! pull typed values out of [`ToolParameters`] during validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::foundation::ValidationError;

/// Name of the argument that carries a confirmation token.
pub const CONFIRMATION_TOKEN_PARAM: &str = "confirmation_token";

/// A request to invoke a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the tool to invoke
    name: String,

    /// Arguments for the tool (JSON object)
    #[serde(default)]
    arguments: Value,
}

impl ToolCall {
    /// Creates a new tool call.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Returns the tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw arguments.
    pub fn arguments(&self) -> &Value {
        &self.arguments
    }

    /// Parses the arguments into a parameter map.
    pub fn parameters(&self) -> Result<ToolParameters, ValidationError> {
        ToolParameters::from_value(self.arguments.clone())
    }
}

/// Tool arguments as a JSON object with typed accessors.
///
/// Accessors treat an explicit `null` the same as an absent key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolParameters(Map<String, Value>);

impl ToolParameters {
    /// Wraps a JSON value. `null` yields an empty parameter set.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            _ => Err(ValidationError::invalid_format(
                "arguments",
                "expected a JSON object",
            )),
        }
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|v| !v.is_null())
    }

    /// Returns a non-empty string parameter.
    pub fn required_str(&self, name: &str) -> Result<&str, ValidationError> {
        match self.optional_str(name)? {
            Some(value) => Ok(value),
            None => Err(ValidationError::missing(name)),
        }
    }

    /// Returns a string parameter if present. Present but blank is an error.
    pub fn optional_str(&self, name: &str) -> Result<Option<&str>, ValidationError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::empty_field(name)),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(ValidationError::invalid_format(name, "expected a string")),
        }
    }

    /// Returns a boolean parameter if present.
    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>, ValidationError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(ValidationError::invalid_format(name, "expected a boolean")),
        }
    }

    /// Returns a non-negative integer parameter if present.
    pub fn optional_u64(&self, name: &str) -> Result<Option<u64>, ValidationError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value.as_u64().map(Some).ok_or_else(|| {
                ValidationError::invalid_format(name, "expected a non-negative integer")
            }),
        }
    }

    /// Returns an object parameter if present.
    pub fn optional_object(&self, name: &str) -> Result<Option<&Map<String, Value>>, ValidationError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(ValidationError::invalid_format(name, "expected a JSON object")),
        }
    }

    /// Returns the supplied confirmation token, or `""` when absent.
    pub fn confirmation_token(&self) -> &str {
        self.get(CONFIRMATION_TOKEN_PARAM)
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Returns the parameters as an ordered map without the confirmation token.
    pub fn without_token(&self) -> BTreeMap<String, Value> {
        self.0
            .iter()
            .filter(|(name, _)| name.as_str() != CONFIRMATION_TOKEN_PARAM)
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Returns true if no parameters were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
