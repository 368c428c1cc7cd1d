//! Runtime arguments of a single invocation.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Named arguments, in declaration order.
///
/// Arguments are held as structured JSON values so that binders can
/// serialize domain objects without knowing their Rust type.
///
/// # Example
///
/// ```
/// use cirrus_core::Args;
///
/// let args = Args::new()
///     .with("serverId", "srv-42")
///     .with("imageName", "nightly");
///
/// assert_eq!(args.get("serverId").and_then(|v| v.as_str()), Some("srv-42"));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Map<String, Value>,
}

impl Args {
    /// No arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an argument that converts directly into a JSON value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Add an argument by serializing a domain object.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON.
    pub fn serialize<T: serde::Serialize>(mut self, name: impl Into<String>, value: &T) -> Result<Self> {
        self.values.insert(name.into(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// Argument value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Returns `true` if the argument is present and not null.
    #[must_use]
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.is_null())
    }

    /// All arguments in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Args {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        }
    }
}

/// Render a scalar argument as a parameter string.
///
/// Null yields `None`; arrays and objects are rejected because they have no
/// single string form.
pub(crate) fn scalar_to_string(name: &str, value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Array(_) | Value::Object(_) => Err(Error::illegal_state(format!(
            "argument `{name}` must be a scalar, got {}",
            if value.is_array() { "an array" } else { "an object" }
        ))),
    }
}
