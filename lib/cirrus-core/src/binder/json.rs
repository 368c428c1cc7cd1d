use serde_json::{Map, Value};

use super::{Binder, Binding};
use crate::{Payload, Request, Result};

/// Serializes one argument as the JSON payload.
///
/// With a wrapper name the value is nested under that field, which is how
/// most vendors envelope a single resource (`{"server": {...}}`).
#[derive(Debug, Clone, Default)]
pub struct BindToJsonPayload {
    wrapper_name: Option<String>,
}

impl BindToJsonPayload {
    /// Payload is the argument as-is.
    #[must_use]
    pub const fn new() -> Self {
        Self { wrapper_name: None }
    }

    /// Payload is `{wrapper_name: argument}`.
    #[must_use]
    pub fn wrapped(wrapper_name: impl Into<String>) -> Self {
        Self {
            wrapper_name: Some(wrapper_name.into()),
        }
    }
}

impl Binder for BindToJsonPayload {
    fn bind(&self, request: Request, binding: Binding<'_>) -> Result<Request> {
        let value = binding.object("an object to serialize as JSON")?;
        let payload = wrap(self.wrapper_name.as_deref(), value.clone());
        request.to_builder().payload(Payload::Json(payload)).build()
    }
}

/// Collects the named payload parameters into one JSON object.
///
/// Null parameters are left out of the body.
#[derive(Debug, Clone, Default)]
pub struct BindParamsToJsonPayload {
    wrapper_name: Option<String>,
}

impl BindParamsToJsonPayload {
    /// Binder writing the parameters as a bare JSON object.
    #[must_use]
    pub const fn new() -> Self {
        Self { wrapper_name: None }
    }

    /// Nest the collected parameters under `wrapper_name`.
    #[must_use]
    pub fn wrapped(wrapper_name: impl Into<String>) -> Self {
        Self {
            wrapper_name: Some(wrapper_name.into()),
        }
    }
}

impl Binder for BindParamsToJsonPayload {
    fn bind(&self, request: Request, binding: Binding<'_>) -> Result<Request> {
        let params = binding.params()?;
        let body: Map<String, Value> = params
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let payload = wrap(self.wrapper_name.as_deref(), Value::Object(body));
        request.to_builder().payload(Payload::Json(payload)).build()
    }
}

/// Binds a checksum map as `{"checksums": {...}}`, keeping key order.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindChecksumsToJsonPayload;

impl Binder for BindChecksumsToJsonPayload {
    fn bind(&self, request: Request, binding: Binding<'_>) -> Result<Request> {
        const NEEDS: &str = "a checksum map object";

        let value = binding.object(NEEDS)?;
        let checksums = value.as_object().ok_or_else(|| {
            crate::Error::illegal_state(format!("this binder needs {NEEDS}, not {}", kind_of(value)))
        })?;
        let payload = wrap(Some("checksums"), Value::Object(checksums.clone()));
        request.to_builder().payload(Payload::Json(payload)).build()
    }
}

fn wrap(wrapper_name: Option<&str>, value: Value) -> Value {
    match wrapper_name {
        Some(name) => {
            let mut envelope = Map::with_capacity(1);
            envelope.insert(name.to_string(), value);
            Value::Object(envelope)
        }
        None => value,
    }
}

pub(super) const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
