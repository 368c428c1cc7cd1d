use serde_json::Value;

use super::json::kind_of;
use super::{Binder, Binding};
use crate::args::scalar_to_string;
use crate::{Error, Params, Request, Result};

/// Encodes a map or a set as 1-based indexed form parameters.
///
/// A map `{"Name": "web", "Env": "prod"}` under prefix `Tag` becomes
///
/// ```text
/// Tag.1.Name=Name  Tag.1.Value=web
/// Tag.2.Name=Env   Tag.2.Value=prod
/// ```
///
/// numbered in insertion order. An array becomes `Prefix.1`, `Prefix.2`, ...
/// with duplicates dropped at their first-seen position. Empty input leaves
/// the request unmodified.
#[derive(Debug, Clone)]
pub struct BindToIndexedFormParams {
    prefix: String,
    name_suffix: String,
    value_suffix: String,
}

impl BindToIndexedFormParams {
    /// Indexed pairs as `Prefix.N.Name` / `Prefix.N.Value`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_suffixes(prefix, "Name", "Value")
    }

    /// Indexed pairs with vendor-specific suffixes, e.g. `Tag.N.Key`.
    #[must_use]
    pub fn with_suffixes(
        prefix: impl Into<String>,
        name_suffix: impl Into<String>,
        value_suffix: impl Into<String>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            name_suffix: name_suffix.into(),
            value_suffix: value_suffix.into(),
        }
    }

    fn name_key(&self, index: usize) -> String {
        format!("{}.{index}.{}", self.prefix, self.name_suffix)
    }

    fn value_key(&self, index: usize) -> String {
        format!("{}.{index}.{}", self.prefix, self.value_suffix)
    }

    fn item_key(&self, index: usize) -> String {
        format!("{}.{index}", self.prefix)
    }

    /// Recover the ordered `(name, value)` pairs this binder wrote.
    ///
    /// Reading stops at the first missing index.
    #[must_use]
    pub fn unbind(&self, form: &Params) -> Vec<(String, String)> {
        (1..)
            .map_while(|index| {
                let name = form.get(&self.name_key(index))?;
                let value = form.get(&self.value_key(index)).unwrap_or_default();
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }

    /// Recover the ordered items of a bound array.
    #[must_use]
    pub fn unbind_items(&self, form: &Params) -> Vec<String> {
        (1..)
            .map_while(|index| form.get(&self.item_key(index)).map(str::to_string))
            .collect()
    }
}

impl Binder for BindToIndexedFormParams {
    fn bind(&self, request: Request, binding: Binding<'_>) -> Result<Request> {
        const NEEDS: &str = "a map or array object";

        let mut builder = request.to_builder();
        match binding.object(NEEDS)? {
            Value::Object(entries) => {
                if entries.is_empty() {
                    return Ok(request);
                }
                for (index, (name, value)) in entries.iter().enumerate() {
                    let value = scalar_to_string(name, value)?.unwrap_or_default();
                    builder = builder
                        .form_param(self.name_key(index + 1), name.clone())
                        .form_param(self.value_key(index + 1), value);
                }
            }
            Value::Array(items) => {
                let mut seen: Vec<String> = Vec::with_capacity(items.len());
                for item in items {
                    let Some(item) = scalar_to_string(&self.prefix, item)? else {
                        continue;
                    };
                    if !seen.contains(&item) {
                        seen.push(item);
                    }
                }
                if seen.is_empty() {
                    return Ok(request);
                }
                for (index, item) in seen.into_iter().enumerate() {
                    builder = builder.form_param(self.item_key(index + 1), item);
                }
            }
            other => {
                return Err(Error::illegal_state(format!(
                    "this binder needs {NEEDS}, not {}",
                    kind_of(other)
                )));
            }
        }
        builder.build()
    }
}

/// Writes each named payload parameter as a form parameter.
///
/// Nulls are skipped and arrays repeat the parameter name.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindParamsToForm;

impl Binder for BindParamsToForm {
    fn bind(&self, request: Request, binding: Binding<'_>) -> Result<Request> {
        let params = binding.params()?;
        let mut builder = request.to_builder();
        for (name, value) in params {
            let values: &[Value] = match value {
                Value::Array(items) => items,
                single => std::slice::from_ref(single),
            };
            for value in values {
                if let Some(value) = scalar_to_string(name, value)? {
                    builder = builder.form_param(name.clone(), value);
                }
            }
        }
        builder.build()
    }
}
