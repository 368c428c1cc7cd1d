use serde_json::Value;

use super::json::kind_of;
use super::{Binder, Binding};
use crate::args::scalar_to_string;
use crate::{Error, Request, Result};

/// Writes a metadata map as headers, one per entry, under a fixed prefix.
///
/// Used for user metadata on blobs and containers, e.g. `X-Object-Meta-`.
/// Existing headers of the same name are replaced.
#[derive(Debug, Clone)]
pub struct BindMapToHeadersWithPrefix {
    prefix: String,
}

impl BindMapToHeadersWithPrefix {
    /// Binder writing entries as `{prefix}{key}` headers.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Binder for BindMapToHeadersWithPrefix {
    fn bind(&self, request: Request, binding: Binding<'_>) -> Result<Request> {
        const NEEDS: &str = "a metadata map object";

        let entries = match binding.object(NEEDS)? {
            Value::Object(entries) => entries,
            other => {
                return Err(Error::illegal_state(format!(
                    "this binder needs {NEEDS}, not {}",
                    kind_of(other)
                )));
            }
        };

        let mut builder = request.to_builder();
        for (key, value) in entries {
            let value = scalar_to_string(key, value)?.unwrap_or_default();
            builder = builder.replace_header(format!("{}{key}", self.prefix), value);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::*;
    use crate::ErrorKind;
    use crate::binder::test_support::post;

    #[test]
    fn entries_become_prefixed_headers() {
        let metadata = json!({"color": "blue", "size": 3});
        let request = post()
            .to_builder()
            .add_header("X-Object-Meta-Color", "red")
            .build()
            .expect("request");

        let bound = BindMapToHeadersWithPrefix::new("X-Object-Meta-")
            .bind(request, Binding::Object(&metadata))
            .expect("bind");

        assert_eq!(
            bound
                .headers()
                .get_all("x-object-meta-color")
                .collect::<Vec<_>>(),
            vec!["blue"]
        );
        assert_eq!(bound.header("X-Object-Meta-size"), Some("3"));
    }

    #[test]
    fn rejects_named_params_and_arrays() {
        let binder = BindMapToHeadersWithPrefix::new("X-Meta-");

        let params = Map::new();
        let err = binder
            .bind(post(), Binding::Params(&params))
            .expect_err("wrong shape");
        assert_eq!(err.kind(), ErrorKind::IllegalState);

        let list = json!(["a"]);
        let err = binder
            .bind(post(), Binding::Object(&list))
            .expect_err("array");
        assert_eq!(err.kind(), ErrorKind::IllegalState);
    }
}
