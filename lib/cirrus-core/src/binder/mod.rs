//! Binders: strategies that write method arguments into a request.
//!
//! A binder supports exactly one of two call shapes:
//!
//! - **object**: a single complex argument (a domain object, a map, a list);
//! - **named parameters**: several simple arguments collected into one map,
//!   e.g. `serverId` and `imageName`.
//!
//! Handing a binder the other shape is a wiring mistake and fails
//! immediately with [`Error::IllegalState`]; a binder never serializes a
//! structure it was not written for. Null inputs fail the same way.

mod form;
mod headers;
mod json;

use std::fmt;

use serde_json::{Map, Value};

use crate::{Error, Request, Result};

pub use form::{BindParamsToForm, BindToIndexedFormParams};
pub use headers::BindMapToHeadersWithPrefix;
pub use json::{BindChecksumsToJsonPayload, BindParamsToJsonPayload, BindToJsonPayload};

/// The input handed to a binder.
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    /// One complex argument.
    Object(&'a Value),
    /// Named simple arguments, in declaration order.
    Params(&'a Map<String, Value>),
}

impl<'a> Binding<'a> {
    /// The object input, or an [`Error::IllegalState`] naming what was expected.
    ///
    /// `what` completes the sentence "this binder needs ...", e.g.
    /// `"a checksum map object"`.
    ///
    /// # Errors
    ///
    /// Fails for the named-parameter shape and for null objects.
    pub fn object(self, what: &str) -> Result<&'a Value> {
        match self {
            Self::Object(Value::Null) => Err(Error::illegal_state(format!(
                "this binder needs {what}, not null"
            ))),
            Self::Object(value) => Ok(value),
            Self::Params(_) => Err(Error::illegal_state(format!(
                "this binder needs {what}, not a map of named parameters"
            ))),
        }
    }

    /// The named-parameter input.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::IllegalState`] for the object shape.
    pub fn params(self) -> Result<&'a Map<String, Value>> {
        match self {
            Self::Params(params) => Ok(params),
            Self::Object(_) => Err(Error::illegal_state(
                "this binder needs a map of named parameters, not an object",
            )),
        }
    }
}

/// Writes an argument (or the collected named parameters) into a request.
///
/// Binders are stateless and shared by every invocation of a method.
pub trait Binder: Send + Sync + fmt::Debug {
    /// Return a request carrying the bound input.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::IllegalState`] for an unsupported call shape or a
    /// null input, or with a serialization error.
    fn bind(&self, request: Request, binding: Binding<'_>) -> Result<Request>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Method, Request};

    pub(crate) fn post() -> Request {
        Request::builder()
            .method(Method::Post)
            .endpoint("https://api.example.com/v2/servers".parse().expect("url"))
            .build()
            .expect("request")
    }
}
