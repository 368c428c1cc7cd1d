//! Prelude module for convenient imports.
//!
//! This module re-exports the types a provider module needs to declare
//! methods:
//!
//! ```
//! use cirrus_core::prelude::*;
//! ```

pub use crate::{
    Args, Binder, Binding, Error, ErrorKind, FallbackPolicy, FallbackValue, HttpClient, Method,
    MethodSpec, ParamSpec, Payload, Request, RequestBuilder, RequestFilter, Response,
    ResponseParser, Result, RetryPolicy,
};
