//! Core types and traits of the cirrus REST-binding pipeline.
//!
//! This crate is transport independent. It provides:
//! - [`Request`], [`RequestBuilder`] and [`Response`] - the HTTP model
//! - [`Params`] and [`Payload`] - ordered multimaps and request bodies
//! - [`Binder`] and the reference binders - writing arguments into requests
//! - [`ResponseParser`] and the reference parsers - reading typed results
//! - [`MethodSpec`] and [`RequestFactory`] - declarative method metadata and
//!   its translation into requests
//! - [`RequestFilter`] and [`FilterChain`] - send-time request mutation
//! - [`Error`], [`ErrorKind`], [`ErrorMapper`] and [`FallbackPolicy`] -
//!   classification of failures
//! - [`RetryPolicy`] - what to repeat and how long to wait
//! - [`HttpClient`] - the transport seam
//! - [`Credentials`] and [`Clock`] - inputs of signing filters
//!
//! The async runtime pieces (hyper transport, retry decorator, caches,
//! concrete filters and the invoker) live in the `cirrus` crate.

mod args;
mod binder;
mod body;
mod client;
mod credentials;
mod error;
mod error_mapper;
mod factory;
mod fallback;
mod filter;
mod format;
mod method;
mod method_spec;
mod param;
mod params;
mod parser;
pub mod prelude;
mod request;
mod response;
mod retry;
mod template;

pub use args::Args;
pub use binder::{
    BindChecksumsToJsonPayload, BindMapToHeadersWithPrefix, BindParamsToForm,
    BindParamsToJsonPayload, BindToIndexedFormParams, BindToJsonPayload, Binder, Binding,
};
pub use body::{ContentType, Payload, from_form, from_json, to_form, to_json};
#[cfg(feature = "xml")]
pub use body::{from_xml, to_xml};
pub use client::HttpClient;
pub use credentials::{
    Clock, Credentials, CredentialsProvider, FixedClock, StaticCredentials, SystemClock,
};
pub use error::{Error, ErrorKind, HttpError, Result};
#[cfg(feature = "xml")]
pub use error_mapper::XmlErrorDecoder;
pub use error_mapper::{
    DefaultErrorDecoder, ErrorDecoder, ErrorMapper, JsonErrorDecoder, VendorError,
};
pub use factory::RequestFactory;
pub use fallback::{FallbackPolicy, FallbackValue};
pub use filter::{BoxFuture, FilterChain, FnFilter, RequestFilter};
pub use format::{DateFormat, format_date, parse_date, parse_number};
pub use method::Method;
pub use method_spec::{BinderAssignment, BinderSource, MethodSpec, MethodSpecBuilder};
pub use param::{ParamLocation, ParamSpec};
pub use params::Params;
#[cfg(feature = "xml")]
pub use parser::ParseXml;
pub use parser::{
    MapParser, ParseDateHeader, ParseHeader, ParseJson, ParseJsonField, ReleasePayload,
    ResponseParser, ReturnString, ReturnTrueIf2xx,
};
pub use request::{Request, RequestBuilder};
pub use response::Response;
pub use retry::{Backoff, RetryPolicy, RetryPolicyBuilder};
pub use template::{Encoding, UriTemplate};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};
