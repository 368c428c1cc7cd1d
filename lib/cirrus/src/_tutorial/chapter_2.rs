//! # Chapter 2: Responses & Errors
//!
//! Turning responses into values, and failures into typed errors.
//!
//! ## Parsers
//!
//! The parser passed to `invoke` fixes the result type:
//!
//! | Parser | Output |
//! |--------|--------|
//! | `ParseJson<T>` | the whole body as `T` |
//! | `ParseJsonField<T>` | one top-level field as `T` |
//! | `ParseXml<T>` | the body as `T` (feature `xml`) |
//! | `ReturnString` | the body as text |
//! | `ReturnTrueIf2xx` | `true` |
//! | `ReleasePayload` | `()` |
//! | `ParseHeader` | a response header, e.g. `ETag` |
//! | `ParseDateHeader` | a header in a declared date format |
//!
//! Parsers compose with [`map`](cirrus_core::ResponseParser::map):
//!
//! ```ignore
//! let count = ParseJsonField::<Vec<Value>>::new("servers").map(|s| s.len());
//! ```
//!
//! ## Error Kinds
//!
//! Non-2xx responses become [`Error::Http`](cirrus_core::Error::Http), classified by
//! [`ErrorKind`](cirrus_core::ErrorKind):
//!
//! ```ignore
//! match api.invoke("getServer", &args, &parser).await {
//!     Err(e) if e.kind() == ErrorKind::ResourceNotFound => { /* gone */ }
//!     Err(e) if e.kind() == ErrorKind::TransientService => { /* retries ran out */ }
//!     other => { /* ... */ }
//! }
//! ```
//!
//! Vendor error bodies refine the classification through the error mapper:
//!
//! ```ignore
//! let api = api.with_error_mapper(
//!     ErrorMapper::new()
//!         .with_decoder(XmlErrorDecoder)
//!         .vendor_code("InvalidGroup.NotFound", ErrorKind::ResourceNotFound)
//!         .vendor_code("Throttling", ErrorKind::TransientService),
//! );
//! ```
//!
//! ## Fallbacks
//!
//! A method's [`FallbackPolicy`](cirrus_core::FallbackPolicy) turns selected
//! final errors into values:
//!
//! ```ignore
//! MethodSpec::builder("getContainer", Method::Get, "/{container}")
//!     .param(ParamSpec::path("container"))
//!     .fallback(FallbackPolicy::null_on_not_found()) // Option<T> → None on 404
//!     .build()?;
//! ```
//!
//! Any other status still returns the error.
//!
//! ## Next Steps
//!
//! - [Chapter 3: Filters, Retries & Caches][super::chapter_3] - Authentication and resilience
