//! Declarative REST-binding, response-parsing and retry pipeline for cloud APIs.
//!
//! A provider describes each API method once as a [`MethodSpec`](cirrus_core::MethodSpec)
//! (verb, URI template, binders, filters, fallback, timeout, retry) and calls
//! it through an [`ApiClient`], which builds, filters, sends, parses and
//! retries.
//!
//! # Example
//!
//! ```no_run
//! use cirrus::prelude::*;
//!
//! # async fn run() -> cirrus::Result<()> {
//! let registry = MethodRegistry::new().with(
//!     MethodSpec::builder("listObjects", Method::Get, "/{container}")
//!         .param(ParamSpec::path("container"))
//!         .param(ParamSpec::query("prefix"))
//!         .fallback(FallbackPolicy::empty_on_not_found())
//!         .build()?,
//! )?;
//!
//! let api = ApiClient::new(HyperClient::new(), "https://storage.example.com/v1")?
//!     .with_registry(registry);
//!
//! let objects: Vec<serde_json::Value> = api
//!     .invoke(
//!         "listObjects",
//!         &Args::new().with("container", "photos").with("prefix", "2024/"),
//!         &ParseJson::new(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! See the [tutorial][_tutorial] for a complete guide.

pub mod _tutorial;
mod api_client;
mod cache;
mod client;
mod config;
mod connector;
pub mod filters;
pub mod middleware;
pub mod prelude;
mod registry;
mod retry;

pub use api_client::ApiClient;
pub use cache::{CacheLoader, CreateOrFetch, LoadingCache};
pub use client::{BoxedService, HyperClient, HyperClientBuilder, ServiceFuture};
pub use config::{ApiConfig, ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};
pub use connector::https_connector;
pub use registry::MethodRegistry;
pub use retry::{RetryExt, Retrying};

// Re-export tower for middleware composition
pub use tower;

// Re-export the core crate and its most used items
pub use cirrus_core;
pub use cirrus_core::{Error, ErrorKind, HttpClient, Request, Response, Result};

// Re-export http types for status codes and headers
pub use cirrus_core::{StatusCode, header};
