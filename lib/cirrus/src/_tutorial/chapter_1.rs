//! # Chapter 1: Parameters & Binders
//!
//! How arguments reach the request.
//!
//! ## Declaring Parameters
//!
//! Every argument is declared with a [`ParamSpec`](cirrus_core::ParamSpec)
//! saying where it goes:
//!
//! ```ignore
//! MethodSpec::builder("listObjects", Method::Get, "/{container}")
//!     .param(ParamSpec::path("container"))          // {container}, one path segment
//!     .param(ParamSpec::query_as("pageSize", "limit")) // ?limit=...
//!     .param(ParamSpec::header("ifMatch", "If-Match"))
//!     .build()?;
//! ```
//!
//! Null arguments are left out; arrays repeat the parameter. A placeholder
//! without a path parameter is rejected when the `MethodSpec` is built.
//!
//! ## Static Parts
//!
//! ```ignore
//! MethodSpec::builder("describeGroups", Method::Post, "/")
//!     .form("Action", "DescribeSecurityGroups")
//!     .header("X-Auth-Project-Id", "{project}") // placeholders work in headers
//! ```
//!
//! ## Binders
//!
//! Binders write structured arguments. They take either one argument
//! (object shape) or all payload parameters collected into a map (named-map
//! shape), and refuse the shape they do not support:
//!
//! ```ignore
//! // {"server": {...}}
//! .bind_arg("server", BindToJsonPayload::wrapped("server"))
//!
//! // {"createImage": {"name": ..., "metadata": ...}}
//! .param(ParamSpec::payload("name"))
//! .param(ParamSpec::payload("metadata"))
//! .bind_payload(BindParamsToJsonPayload::wrapped("createImage"))
//!
//! // Tag.1.Key=env&Tag.1.Value=prod&Tag.2.Key=...
//! .bind_arg("tags", BindToIndexedFormParams::with_suffixes("Tag", "Key", "Value"))
//! ```
//!
//! ## Summary
//!
//! | Binder | Shape | Writes |
//! |--------|-------|--------|
//! | `BindToJsonPayload` | object | JSON body, optional wrapper |
//! | `BindParamsToJsonPayload` | named map | JSON body, optional wrapper |
//! | `BindChecksumsToJsonPayload` | object | `{"checksums": {...}}` |
//! | `BindToIndexedFormParams` | object or array | `Prefix.N.Name` / `Prefix.N` |
//! | `BindParamsToForm` | named map | form parameters |
//! | `BindMapToHeadersWithPrefix` | object | `prefix + key` headers |
//!
//! ## Next Steps
//!
//! - [Chapter 2: Responses & Errors][super::chapter_2] - Parsers and fallbacks
