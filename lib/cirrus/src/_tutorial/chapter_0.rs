//! # Chapter 0: Getting Started
//!
//! Your first cirrus API client.
//!
//! ## What You'll Learn
//!
//! - Describe a method with [`MethodSpec`](cirrus_core::MethodSpec)
//! - Collect methods in a [`MethodRegistry`](crate::MethodRegistry)
//! - Call them through an [`ApiClient`](crate::ApiClient)
//!
//! ## Prerequisites
//!
//! Add to `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! cirrus = "0.1"
//! serde = { version = "1.0", features = ["derive"] }
//! tokio = { version = "1", features = ["full"] }
//! ```
//!
//! ## Your First Client
//!
//! ```ignore
//! use cirrus::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct Server {
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! impl FallbackValue for Server {}
//!
//! fn get_server() -> Result<MethodSpec> {
//!     MethodSpec::builder("getServer", Method::Get, "/servers/{serverId}")
//!         .param(ParamSpec::path("serverId"))
//!         .build()
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let registry = MethodRegistry::new().with(get_server()?)?;
//!     let api = ApiClient::new(HyperClient::new(), "https://compute.example.com/v2")?
//!         .with_registry(registry);
//!
//!     let server: Server = api
//!         .invoke(
//!             "getServer",
//!             &Args::new().with("serverId", "71"),
//!             &ParseJsonField::new("server"),
//!         )
//!         .await?;
//!     println!("Server: {server:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## What Happens on a Call
//!
//! ```text
//! Args ─► RequestFactory ─► binders ─► filters ─► HttpClient
//!                                                    │
//! value ◄─ parser (2xx) / error mapper + fallback ◄──┘
//! ```
//!
//! Everything inside the box is repeated by the retry policy: a retry builds
//! and signs a fresh request.
//!
//! ## Next Steps
//!
//! - [Chapter 1: Parameters & Binders][super::chapter_1] - Putting arguments on the wire
