//! # Chapter 3: Filters, Retries & Caches
//!
//! Authentication and resilience.
//!
//! ## Request Filters
//!
//! Filters run right before the transport, on every attempt:
//!
//! ```ignore
//! let signer = SigningFilter::builder()
//!     .credentials(StaticCredentials::new("AKID", "secret"))
//!     .build()?;
//!
//! let api = ApiClient::new(http, "https://storage.example.com")?
//!     .with_filter(signer)              // every method
//!     .with_filter(VirtualHostFilter);  // bucket.storage.example.com
//! ```
//!
//! Signing timestamps are truncated to a one second quantum, so re-signing
//! an unchanged request inside one second gives the same signature.
//!
//! ## Retries
//!
//! Each call runs under a [`RetryPolicy`](cirrus_core::RetryPolicy): the
//! API default from [`ApiConfig`](crate::ApiConfig), or the method's own.
//!
//! ```ignore
//! let api = api.with_config(ApiConfig::default().with_retry(
//!     RetryPolicy::builder()
//!         .max_attempts(3)
//!         .retry_on(ErrorKind::Authentication) // token filters re-authenticate
//!         .build(),
//! ));
//! ```
//!
//! The decorator also works on any async operation:
//!
//! ```ignore
//! let create = policy.decorate(|| api.invoke("createGroup", &args, &ReleasePayload));
//! create.call().await?;
//! ```
//!
//! ## Caches
//!
//! [`LoadingCache`](crate::LoadingCache) loads each key at most once at a
//! time, which keeps create-or-fetch idioms from creating twice:
//!
//! ```ignore
//! let groups = LoadingCache::new(move |name: String| {
//!     let api = api.clone();
//!     async move { find_or_create_group(&api, &name).await }
//! });
//! let group = groups.get(&"my-group".to_string()).await?;
//! ```
//!
//! ## Transport Middleware
//!
//! Tower layers wrap the raw exchange:
//!
//! ```ignore
//! let http = HyperClient::builder()
//!     .with_logging()
//!     .layer(ConcurrencyLimitLayer::new(16))
//!     .build();
//! ```
