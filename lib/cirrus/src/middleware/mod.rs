//! Tower middleware for the [`HyperClient`](crate::HyperClient) transport.
//!
//! Layers wrap the raw exchange only. Request filters, retries and error
//! mapping belong to the invocation pipeline in [`ApiClient`](crate::ApiClient)
//! and run outside the transport.
//!
//! | Feature | Helper |
//! |---------|--------|
//! | (always) | `.with_logging()`, `.with_debug_logging()`, `.layer()` |
//! | `middleware-concurrency` | `.with_concurrency_limit()` |

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

pub use tower::limit::ConcurrencyLimitLayer;
pub use tower::{Layer, ServiceBuilder};
