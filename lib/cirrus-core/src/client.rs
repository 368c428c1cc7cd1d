//! Transport trait.
//!
//! [`HttpClient`] is the only outbound seam of the pipeline: the request
//! factory, filters and parsers never touch the network. `cirrus` ships a
//! hyper-based implementation; tests substitute an in-memory one.

use std::future::Future;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Sends one fully filtered request and buffers the response.
///
/// Implementations must drain and release the response body before
/// returning, whatever the status, so that error paths never hold a pooled
/// connection.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the buffered response.
    ///
    /// Non-2xx statuses are returned as responses, not errors; mapping them
    /// is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the response cannot
    /// be read:
    /// - [`Error::Connection`](crate::Error::Connection) for network errors
    /// - [`Error::Tls`](crate::Error::Tls) for TLS errors
    /// - [`Error::Timeout`](crate::Error::Timeout) when the transport gives up
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

impl<T: HttpClient> HttpClient for Arc<T> {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        (**self).execute(request)
    }
}

impl<T: HttpClient> HttpClient for &T {
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        (**self).execute(request)
    }
}
