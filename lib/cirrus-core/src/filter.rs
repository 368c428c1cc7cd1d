//! Request filters run immediately before transmission.
//!
//! Filters are attached to a [`Request`] when it is built but only run when
//! the request is about to be sent, once per attempt, so time-sensitive
//! values such as signatures reflect the actual send time.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::{Request, Result};

/// Boxed future returned by object-safe async traits in this crate.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A request mutator applied before transmission.
///
/// # Example
///
/// ```
/// use cirrus_core::{BoxFuture, Request, RequestFilter, Result};
///
/// #[derive(Debug)]
/// struct ApiVersion;
///
/// impl RequestFilter for ApiVersion {
///     fn filter<'a>(&'a self, request: Request) -> BoxFuture<'a, Result<Request>> {
///         Box::pin(async move {
///             request.to_builder().replace_header("X-Api-Version", "2").build()
///         })
///     }
/// }
/// ```
pub trait RequestFilter: Send + Sync + fmt::Debug {
    /// Produce the request to send.
    fn filter<'a>(&'a self, request: Request) -> BoxFuture<'a, Result<Request>>;

    /// Called before a retry that follows an authentication failure.
    ///
    /// Filters holding cached credentials or tokens drop them here so the
    /// next attempt re-authenticates.
    fn on_authentication_failure(&self) {}
}

/// Ordered list of filters.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Vec<Arc<dyn RequestFilter>>,
}

impl FilterChain {
    /// Empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter.
    pub fn push(&mut self, filter: Arc<dyn RequestFilter>) {
        self.filters.push(filter);
    }

    /// Append a filter, builder style.
    #[must_use]
    pub fn with(mut self, filter: impl RequestFilter + 'static) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Append every filter of `other` after the current ones.
    pub fn extend_from(&mut self, other: &Self) {
        self.filters.extend(other.filters.iter().cloned());
    }

    /// Number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if the chain has no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filters in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn RequestFilter>> {
        self.filters.iter()
    }

    /// Run every filter in order, threading the request through each.
    ///
    /// # Errors
    ///
    /// Returns the first filter error; later filters do not run.
    pub async fn apply(&self, mut request: Request) -> Result<Request> {
        for filter in &self.filters {
            request = filter.filter(request).await?;
        }
        Ok(request)
    }

    /// Tell every filter that the last attempt failed authentication.
    pub fn notify_authentication_failure(&self) {
        for filter in &self.filters {
            filter.on_authentication_failure();
        }
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.filters.iter()).finish()
    }
}

/// Filter built from a synchronous closure.
pub struct FnFilter<F> {
    name: &'static str,
    f: F,
}

impl<F> FnFilter<F>
where
    F: Fn(Request) -> Result<Request> + Send + Sync,
{
    /// Wrap `f` under a display name.
    pub const fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> fmt::Debug for FnFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnFilter").field(&self.name).finish()
    }
}

impl<F> RequestFilter for FnFilter<F>
where
    F: Fn(Request) -> Result<Request> + Send + Sync,
{
    fn filter<'a>(&'a self, request: Request) -> BoxFuture<'a, Result<Request>> {
        let result = (self.f)(request);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{Error, Method};

    fn request() -> Request {
        Request::builder()
            .method(Method::Get)
            .endpoint("https://compute.example.com/servers".parse().expect("url"))
            .build()
            .expect("request")
    }

    #[tokio::test]
    async fn filters_run_in_declaration_order() {
        let chain = FilterChain::new()
            .with(FnFilter::new("first", |request: Request| {
                request.to_builder().add_header("X-Trace", "first").build()
            }))
            .with(FnFilter::new("second", |request: Request| {
                request.to_builder().add_header("X-Trace", "second").build()
            }));

        let filtered = chain.apply(request()).await.expect("filtered");
        let trace: Vec<_> = filtered.headers().get_all("x-trace").collect();
        assert_eq!(trace, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn first_error_stops_the_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let chain = FilterChain::new()
            .with(FnFilter::new("fails", |_request: Request| {
                Err(Error::configuration("no credentials"))
            }))
            .with(FnFilter::new("counts", move |request: Request| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(request)
            }));

        let err = chain.apply(request()).await.expect_err("first filter fails");
        assert_eq!(err.kind(), crate::ErrorKind::Configuration);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn debug_lists_filters() {
        let chain = FilterChain::new().with(FnFilter::new("noop", Ok));
        assert_eq!(format!("{chain:?}"), r#"[FnFilter("noop")]"#);
    }
}
