//! The invoker: turns a method call into a signed, retried, parsed exchange.
//!
//! One attempt is: build the request from the [`MethodSpec`] and the
//! arguments, run its filters, send it (bounded by the method's timeout),
//! then parse a 2xx response or map the failure to an error. An attempt that
//! fails authentication tells the filters, whether or not it is retried.
//! Attempts are repeated by the retry decorator; the method's fallback policy
//! applies to the final error only.

use std::sync::Arc;

use tracing::{Instrument, debug, info_span};
use url::Url;

use cirrus_core::{
    Args, Error, ErrorKind, ErrorMapper, FallbackValue, FilterChain, HttpClient, MethodSpec,
    RequestFactory, RequestFilter, ResponseParser, Result,
};

use crate::{ApiConfig, MethodRegistry, RetryExt};

/// Client for one API: a transport, an endpoint and a method registry.
///
/// The transport is shared; wrap the same [`HyperClient`](crate::HyperClient)
/// in several `ApiClient`s to reuse its connection pool.
///
/// # Example
///
/// ```no_run
/// use cirrus::{ApiClient, HyperClient, MethodRegistry};
/// use cirrus_core::{Args, Method, MethodSpec, ParamSpec, ParseJson};
///
/// # async fn run() -> cirrus_core::Result<()> {
/// let registry = MethodRegistry::new().with(
///     MethodSpec::builder("getServer", Method::Get, "/servers/{id}")
///         .param(ParamSpec::path("id"))
///         .build()?,
/// )?;
/// let api = ApiClient::new(HyperClient::new(), "https://compute.example.com/v2")?
///     .with_registry(registry);
///
/// let server: serde_json::Value = api
///     .invoke("getServer", &Args::new().with("id", "71"), &ParseJson::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient<C> {
    client: C,
    registry: Arc<MethodRegistry>,
    factory: RequestFactory,
    filters: FilterChain,
    mapper: ErrorMapper,
    config: ApiConfig,
}

impl<C> ApiClient<C> {
    /// Create a client for the API rooted at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn new(client: C, endpoint: impl AsRef<str>) -> Result<Self> {
        Ok(Self::with_url(client, Url::parse(endpoint.as_ref())?))
    }

    /// Create a client with a pre-parsed endpoint.
    #[must_use]
    pub fn with_url(client: C, endpoint: Url) -> Self {
        let config = ApiConfig::default();
        Self {
            client,
            registry: Arc::new(MethodRegistry::new()),
            factory: RequestFactory::new(endpoint).with_default_headers(config.default_headers.clone()),
            filters: FilterChain::new(),
            mapper: ErrorMapper::new(),
            config,
        }
    }

    /// Use `registry` for [`invoke`](Self::invoke) lookups.
    #[must_use]
    pub fn with_registry(mut self, registry: MethodRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Replace the API settings.
    #[must_use]
    pub fn with_config(mut self, config: ApiConfig) -> Self {
        self.factory = self
            .factory
            .with_default_headers(config.default_headers.clone());
        self.config = config;
        self
    }

    /// Replace the error mapper, e.g. to decode vendor error bodies.
    #[must_use]
    pub fn with_error_mapper(mut self, mapper: ErrorMapper) -> Self {
        self.mapper = mapper;
        self
    }

    /// Attach a filter to every request, ahead of the methods' own filters.
    #[must_use]
    pub fn with_filter(self, filter: impl RequestFilter + 'static) -> Self {
        self.with_shared_filter(Arc::new(filter))
    }

    /// Attach a shared filter to every request.
    #[must_use]
    pub fn with_shared_filter(mut self, filter: Arc<dyn RequestFilter>) -> Self {
        self.filters.push(filter);
        self.factory = self.factory.with_filters(self.filters.clone());
        self
    }

    /// The endpoint method paths are resolved against.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        self.factory.endpoint()
    }

    /// The API settings.
    #[must_use]
    pub const fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// The registered methods.
    #[must_use]
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Get a reference to the transport.
    #[must_use]
    pub const fn inner(&self) -> &C {
        &self.client
    }
}

impl<C: HttpClient> ApiClient<C> {
    /// Call the registered method `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for unknown methods, otherwise as
    /// [`call`](Self::call).
    pub async fn invoke<P>(&self, name: &str, args: &Args, parser: &P) -> Result<P::Output>
    where
        P: ResponseParser,
        P::Output: FallbackValue,
    {
        let spec = self.registry.get(name)?;
        self.call(&spec, args, parser).await
    }

    /// Call `spec` with `args`, parsing a successful response with `parser`.
    ///
    /// # Errors
    ///
    /// Returns the final attempt's error unless the method's fallback
    /// policy turns it into a value.
    pub async fn call<P>(&self, spec: &MethodSpec, args: &Args, parser: &P) -> Result<P::Output>
    where
        P: ResponseParser,
        P::Output: FallbackValue,
    {
        let span = info_span!("invoke", method = spec.name(), verb = spec.method().as_str());
        let retry = spec.retry().unwrap_or(&self.config.retry);

        let outcome = retry
            .decorate(move || async move {
                let result = self.attempt(spec, args, parser).await;
                if let Err(error) = &result
                    && error.kind() == ErrorKind::Authentication
                {
                    self.filters.notify_authentication_failure();
                    spec.filters().notify_authentication_failure();
                }
                result
            })
            .call()
            .instrument(span)
            .await;

        match outcome {
            Ok(value) => Ok(value),
            Err(error) => spec.fallback().recover(error),
        }
    }

    async fn attempt<P>(&self, spec: &MethodSpec, args: &Args, parser: &P) -> Result<P::Output>
    where
        P: ResponseParser,
    {
        let request = self.factory.create(spec, args)?;
        let filters = request.filters().clone();
        let request = filters.apply(request).await?;
        debug!(url = %request.url(), "sending");

        let exchange = self.client.execute(request.clone());
        let response = match spec.timeout() {
            Some(timeout) => tokio::time::timeout(timeout, exchange)
                .await
                .map_err(|_| Error::Timeout)??,
            None => exchange.await?,
        };

        if response.is_success() {
            parser.parse(response)
        } else {
            Err(self.mapper.map_error(&request, response, spec.fallback()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HyperClient;

    #[test]
    fn api_client_new() {
        let api = ApiClient::new(HyperClient::new(), "https://compute.example.com/v2")
            .expect("valid url");
        assert_eq!(api.endpoint().as_str(), "https://compute.example.com/v2");
        assert!(api.registry().is_empty());
    }

    #[test]
    fn api_client_invalid_url() {
        let result = ApiClient::new(HyperClient::new(), "not a url");
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
