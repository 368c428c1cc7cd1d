//! HTTP request model.
//!
//! A [`Request`] is immutable once built. Mutations go through
//! [`Request::to_builder`], which copies every field into a fresh builder, so
//! the source request is never affected.
//!
//! # Example
//!
//! ```
//! use cirrus_core::{Method, Request};
//!
//! let request = Request::builder()
//!     .method(Method::Post)
//!     .endpoint("https://ec2.example.com/".parse().unwrap())
//!     .form_param("Action", "DescribeInstances")
//!     .build()
//!     .unwrap();
//!
//! let tagged = request
//!     .to_builder()
//!     .form_param("InstanceId.1", "i-1234")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.form_params().len(), 1);
//! assert_eq!(tagged.form_params().len(), 2);
//! ```

use bytes::Bytes;
use url::Url;

use crate::{ContentType, Error, FilterChain, Method, Params, Payload, RequestFilter, Result};

/// An HTTP request with method, endpoint, parameters, payload and filters.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    endpoint: Url,
    headers: Params,
    query: Params,
    form: Params,
    payload: Option<Payload>,
    filters: FilterChain,
}

impl Request {
    /// Creates a new, empty [`RequestBuilder`].
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Seeds a builder with a copy of this request.
    #[must_use]
    pub fn to_builder(&self) -> RequestBuilder {
        RequestBuilder {
            method: self.method,
            endpoint: Some(self.endpoint.clone()),
            headers: self.headers.clone(),
            query: self.query.clone(),
            form: self.form.clone(),
            payload: self.payload.clone(),
            filters: self.filters.clone(),
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Endpoint without the query parameters held in [`Request::query_params`].
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &Params {
        &self.headers
    }

    /// First value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Query parameters, in insertion order.
    #[must_use]
    pub const fn query_params(&self) -> &Params {
        &self.query
    }

    /// Form parameters, in insertion order.
    #[must_use]
    pub const fn form_params(&self) -> &Params {
        &self.form
    }

    /// Request payload.
    #[must_use]
    pub const fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    /// Filters to run before transmission.
    #[must_use]
    pub const fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// Full URL: the endpoint with the query parameters appended.
    #[must_use]
    pub fn url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in self.query.iter() {
                pairs.append_pair(name, value);
            }
        }
        url
    }

    /// Content type of the body that will be sent, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        match &self.payload {
            Some(payload) => payload.content_type(),
            None if !self.form.is_empty() => Some(ContentType::FormUrlEncoded.as_str()),
            None => None,
        }
    }

    /// Body bytes as they will be sent.
    ///
    /// The payload wins; without one, form parameters are URL-encoded.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload or the form parameters fail to encode.
    pub fn body_bytes(&self) -> Result<Option<Bytes>> {
        match &self.payload {
            Some(payload) => payload.to_bytes().map(Some),
            None if !self.form.is_empty() => crate::to_form(&self.form).map(Some),
            None => Ok(None),
        }
    }
}

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    endpoint: Option<Url>,
    headers: Params,
    query: Params,
    form: Params,
    payload: Option<Payload>,
    filters: FilterChain,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::default(),
            endpoint: None,
            headers: Params::headers(),
            query: Params::new(),
            form: Params::new(),
            payload: None,
            filters: FilterChain::new(),
        }
    }
}

impl RequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub const fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Appends a header, keeping existing values.
    #[must_use]
    pub fn add_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces every value of a header with one value.
    #[must_use]
    pub fn replace_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Removes a header.
    #[must_use]
    pub fn remove_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.append(name, value);
        self
    }

    /// Replaces all query parameters.
    #[must_use]
    pub fn replace_query_params(mut self, params: Params) -> Self {
        self.query = params;
        self
    }

    /// Appends a form parameter.
    #[must_use]
    pub fn form_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.append(name, value);
        self
    }

    /// Replaces all form parameters. Existing ones are dropped, not merged.
    #[must_use]
    pub fn replace_form_params(mut self, params: Params) -> Self {
        self.form = params;
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Sets a structured JSON payload.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: serde::Serialize>(self, value: &T) -> Result<Self> {
        Ok(self.payload(Payload::json(value)?))
    }

    /// Appends a filter.
    #[must_use]
    pub fn filter(mut self, filter: impl RequestFilter + 'static) -> Self {
        self.filters = self.filters.with(filter);
        self
    }

    /// Appends every filter of a chain.
    #[must_use]
    pub fn filters(mut self, filters: &FilterChain) -> Self {
        self.filters.extend_from(filters);
        self
    }

    /// Current form parameters, for binders that rewrite them.
    #[must_use]
    pub const fn current_form_params(&self) -> &Params {
        &self.form
    }

    /// Builds the [`Request`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if no endpoint was set.
    pub fn build(mut self) -> Result<Request> {
        let endpoint = self
            .endpoint
            .take()
            .ok_or_else(|| Error::configuration("request has no endpoint"))?;
        Ok(Request {
            method: self.method,
            endpoint,
            headers: self.headers,
            query: self.query,
            form: self.form,
            payload: self.payload,
            filters: self.filters,
        })
    }
}
