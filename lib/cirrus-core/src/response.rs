//! HTTP response handling.
//!
//! A [`Response`] is fully buffered by the transport: the connection is
//! released before the value exists, so parsers and the error mapper read
//! the body exactly once without owning any network resource.

use bytes::Bytes;

use crate::{Params, Result};

/// HTTP response with status, reason phrase, headers, and body.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    message: String,
    headers: Params,
    body: Bytes,
}

impl Response {
    /// Creates a new response with the canonical reason phrase for `status`.
    #[must_use]
    pub fn new(status: u16, headers: Params, body: impl Into<Bytes>) -> Self {
        let message = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            message,
            headers,
            body: body.into(),
        }
    }

    /// Status-only response with no headers and an empty body.
    #[must_use]
    pub fn status_only(status: u16) -> Self {
        Self::new(status, Params::headers(), Bytes::new())
    }

    /// Replace the reason phrase.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Reason phrase.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &Params {
        &self.headers
    }

    /// First value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume into body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (u16, Params, Bytes) {
        (self.status, self.headers, self.body)
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Deserialize the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns a parse error if deserialization fails.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        crate::from_json(&self.body)
    }

    /// Deserialize the response body as XML.
    ///
    /// # Errors
    ///
    /// Returns a parse error if deserialization fails.
    #[cfg(feature = "xml")]
    pub fn xml<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        crate::from_xml(&self.body)
    }

    /// Get the response body as text.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(|e| crate::Error::parse("", e.to_string()))
    }
}
