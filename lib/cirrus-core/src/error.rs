//! Error types for cirrus.
//!
//! Every failure in the pipeline is an [`Error`]. Policies never match on
//! variants directly; they match on [`Error::kind`], which folds HTTP
//! statuses, vendor error codes and local failures into one [`ErrorKind`].

use std::fmt;

use bytes::Bytes;
use derive_more::{Display, From};

use crate::Method;

// ============================================================================
// Error Kind
// ============================================================================

/// Classification used by fallback and retry policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum ErrorKind {
    /// Wiring or template error. Fatal and never retried.
    #[display("configuration")]
    Configuration,
    /// A binder was attached to the wrong call shape or received a null input.
    #[display("illegal state")]
    IllegalState,
    /// Malformed or unexpected response body.
    #[display("parse")]
    Parse,
    /// Request body could not be encoded.
    #[display("serialization")]
    Serialization,
    /// The vendor reported that the resource does not exist.
    #[display("resource not found")]
    ResourceNotFound,
    /// Credentials or token rejected.
    #[display("authentication")]
    Authentication,
    /// Throttling, temporary unavailability or eventual-consistency artifacts.
    #[display("transient service")]
    TransientService,
    /// The request did not complete in time.
    #[display("timeout")]
    Timeout,
    /// Connection or TLS failure before a response was received.
    #[display("transport")]
    Transport,
    /// Any other non-2xx response.
    #[display("http")]
    Http,
}

impl ErrorKind {
    /// Default classification of a non-2xx status code.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            404 | 410 => Self::ResourceNotFound,
            408 | 429 | 500 | 502 | 503 | 504 => Self::TransientService,
            _ => Self::Http,
        }
    }

    /// Returns `true` for kinds that may succeed when the call is repeated.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::TransientService | Self::Timeout | Self::Transport)
    }
}

// ============================================================================
// HTTP Error
// ============================================================================

/// A failed HTTP exchange, classified and carrying the vendor detail.
#[derive(Debug)]
pub struct HttpError {
    kind: ErrorKind,
    status: u16,
    message: String,
    method: Option<Method>,
    url: Option<String>,
    vendor_code: Option<String>,
    body: Option<Bytes>,
    cause: Option<Box<Error>>,
}

impl HttpError {
    /// Create an error for `status`, classified with [`ErrorKind::from_status`].
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::from_status(status),
            status,
            message: message.into(),
            method: None,
            url: None,
            vendor_code: None,
            body: None,
            cause: None,
        }
    }

    /// Override the classification.
    #[must_use]
    pub const fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Record the request that failed.
    #[must_use]
    pub fn with_request(mut self, method: Method, url: impl Into<String>) -> Self {
        self.method = Some(method);
        self.url = Some(url.into());
        self
    }

    /// Record the vendor error code extracted from the body.
    #[must_use]
    pub fn with_vendor_code(mut self, code: impl Into<String>) -> Self {
        self.vendor_code = Some(code.into());
        self
    }

    /// Keep the raw response body.
    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Chain an underlying error.
    #[must_use]
    pub fn with_cause(mut self, cause: Error) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Human readable message (vendor message when one was decoded).
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP method of the failed request.
    #[must_use]
    pub const fn method(&self) -> Option<Method> {
        self.method
    }

    /// URL of the failed request.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Vendor error code, e.g. `InvalidGroup.NotFound`.
    #[must_use]
    pub fn vendor_code(&self) -> Option<&str> {
        self.vendor_code.as_deref()
    }

    /// Raw response body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The chained cause, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_deref()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP error {} ({})", self.status, self.kind)?;
        if let (Some(method), Some(url)) = (self.method, &self.url) {
            write!(f, " on {method} {url}")?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(code) = &self.vendor_code {
            write!(f, " [{code}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for HttpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for cirrus operations.
#[derive(Debug, Display, From)]
pub enum Error {
    /// Wiring error: unresolved template variable, missing endpoint, bad policy.
    #[display("configuration error: {_0}")]
    #[from(skip)]
    Configuration(String),

    /// A binder received a call shape or input it does not support.
    #[display("illegal state: {_0}")]
    #[from(skip)]
    IllegalState(String),

    /// Non-2xx response.
    #[display("{_0}")]
    #[from(skip)]
    Http(Box<HttpError>),

    /// Response body did not match the declared format.
    #[display("parse error at '{path}': {message}")]
    #[from(skip)]
    Parse {
        /// Path to the offending field (empty for syntax errors).
        path: String,
        /// Error message.
        message: String,
    },

    /// JSON serialization error.
    #[display("JSON serialization error: {_0}")]
    #[from]
    JsonSerialization(serde_json::Error),

    /// Form URL-encoded serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    FormSerialization(serde_urlencoded::ser::Error),

    /// Other body serialization error.
    #[display("serialization error: {_0}")]
    #[from(skip)]
    Serialization(String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(String),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(err) => err.source(),
            Self::JsonSerialization(err) => Some(err),
            Self::FormSerialization(err) => Some(err),
            Self::InvalidUrl(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        Self::Http(Box::new(err))
    }
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an illegal state error.
    #[must_use]
    pub fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState(message.into())
    }

    /// Create an HTTP error classified from its status.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        HttpError::new(status, message).into()
    }

    /// Create a parse error with path context.
    #[must_use]
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Classification used by fallback and retry policies.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::InvalidUrl(_) => ErrorKind::Configuration,
            Self::IllegalState(_) => ErrorKind::IllegalState,
            Self::Http(err) => err.kind(),
            Self::Parse { .. } => ErrorKind::Parse,
            Self::JsonSerialization(_) | Self::FormSerialization(_) | Self::Serialization(_) => {
                ErrorKind::Serialization
            }
            Self::Timeout => ErrorKind::Timeout,
            Self::Connection(_) | Self::Tls(_) => ErrorKind::Transport,
        }
    }

    /// The HTTP error, if this is one.
    #[must_use]
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.as_http().map(HttpError::status)
    }

    /// Returns `true` if the resource was reported missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::ResourceNotFound
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns the response body if this is an HTTP error with a body.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.as_http().and_then(HttpError::body)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(ErrorKind::from_status(404), ErrorKind::ResourceNotFound);
        assert_eq!(ErrorKind::from_status(410), ErrorKind::ResourceNotFound);
        assert_eq!(ErrorKind::from_status(401), ErrorKind::Authentication);
        assert_eq!(ErrorKind::from_status(429), ErrorKind::TransientService);
        assert_eq!(ErrorKind::from_status(503), ErrorKind::TransientService);
        assert_eq!(ErrorKind::from_status(501), ErrorKind::Http);
        assert_eq!(ErrorKind::from_status(409), ErrorKind::Http);
    }

    #[test]
    fn transient_kinds() {
        assert!(ErrorKind::TransientService.is_transient());
        assert!(ErrorKind::Timeout.is_transient());
        assert!(ErrorKind::Transport.is_transient());
        assert!(!ErrorKind::Configuration.is_transient());
        assert!(!ErrorKind::ResourceNotFound.is_transient());
    }

    #[test]
    fn error_display() {
        let err = Error::configuration("no value for {serverId}");
        assert_eq!(
            err.to_string(),
            "configuration error: no value for {serverId}"
        );

        let err: Error = HttpError::new(404, "Not Found")
            .with_request(Method::Get, "https://api.example.com/servers/1")
            .with_vendor_code("itemNotFound")
            .into();
        assert_eq!(
            err.to_string(),
            "HTTP error 404 (resource not found) on GET https://api.example.com/servers/1: Not Found [itemNotFound]"
        );

        let err = Error::parse("servers[0].id", "invalid type");
        assert_eq!(
            err.to_string(),
            "parse error at 'servers[0].id': invalid type"
        );
    }

    #[test]
    fn local_failure_display() {
        let rendered = [
            Error::Timeout,
            Error::connection("connection refused"),
            Error::tls("invalid peer certificate"),
        ]
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");

        insta::assert_snapshot!(rendered, @r"
        request timeout
        connection error: connection refused
        TLS error: invalid peer certificate
        ");
    }

    #[test]
    fn error_kind_of_local_failures() {
        assert_eq!(Error::Timeout.kind(), ErrorKind::Timeout);
        assert_eq!(Error::connection("refused").kind(), ErrorKind::Transport);
        assert_eq!(Error::tls("bad cert").kind(), ErrorKind::Transport);
        assert_eq!(
            Error::illegal_state("wrong shape").kind(),
            ErrorKind::IllegalState
        );
        assert_eq!(
            Error::serialization("no root").kind(),
            ErrorKind::Serialization
        );
    }

    #[test]
    fn kind_override_wins_over_status() {
        let err: Error = HttpError::new(400, "bad group")
            .with_kind(ErrorKind::ResourceNotFound)
            .into();
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn cause_chain_is_inspectable() {
        let root = Error::http(401, "token expired");
        let err: Error = HttpError::new(401, "re-authentication failed")
            .with_cause(root)
            .into();

        let source = err.source().expect("cause");
        assert_eq!(source.to_string(), "HTTP error 401 (authentication): token expired");
        assert_eq!(
            err.as_http().and_then(HttpError::cause).map(Error::kind),
            Some(ErrorKind::Authentication)
        );
    }

    #[test]
    fn error_body() {
        let body = Bytes::from_static(br#"{"error":"missing"}"#);
        let err: Error = HttpError::new(404, "Not Found").with_body(body.clone()).into();
        assert_eq!(err.body(), Some(&body));
        assert!(Error::Timeout.body().is_none());
    }
}
