//! HMAC request signing.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use cirrus_core::{
    BoxFuture, Clock, CredentialsProvider, DateFormat, Error, Request, RequestFilter, Result,
    SystemClock, format_date,
};
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the signed timestamp.
pub const DATE_HEADER: &str = "X-Cirrus-Date";

/// Scheme name in the `Authorization` header.
pub const AUTH_SCHEME: &str = "CIRRUS";

/// RFC 3986 unreserved characters stay as they are.
const QUERY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Signs every request with HMAC-SHA256 over a canonical string.
///
/// The canonical string is, one item per line: the method, the URL path,
/// the query sorted by name then value, the content type, the base64
/// SHA-256 of the body, and the signing timestamp. The timestamp is the
/// clock's time truncated to the quantum, so signing an unchanged request
/// twice inside one quantum yields the same headers.
///
/// Writes [`DATE_HEADER`] and `Authorization: CIRRUS identity:signature`,
/// replacing earlier values.
#[derive(Debug, Clone)]
pub struct SigningFilter {
    credentials: Arc<dyn CredentialsProvider>,
    clock: Arc<dyn Clock>,
    quantum: Duration,
}

impl SigningFilter {
    /// Start configuring a filter.
    #[must_use]
    pub fn builder() -> SigningFilterBuilder {
        SigningFilterBuilder::default()
    }

    /// Truncation step of signing timestamps.
    #[must_use]
    pub const fn quantum(&self) -> Duration {
        self.quantum
    }

    /// Sign `request`, returning it with the signature headers set.
    ///
    /// # Errors
    ///
    /// Returns the credentials provider's error, or an encoding error of the
    /// body.
    pub fn sign(&self, request: Request) -> Result<Request> {
        let credentials = self.credentials.credentials()?;
        let date = format_date(&self.timestamp()?, DateFormat::Rfc1123);
        let canonical = canonical_string(&request, &date)?;

        let mut mac = HmacSha256::new_from_slice(credentials.secret().as_bytes())
            .map_err(|e| Error::configuration(format!("unusable signing key: {e}")))?;
        mac.update(canonical.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        tracing::trace!(identity = credentials.identity(), %date, "signed request");
        request
            .to_builder()
            .replace_header(DATE_HEADER, date)
            .replace_header(
                http::header::AUTHORIZATION.as_str(),
                format!("{AUTH_SCHEME} {}:{signature}", credentials.identity()),
            )
            .build()
    }

    fn timestamp(&self) -> Result<DateTime<Utc>> {
        let now = self.clock.now().timestamp_millis();
        let step = i64::try_from(self.quantum.as_millis()).unwrap_or(i64::MAX).max(1);
        DateTime::from_timestamp_millis(now - now.rem_euclid(step))
            .ok_or_else(|| Error::illegal_state("clock is out of range"))
    }
}

impl RequestFilter for SigningFilter {
    fn filter<'a>(&'a self, request: Request) -> BoxFuture<'a, Result<Request>> {
        Box::pin(async move { self.sign(request) })
    }
}

/// The string the signature is computed over.
///
/// # Errors
///
/// Returns an error if the body cannot be encoded.
pub fn canonical_string(request: &Request, date: &str) -> Result<String> {
    let mut query: Vec<(&str, &str)> = request.query_params().iter().collect();
    query.sort_unstable();
    let query = query
        .into_iter()
        .map(|(name, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(name, QUERY),
                utf8_percent_encode(value, QUERY)
            )
        })
        .collect::<Vec<_>>()
        .join("&");

    let body = request.body_bytes()?.unwrap_or_default();
    let digest = STANDARD.encode(Sha256::digest(&body));

    Ok([
        request.method().as_str(),
        request.endpoint().path(),
        query.as_str(),
        request.content_type().unwrap_or_default(),
        digest.as_str(),
        date,
    ]
    .join("\n"))
}

/// Builder for [`SigningFilter`].
#[derive(Debug, Default)]
pub struct SigningFilterBuilder {
    credentials: Option<Arc<dyn CredentialsProvider>>,
    clock: Option<Arc<dyn Clock>>,
    quantum: Option<Duration>,
}

impl SigningFilterBuilder {
    /// Where the identity and secret come from. Required.
    #[must_use]
    pub fn credentials(mut self, provider: impl CredentialsProvider + 'static) -> Self {
        self.credentials = Some(Arc::new(provider));
        self
    }

    /// Shared credentials provider. Required unless
    /// [`credentials`](Self::credentials) is set.
    #[must_use]
    pub fn shared_credentials(mut self, provider: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Time source. Defaults to [`SystemClock`].
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Timestamp truncation step. Defaults to one second.
    #[must_use]
    pub const fn quantum(mut self, quantum: Duration) -> Self {
        self.quantum = Some(quantum);
        self
    }

    /// Finish the filter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when no credentials provider was set.
    pub fn build(self) -> Result<SigningFilter> {
        let credentials = self
            .credentials
            .ok_or_else(|| Error::configuration("signing filter needs a credentials provider"))?;
        Ok(SigningFilter {
            credentials,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            quantum: self.quantum.unwrap_or(Duration::from_secs(1)),
        })
    }
}
