//! Exchange logging middleware.
//!
//! Every exchange is logged inside an `http_exchange` span carrying the verb
//! and URL. Failed exchanges are logged with the same classification the
//! invocation pipeline uses: the [`ErrorKind`] of the status and, when an
//! [`ErrorDecoder`] is configured, the vendor error code. Credential headers
//! are never logged in clear.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{Instrument, Level, debug, info, span, warn};

use cirrus_core::{
    DefaultErrorDecoder, Error, ErrorDecoder, ErrorKind, Params, Request, Response, Result,
};

use crate::filters::TOKEN_HEADER;

const REDACTED: &str = "<redacted>";

const CREDENTIAL_HEADERS: [&str; 3] = ["Authorization", "Proxy-Authorization", TOKEN_HEADER];

/// Layer that logs every transport exchange.
#[derive(Debug, Clone)]
pub struct LoggingLayer {
    level: LogLevel,
    decoder: Arc<dyn ErrorDecoder>,
}

/// Detail of the exchange log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level, request headers included.
    Debug,
    /// Info level, summary only.
    #[default]
    Info,
}

impl Default for LoggingLayer {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            decoder: Arc::new(DefaultErrorDecoder),
        }
    }
}

impl LoggingLayer {
    /// Info-level logging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Debug-level logging.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
            ..Self::default()
        }
    }

    /// Read vendor error codes of failed exchanges with `decoder`.
    #[must_use]
    pub fn with_decoder(mut self, decoder: impl ErrorDecoder + 'static) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
            decoder: Arc::clone(&self.decoder),
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
    decoder: Arc<dyn ErrorDecoder>,
}

/// Classification of a failed exchange: status kind and vendor code.
fn classify(decoder: &dyn ErrorDecoder, response: &Response) -> (ErrorKind, Option<String>) {
    let status = response.status();
    let code = decoder
        .decode(status, response.body())
        .and_then(|vendor| vendor.code);
    (ErrorKind::from_status(status), code)
}

/// Header pairs with credential values masked.
fn loggable_headers(headers: &Params) -> Vec<(&str, &str)> {
    headers
        .iter()
        .map(|(name, value)| {
            let secret = CREDENTIAL_HEADERS
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(name));
            (name, if secret { REDACTED } else { value })
        })
        .collect()
}

impl<S> Service<Request> for Logging<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let span = span!(
            Level::INFO,
            "http_exchange",
            verb = request.method().as_str(),
            url = %request.url(),
        );
        match self.level {
            LogLevel::Debug => span.in_scope(|| {
                debug!(headers = ?loggable_headers(request.headers()), "sending request");
            }),
            LogLevel::Info => span.in_scope(|| info!("sending request")),
        }

        let decoder = Arc::clone(&self.decoder);
        let start = Instant::now();
        let exchange = self.inner.call(request);
        Box::pin(
            async move {
                let result = exchange.await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                match &result {
                    Ok(response) if response.is_success() => {
                        info!(status = response.status(), elapsed_ms, "exchange completed");
                    }
                    Ok(response) => {
                        let (kind, vendor_code) = classify(decoder.as_ref(), response);
                        warn!(
                            status = response.status(),
                            %kind,
                            vendor_code = vendor_code.as_deref(),
                            elapsed_ms,
                            "exchange returned an error status"
                        );
                    }
                    Err(err) => {
                        warn!(kind = %err.kind(), error = %err, elapsed_ms, "exchange failed");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}
