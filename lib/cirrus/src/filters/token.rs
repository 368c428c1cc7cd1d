//! Session-token authentication.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cirrus_core::{BoxFuture, Credentials, CredentialsProvider, Request, RequestFilter, Result};

use crate::LoadingCache;

/// Default header carrying the session token.
pub const TOKEN_HEADER: &str = "X-Auth-Token";

/// Exchanges credentials for a session token.
///
/// Implementations usually call the vendor's authentication endpoint through
/// their own [`ApiClient`](crate::ApiClient).
pub trait Authenticator: Send + Sync + fmt::Debug {
    /// Authenticate and return the session token.
    fn authenticate<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<String>>;
}

type TokenLoader = Box<dyn Fn(String) -> BoxFuture<'static, Result<String>> + Send + Sync>;

/// Adds a cached session token to every request.
///
/// Tokens are cached per identity for the session interval. At most one
/// authentication call is in flight per identity; concurrent requests wait
/// for it. An authentication failure drops the cached tokens, so the retry
/// that follows authenticates again.
pub struct TokenAuthFilter<A> {
    credentials: Arc<dyn CredentialsProvider>,
    authenticator: Arc<A>,
    header: String,
    tokens: LoadingCache<String, String, TokenLoader>,
}

impl<A> fmt::Debug for TokenAuthFilter<A>
where
    A: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthFilter")
            .field("authenticator", &self.authenticator)
            .field("header", &self.header)
            .field("tokens", &self.tokens)
            .finish_non_exhaustive()
    }
}

impl<A: Authenticator + 'static> TokenAuthFilter<A> {
    /// Filter caching tokens for `session_interval`.
    pub fn new(
        credentials: Arc<dyn CredentialsProvider>,
        authenticator: A,
        session_interval: Duration,
    ) -> Self {
        let authenticator = Arc::new(authenticator);
        let loader: TokenLoader = {
            let credentials = Arc::clone(&credentials);
            let authenticator = Arc::clone(&authenticator);
            Box::new(move |identity: String| -> BoxFuture<'static, Result<String>> {
                let credentials = Arc::clone(&credentials);
                let authenticator = Arc::clone(&authenticator);
                Box::pin(async move {
                    let current = credentials.credentials()?;
                    tracing::debug!(%identity, "authenticating");
                    authenticator.authenticate(&current).await
                })
            })
        };

        Self {
            credentials,
            authenticator,
            header: TOKEN_HEADER.to_string(),
            tokens: LoadingCache::with_ttl(loader, session_interval),
        }
    }

    /// Send the token in `header` instead of [`TOKEN_HEADER`].
    #[must_use]
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Current token, authenticating if none is cached.
    ///
    /// # Errors
    ///
    /// Returns the credentials provider's or authenticator's error.
    pub async fn token(&self) -> Result<String> {
        let identity = self.credentials.credentials()?.identity().to_string();
        self.tokens.get(&identity).await
    }
}

impl<A: Authenticator + 'static> RequestFilter for TokenAuthFilter<A> {
    fn filter<'a>(&'a self, request: Request) -> BoxFuture<'a, Result<Request>> {
        Box::pin(async move {
            let token = self.token().await?;
            request
                .to_builder()
                .replace_header(self.header.clone(), token)
                .build()
        })
    }

    fn on_authentication_failure(&self) {
        self.tokens.invalidate_all();
    }
}
