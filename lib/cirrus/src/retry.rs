//! Retry/backoff decorator.
//!
//! [`RetryExt::decorate`] wraps a fallible async operation so that it is
//! repeated according to a [`RetryPolicy`]. The decorated operation has the
//! same output as the original; when attempts run out the last error is
//! returned unchanged, so callers can still match on its kind.

use std::future::Future;

use cirrus_core::{Error, Result, RetryPolicy};
use tracing::warn;

/// Extension trait turning a [`RetryPolicy`] into a decorator.
///
/// # Example
///
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use cirrus::RetryExt;
/// use cirrus_core::{Backoff, Error, RetryPolicy};
///
/// # tokio_test_block_on(async {
/// let calls = AtomicU32::new(0);
/// let policy = RetryPolicy::builder().backoff(Backoff::none()).build();
/// let op = policy.decorate(|| async {
///     if calls.fetch_add(1, Ordering::SeqCst) < 2 {
///         Err(Error::Timeout)
///     } else {
///         Ok("ready")
///     }
/// });
///
/// assert_eq!(op.call().await.unwrap(), "ready");
/// assert_eq!(calls.load(Ordering::SeqCst), 3);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap().block_on(f)
/// # }
/// ```
pub trait RetryExt {
    /// Wrap `operation`; every call of the result runs it at least once.
    fn decorate<F, Fut, T>(&self, operation: F) -> Retrying<F>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>;
}

impl RetryExt for RetryPolicy {
    fn decorate<F, Fut, T>(&self, operation: F) -> Retrying<F>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        Retrying {
            policy: self.clone(),
            operation,
            on_retry: ignore_retry,
        }
    }
}

fn ignore_retry(_attempt: u32, _error: &Error) {}

/// A decorated operation, see [`RetryExt`].
#[derive(Debug, Clone)]
pub struct Retrying<F, H = fn(u32, &Error)> {
    policy: RetryPolicy,
    operation: F,
    on_retry: H,
}

impl<F, H> Retrying<F, H> {
    /// Run `hook` with the attempt number and error before every retry,
    /// after the decision to retry and before sleeping.
    #[must_use]
    pub fn on_retry<H2>(self, hook: H2) -> Retrying<F, H2>
    where
        H2: Fn(u32, &Error),
    {
        Retrying {
            policy: self.policy,
            operation: self.operation,
            on_retry: hook,
        }
    }

    /// The policy driving this decorator.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<F, Fut, T, H> Retrying<F, H>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
    H: Fn(u32, &Error),
{
    /// Run the operation until it succeeds, fails with a non-retryable
    /// error, or the policy's attempts are used up.
    pub async fn call(&self) -> Result<T> {
        let mut attempt = 1;
        loop {
            let error = match (self.operation)().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            let Some(delay) = self.policy.next_delay(attempt, &error) else {
                return Err(error);
            };

            warn!(
                attempt,
                max_attempts = self.policy.max_attempts(),
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                kind = ?error.kind(),
                error = %error,
                "retrying"
            );
            (self.on_retry)(attempt, &error);
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
