//! Retry policy: which failures to repeat, how often, and how long to wait.
//!
//! The policy is plain data and decisions. The async decorator that sleeps
//! between attempts lives in the `cirrus` runtime crate.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::{Error, ErrorKind};

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    factor: u32,
    max: Duration,
}

impl Backoff {
    /// `base * factor^(n-1)` after the n-th failed attempt, capped at `max`.
    #[must_use]
    pub const fn exponential(base: Duration, factor: u32, max: Duration) -> Self {
        Self { base, factor, max }
    }

    /// The same delay after every attempt.
    #[must_use]
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            base: delay,
            factor: 1,
            max: delay,
        }
    }

    /// Retry immediately.
    #[must_use]
    pub const fn none() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// Delay after the `attempt`-th failure (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let multiplier = self.factor.saturating_pow(exponent);
        self.base.saturating_mul(multiplier).min(self.max)
    }
}

impl Default for Backoff {
    /// 50ms, doubling, capped at 5s.
    fn default() -> Self {
        Self::exponential(Duration::from_millis(50), 2, Duration::from_secs(5))
    }
}

/// Bounded, backoff-governed re-execution rule.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use cirrus_core::{Backoff, ErrorKind, RetryPolicy};
///
/// let policy = RetryPolicy::builder()
///     .max_attempts(3)
///     .retry_on(ErrorKind::Authentication)
///     .backoff(Backoff::fixed(Duration::from_millis(10)))
///     .build();
///
/// assert_eq!(policy.max_attempts(), 3);
/// assert!(policy.is_retryable(ErrorKind::Authentication));
/// assert!(policy.is_retryable(ErrorKind::TransientService));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    retryable: BTreeSet<ErrorKind>,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicyBuilder::default().build()
    }
}

impl RetryPolicy {
    /// Builder seeded with the defaults: 5 attempts, exponential backoff,
    /// retrying transient service errors, timeouts and transport failures.
    #[must_use]
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// A single attempt.
    #[must_use]
    pub fn never() -> Self {
        Self::builder().max_attempts(1).build()
    }

    /// Total attempts, including the first.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay schedule.
    #[must_use]
    pub const fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Returns `true` if errors of `kind` are repeated.
    #[must_use]
    pub fn is_retryable(&self, kind: ErrorKind) -> bool {
        self.retryable.contains(&kind)
    }

    /// Delay before the next attempt, or `None` when `error` after
    /// `attempt` (1-based) is final.
    #[must_use]
    pub fn next_delay(&self, attempt: u32, error: &Error) -> Option<Duration> {
        (attempt < self.max_attempts && self.is_retryable(error.kind()))
            .then(|| self.backoff.delay(attempt))
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_attempts: u32,
    retryable: BTreeSet<ErrorKind>,
    backoff: Backoff,
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retryable: [
                ErrorKind::TransientService,
                ErrorKind::Timeout,
                ErrorKind::Transport,
            ]
            .into_iter()
            .collect(),
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicyBuilder {
    /// Total attempts. Values below 1 are raised to 1.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Also retry errors of `kind`.
    #[must_use]
    pub fn retry_on(mut self, kind: ErrorKind) -> Self {
        self.retryable.insert(kind);
        self
    }

    /// Replace the retryable kinds.
    #[must_use]
    pub fn retryable_kinds(mut self, kinds: impl IntoIterator<Item = ErrorKind>) -> Self {
        self.retryable = kinds.into_iter().collect();
        self
    }

    /// Delay schedule between attempts.
    #[must_use]
    pub const fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Finish the policy.
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            retryable: self.retryable,
            backoff: self.backoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_is_capped() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(1), Duration::from_millis(50));
        assert_eq!(backoff.delay(2), Duration::from_millis(100));
        assert_eq!(backoff.delay(4), Duration::from_millis(400));
        assert_eq!(backoff.delay(20), Duration::from_secs(5));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(5));
    }

    #[test]
    fn fixed_and_none() {
        assert_eq!(Backoff::fixed(Duration::from_millis(7)).delay(9), Duration::from_millis(7));
        assert_eq!(Backoff::none().delay(3), Duration::ZERO);
    }

    #[test]
    fn defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 5);
        assert!(policy.is_retryable(ErrorKind::TransientService));
        assert!(policy.is_retryable(ErrorKind::Timeout));
        assert!(policy.is_retryable(ErrorKind::Transport));
        assert!(!policy.is_retryable(ErrorKind::Configuration));
        assert!(!policy.is_retryable(ErrorKind::Authentication));
        assert!(!policy.is_retryable(ErrorKind::Parse));
    }

    #[test]
    fn next_delay_stops_at_max_attempts() {
        let policy = RetryPolicy::builder().max_attempts(3).build();
        let transient = Error::http(503, "Service Unavailable");

        assert_eq!(policy.next_delay(1, &transient), Some(Duration::from_millis(50)));
        assert_eq!(policy.next_delay(2, &transient), Some(Duration::from_millis(100)));
        assert_eq!(policy.next_delay(3, &transient), None);
    }

    #[test]
    fn non_retryable_is_final() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.next_delay(1, &Error::configuration("bad template")), None);
        assert_eq!(policy.next_delay(1, &Error::http(404, "Not Found")), None);
    }

    #[test]
    fn max_attempts_at_least_one() {
        assert_eq!(RetryPolicy::builder().max_attempts(0).build().max_attempts(), 1);
        assert_eq!(RetryPolicy::never().max_attempts(), 1);
    }
}
