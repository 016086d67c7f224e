use crate::metrics_defs::{APPEND_ATTEMPTS, APPEND_RETRIES};
use rand::Rng;
use sheets::SheetsError;
use shared::counter;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Errors that can tell whether the remote side asked us to slow down.
pub trait RateLimited {
    fn is_rate_limited(&self) -> bool;
}

impl RateLimited for SheetsError {
    fn is_rate_limited(&self) -> bool {
        SheetsError::is_rate_limited(self)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 4,
            base_delay: Duration::from_millis(1000),
            max_jitter: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        RetryPolicy {
            max_retries,
            ..Default::default()
        }
    }

    /// `base_delay * 2^attempt`, with `attempt` counted from zero.
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Nominal delay plus a random jitter in `[0, max_jitter)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        self.nominal_delay(attempt).saturating_add(self.jitter())
    }

    fn jitter(&self) -> Duration {
        let max_ms = whole_millis(self.max_jitter);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max_ms))
    }
}

fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Runs `operation` until it succeeds, fails with an error that is not a
/// rate limit, or has been retried `policy.max_retries` times.
///
/// At most `max_retries + 1` calls are made. The last error is returned
/// unchanged.
pub async fn retry_with_backoff<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RateLimited + Display,
{
    let mut attempt = 0;

    loop {
        counter!(APPEND_ATTEMPTS).increment(1);

        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !error.is_rate_limited() || attempt >= policy.max_retries {
            return Err(error);
        }

        let delay = policy.delay(attempt);
        tracing::warn!(
            attempt = attempt + 1,
            max_retries = policy.max_retries,
            delay_ms = whole_millis(delay),
            error = %error,
            "Rate limited, backing off"
        );
        counter!(APPEND_RETRIES).increment(1);

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
