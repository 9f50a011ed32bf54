//! Retry policies.
//!
//! Two strategies exist. External API calls retry with a fixed delay and only
//! on errors that classify themselves as retryable. Subscription processing
//! retries any failure with exponential backoff.
//!
//! In both, `max_attempts` counts retries after the initial attempt. The
//! wrapped operation must be safe to invoke more than once.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backon::{ConstantBuilder, ExponentialBuilder, Retryable as _};
use tracing::{debug, warn};

/// Errors that know whether repeating the failed operation can help.
pub trait Retryable {
    /// Returns true when the operation may succeed if attempted again.
    fn is_retryable(&self) -> bool;
}

fn max_times(max_attempts: u32) -> usize {
    usize::try_from(max_attempts).unwrap_or(usize::MAX)
}

/// Fixed-delay retry settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelayConfig {
    /// Retries after the initial attempt.
    pub max_attempts: u32,
    /// Sleep between attempts.
    pub delay: Duration,
}

impl Default for FixedDelayConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

impl FixedDelayConfig {
    /// Backoff strategy for these settings.
    #[must_use]
    pub fn strategy(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(self.delay)
            .with_max_times(max_times(self.max_attempts))
    }
}

/// Exponential backoff settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialBackoffConfig {
    /// Retries after the initial attempt.
    pub max_attempts: u32,
    /// Sleep before the first retry.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub factor: f64,
    /// Upper bound for any single sleep.
    pub max_delay: Duration,
}

impl Default for ExponentialBackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            factor: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ExponentialBackoffConfig {
    /// Backoff strategy for these settings, without jitter.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn strategy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_factor(self.factor as f32)
            .with_max_delay(self.max_delay)
            .with_max_times(max_times(self.max_attempts))
    }
}

/// Runs `operation`, retrying retryable failures after a constant delay.
///
/// # Errors
///
/// Returns the first non-retryable error, or the last error once
/// `max_attempts` retries are exhausted.
pub async fn retry_with_fixed_delay<T, E, F, Fut>(
    config: &FixedDelayConfig,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    operation
        .retry(config.strategy())
        .when(|err: &E| err.is_retryable())
        .notify(|err: &E, delay: Duration| {
            warn!(delay_ms = delay.as_millis(), error = %err, "retryable failure, retrying after fixed delay");
        })
        .await
        .inspect_err(|err| debug!(error = %err, "giving up"))
}

/// Runs `operation`, retrying every failure with exponentially growing delays.
///
/// # Errors
///
/// Returns the last error once `max_attempts` retries are exhausted.
pub async fn retry_with_exponential_backoff<T, E, F, Fut>(
    config: &ExponentialBackoffConfig,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    operation
        .retry(config.strategy())
        .notify(|err: &E, delay: Duration| {
            warn!(delay_ms = delay.as_millis(), error = %err, "failure, backing off");
        })
        .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use backon::BackoffBuilder;

    use super::*;
    use crate::error::ClientError;

    fn fast_fixed(max_attempts: u32) -> FixedDelayConfig {
        FixedDelayConfig {
            max_attempts,
            delay: Duration::from_millis(1),
        }
    }

    fn http(status: u16) -> ClientError {
        ClientError::Http {
            status,
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_fixed_delay_retries_server_errors_until_exhausted() {
        // Arrange
        let calls = AtomicU32::new(0);

        // Act
        let result: Result<(), ClientError> = retry_with_fixed_delay(&fast_fixed(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(http(500)) }
        })
        .await;

        // Assert
        assert_eq!(result, Err(http(500)));
        assert_eq!(calls.load(Ordering::SeqCst), 4, "initial attempt plus three retries");
    }

    #[tokio::test]
    async fn test_fixed_delay_does_not_retry_not_found() {
        // Arrange
        let calls = AtomicU32::new(0);

        // Act
        let result: Result<(), ClientError> = retry_with_fixed_delay(&fast_fixed(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(http(404)) }
        })
        .await;

        // Assert
        assert_eq!(result, Err(http(404)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fixed_delay_returns_first_success() {
        // Arrange
        let calls = AtomicU32::new(0);

        // Act
        let result = retry_with_fixed_delay(&fast_fixed(3), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(http(429))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        // Assert
        assert_eq!(result, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exponential_backoff_retries_any_error() {
        // Arrange
        let config = ExponentialBackoffConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            factor: 2.0,
            max_delay: Duration::from_millis(4),
        };
        let calls = AtomicU32::new(0);

        // Act
        let result: Result<(), String> = retry_with_exponential_backoff(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err("validation failed".to_owned()) }
        })
        .await;

        // Assert
        assert_eq!(result, Err("validation failed".to_owned()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_delay_grows_by_factor_and_is_capped() {
        let config = ExponentialBackoffConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            factor: 2.0,
            max_delay: Duration::from_millis(500),
        };

        let delays: Vec<u128> = config
            .strategy()
            .build()
            .map(|delay| delay.as_millis())
            .collect();

        assert_eq!(delays, vec![100, 200, 400, 500, 500]);
    }

    #[test]
    fn test_fixed_delay_strategy_yields_one_delay_per_retry() {
        let delays: Vec<Duration> = fast_fixed(3).strategy().build().collect();

        assert_eq!(delays, vec![Duration::from_millis(1); 3]);
    }
}
