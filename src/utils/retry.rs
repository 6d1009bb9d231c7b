//! Retry configuration for transient provider failures.

use backon::ExponentialBuilder;
use std::time::Duration;

/// Configuration for retrying provider requests that failed transiently
/// (connection reset, proxy timeout, `ERROR_SQL`).
///
/// Retries are off by default: the activation flow already polls on a fixed
/// interval, so only callers behind a flaky proxy usually want them.
///
/// ```rust
/// use tg_autoreg::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default()
///     .with_min_delay(Duration::from_millis(500))
///     .with_max_retries(3);
/// assert!(config.is_enabled());
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between retries (default: 1 second).
    pub min_delay: Duration,
    /// Maximum delay between retries (default: 15 seconds).
    pub max_delay: Duration,
    /// Exponential backoff factor (default: 2.0).
    pub factor: f32,
    /// Maximum number of retry attempts (default: 0).
    pub max_retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(15),
            factor: 2.0,
            max_retries: 0,
        }
    }
}

impl RetryConfig {
    /// Set the minimum delay between retries.
    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Set the exponential backoff factor.
    pub fn with_factor(mut self, factor: f32) -> Self {
        self.factor = factor;
        self
    }

    /// Set the maximum number of retry attempts.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Whether any retry will be attempted at all.
    pub fn is_enabled(&self) -> bool {
        self.max_retries > 0
    }

    /// Build a backoff strategy from this configuration.
    pub fn build_strategy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.factor)
            .with_max_times(self.max_retries)
    }
}
