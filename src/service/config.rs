//! Service configuration types.

use std::time::Duration;
use thiserror::Error;

/// Cheapest price a country may have to be considered, and the balance floor.
pub const MIN_PRICE_FILTER: f64 = 2.0;

/// Default price ceiling per number.
pub const DEFAULT_MAX_PRICE: f64 = 100.0;

/// Rejected configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("code timeout must be greater than zero")]
    ZeroTimeout,

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error(
        "poll interval {:.1}s must be shorter than the code timeout {:.1}s",
        poll_interval.as_secs_f64(),
        timeout.as_secs_f64()
    )]
    PollIntervalTooLong {
        poll_interval: Duration,
        timeout: Duration,
    },

    #[error("min price {min_price} is above max price {max_price}")]
    PriceRange { min_price: f64, max_price: f64 },
}

/// Configuration for the activation service.
///
/// Controls the code wait loop, the cancellation age gate and the country
/// price filter.
#[derive(Debug, Clone)]
pub struct ActivationServiceConfig {
    /// Maximum time to wait for the SMS code before cancelling.
    pub code_timeout: Duration,
    /// Interval between status polls.
    pub poll_interval: Duration,
    /// Minimum activation age the provider requires before a cancel.
    pub min_cancel_age: Duration,
    /// Countries cheaper than this are skipped; also the balance floor.
    pub min_price: f64,
    /// Countries more expensive than this are skipped.
    pub max_price: f64,
    /// Pause between number requests to consecutive countries.
    pub country_delay: Duration,
}

impl Default for ActivationServiceConfig {
    fn default() -> Self {
        ActivationServiceConfigBuilder::default().build()
    }
}

impl ActivationServiceConfig {
    /// Create a new builder for ActivationServiceConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tg_autoreg::ActivationServiceConfig;
    /// use std::time::Duration;
    ///
    /// let config = ActivationServiceConfig::builder()
    ///     .code_timeout(Duration::from_secs(180))
    ///     .max_price(40.0)
    ///     .build();
    ///
    /// assert_eq!(config.code_timeout, Duration::from_secs(180));
    /// assert_eq!(config.poll_interval, Duration::from_secs(5));
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn builder() -> ActivationServiceConfigBuilder {
        ActivationServiceConfigBuilder::default()
    }

    pub fn with_code_timeout(mut self, timeout: Duration) -> Self {
        self.code_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_price(mut self, max_price: f64) -> Self {
        self.max_price = max_price;
        self
    }

    /// Check the values for consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.code_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.poll_interval >= self.code_timeout {
            return Err(ConfigError::PollIntervalTooLong {
                poll_interval: self.poll_interval,
                timeout: self.code_timeout,
            });
        }
        if self.min_price > self.max_price {
            return Err(ConfigError::PriceRange {
                min_price: self.min_price,
                max_price: self.max_price,
            });
        }
        Ok(())
    }
}

/// Builder for ActivationServiceConfig.
#[derive(Debug, Clone)]
pub struct ActivationServiceConfigBuilder {
    pub(crate) code_timeout: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) min_cancel_age: Duration,
    pub(crate) min_price: f64,
    pub(crate) max_price: f64,
    pub(crate) country_delay: Duration,
}

impl Default for ActivationServiceConfigBuilder {
    fn default() -> Self {
        Self {
            code_timeout: Duration::from_secs(90),
            poll_interval: Duration::from_secs(5),
            min_cancel_age: Duration::from_secs(120),
            min_price: MIN_PRICE_FILTER,
            max_price: DEFAULT_MAX_PRICE,
            country_delay: Duration::from_secs(1),
        }
    }
}

impl ActivationServiceConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the timeout for waiting for the SMS code.
    ///
    /// Default: 90 seconds
    pub fn code_timeout(mut self, timeout: Duration) -> Self {
        self.code_timeout = timeout;
        self
    }

    /// Set the status polling interval.
    ///
    /// Default: 5 seconds
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Default: 120 seconds
    pub fn min_cancel_age(mut self, age: Duration) -> Self {
        self.min_cancel_age = age;
        self
    }

    /// Default: 2.0
    pub fn min_price(mut self, price: f64) -> Self {
        self.min_price = price;
        self
    }

    /// Default: 100.0
    pub fn max_price(mut self, price: f64) -> Self {
        self.max_price = price;
        self
    }

    /// Default: 1 second
    pub fn country_delay(mut self, delay: Duration) -> Self {
        self.country_delay = delay;
        self
    }

    /// Build the ActivationServiceConfig.
    pub fn build(self) -> ActivationServiceConfig {
        ActivationServiceConfig {
            code_timeout: self.code_timeout,
            poll_interval: self.poll_interval,
            min_cancel_age: self.min_cancel_age,
            min_price: self.min_price,
            max_price: self.max_price,
            country_delay: self.country_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_default() {
        let config = ActivationServiceConfig::default();
        assert_eq!(config.code_timeout, Duration::from_secs(90));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.min_cancel_age, Duration::from_secs(120));
        assert_eq!(config.min_price, 2.0);
        assert_eq!(config.max_price, 100.0);
        assert_eq!(config.country_delay, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ActivationServiceConfig::builder()
            .code_timeout(Duration::from_secs(180))
            .poll_interval(Duration::from_secs(2))
            .country_delay(Duration::ZERO)
            .build();

        assert_eq!(config.code_timeout, Duration::from_secs(180));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.country_delay, Duration::ZERO);
    }

    #[test]
    fn test_config_with_methods() {
        let config = ActivationServiceConfig::default()
            .with_code_timeout(Duration::from_secs(60))
            .with_poll_interval(Duration::from_secs(1))
            .with_max_price(30.0);

        assert_eq!(config.code_timeout, Duration::from_secs(60));
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.max_price, 30.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero = ActivationServiceConfig::default().with_code_timeout(Duration::ZERO);
        assert_eq!(zero.validate(), Err(ConfigError::ZeroTimeout));

        let no_poll = ActivationServiceConfig::default().with_poll_interval(Duration::ZERO);
        assert_eq!(no_poll.validate(), Err(ConfigError::ZeroPollInterval));

        let slow_poll = ActivationServiceConfig::default()
            .with_code_timeout(Duration::from_secs(5))
            .with_poll_interval(Duration::from_secs(5));
        assert!(matches!(
            slow_poll.validate(),
            Err(ConfigError::PollIntervalTooLong { .. })
        ));

        let prices = ActivationServiceConfig::default().with_max_price(1.0);
        assert!(matches!(
            prices.validate(),
            Err(ConfigError::PriceRange { .. })
        ));
    }
}
