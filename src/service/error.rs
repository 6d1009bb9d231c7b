//! Service-level error types.

use super::config::ConfigError;
use crate::errors::RetryableError;
use crate::registry::RegistryError;
use crate::types::ActivationId;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// Service-level errors that wrap provider errors.
#[derive(Debug, Error)]
pub enum ActivationServiceError {
    /// Error from the underlying provider.
    #[error("SMS provider error: {source}")]
    Provider {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
        /// Whether the same request can be repeated.
        is_retryable: bool,
        /// Whether a fresh operation might succeed.
        should_retry_operation: bool,
    },

    /// Balance is below the cheapest acceptable number.
    #[error("Balance {balance} is below the minimum price {min_price}")]
    InsufficientBalance { balance: f64, min_price: f64 },

    /// No country passed the price and stock filter.
    #[error("No countries with numbers for {service} between {min_price} and {max_price}")]
    NoCountriesAvailable {
        service: String,
        min_price: f64,
        max_price: f64,
    },

    /// Every qualifying country was tried without getting a number.
    #[error("Failed to get a number after trying {attempted} countries")]
    CountriesExhausted { attempted: usize },

    /// Timeout waiting for the SMS code.
    #[error(
        "Timeout waiting for SMS code after {:.1}s (polled {} times); Activation id: {activation_id}",
        elapsed.as_secs_f64(),
        poll_count
    )]
    CodeTimeout {
        /// Configured timeout duration.
        timeout: Duration,
        /// Actual elapsed time.
        elapsed: Duration,
        /// Number of poll attempts made.
        poll_count: u32,
        /// The activation that timed out.
        activation_id: ActivationId,
    },

    /// The provider reported the activation as cancelled.
    #[error("Activation {activation_id} was cancelled by the provider")]
    ActivationCancelled { activation_id: ActivationId },

    /// Cancel refused: the activation is younger than the provider allows.
    #[error(
        "Activation {activation_id} is {:.0}s old, cancel allowed after {:.0}s",
        age.as_secs_f64(),
        min_age.as_secs_f64()
    )]
    CancelTooEarly {
        activation_id: ActivationId,
        age: Duration,
        min_age: Duration,
    },

    /// Cancel refused: the activation is not in the local registry.
    #[error("Activation {activation_id} is not tracked locally, refusing to cancel")]
    NotTracked { activation_id: ActivationId },

    /// Registry file could not be written.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Invalid service configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl ActivationServiceError {
    pub(crate) fn provider<E>(e: E) -> Self
    where
        E: StdError + RetryableError + Send + Sync + 'static,
    {
        let is_retryable = e.is_retryable();
        let should_retry_operation = e.should_retry_operation();
        ActivationServiceError::Provider {
            source: Box::new(e),
            is_retryable,
            should_retry_operation,
        }
    }
}

impl RetryableError for ActivationServiceError {
    fn is_retryable(&self) -> bool {
        match self {
            ActivationServiceError::Provider { is_retryable, .. } => *is_retryable,
            ActivationServiceError::InsufficientBalance { .. }
            | ActivationServiceError::NoCountriesAvailable { .. }
            | ActivationServiceError::CountriesExhausted { .. }
            | ActivationServiceError::CodeTimeout { .. }
            | ActivationServiceError::ActivationCancelled { .. }
            | ActivationServiceError::CancelTooEarly { .. }
            | ActivationServiceError::NotTracked { .. }
            | ActivationServiceError::Registry(_)
            | ActivationServiceError::InvalidConfig(_) => false,
        }
    }

    fn should_retry_operation(&self) -> bool {
        match self {
            ActivationServiceError::Provider {
                should_retry_operation,
                ..
            } => *should_retry_operation,
            ActivationServiceError::CodeTimeout { .. } => true,
            ActivationServiceError::ActivationCancelled { .. } => true,
            ActivationServiceError::CancelTooEarly { .. } => true,
            ActivationServiceError::InsufficientBalance { .. }
            | ActivationServiceError::NoCountriesAvailable { .. }
            | ActivationServiceError::CountriesExhausted { .. }
            | ActivationServiceError::NotTracked { .. }
            | ActivationServiceError::Registry(_)
            | ActivationServiceError::InvalidConfig(_) => false,
        }
    }
}
