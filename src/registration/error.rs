use crate::automation::AppiumError;
use crate::errors::RetryableError;
use crate::service::ActivationServiceError;
use crate::types::FullNumber;
use thiserror::Error;

/// Why a number could not be registered.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("UI driver error: {0}")]
    Driver(#[from] AppiumError),

    #[error("Telegram reports {number} as banned")]
    PhoneBanned { number: FullNumber },

    #[error("Next button not found on the phone screen")]
    NextButtonMissing,

    /// Telegram refused the number before asking for a code.
    #[error("Code input did not appear for {number}")]
    CodeInputMissing { number: FullNumber },

    #[error("No SMS code after {attempts} attempts")]
    CodeNotReceived { attempts: u32 },

    /// The account already exists and has two-step verification.
    #[error("{number} is protected by a cloud password")]
    PasswordProtected { number: FullNumber },

    #[error(transparent)]
    Service(#[from] ActivationServiceError),
}

impl RetryableError for RegistrationError {
    fn is_retryable(&self) -> bool {
        false
    }

    /// Whether another number is worth trying.
    fn should_retry_operation(&self) -> bool {
        match self {
            RegistrationError::Service(e) => e.should_retry_operation(),
            RegistrationError::Driver(_)
            | RegistrationError::PhoneBanned { .. }
            | RegistrationError::NextButtonMissing
            | RegistrationError::CodeInputMissing { .. }
            | RegistrationError::CodeNotReceived { .. }
            | RegistrationError::PasswordProtected { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ActivationId;

    #[test]
    fn test_number_level_failures_move_on() {
        let banned = RegistrationError::PhoneBanned {
            number: FullNumber::new("6281234567"),
        };
        assert!(banned.should_retry_operation());
        assert!(!banned.is_retryable());
    }

    #[test]
    fn test_account_level_failure_stops() {
        let err = RegistrationError::Service(ActivationServiceError::InsufficientBalance {
            balance: 0.5,
            min_price: 2.0,
        });
        assert!(!err.should_retry_operation());

        let cancelled = RegistrationError::Service(ActivationServiceError::ActivationCancelled {
            activation_id: ActivationId::from("1"),
        });
        assert!(cancelled.should_retry_operation());
    }
}
