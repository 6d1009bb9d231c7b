//! Error types for SMS Activate provider.

use super::types::InvalidStatusCode;
use crate::errors::RetryableError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::warn;

/// Error codes returned by SMS Activate service API as plain text.
#[derive(Debug, Clone, PartialEq)]
pub enum SmsActivateErrorCode {
    // === Transient / per-country errors ===
    /// No numbers available for the requested country/service.
    NoNumbers,
    /// Internal SQL error on service side.
    ErrorSql,
    /// Account blocked by channel limits (temporary).
    ChannelsLimit,

    // === Account / request errors ===
    /// Not enough money on the account.
    NoBalance,
    /// Activation with this id does not exist.
    NoActivation,
    /// Invalid API key.
    BadKey,
    /// Incorrect action.
    BadAction,
    /// Incorrect service code.
    BadService,
    /// Account banned until specified datetime.
    Banned { until: String },
    /// Maximum price is less than allowed minimum.
    WrongMaxPrice { min: Option<f64> },
    /// Not allowed to cancel within first 2 minutes.
    EarlyCancelDenied,
    /// Incorrect status.
    BadStatus,
    /// Invalid activation ID or ID is not a number.
    WrongActivationId,

    /// Unknown error code from service.
    Unknown { raw: String },
}

impl SmsActivateErrorCode {
    /// Returns the API error code string representation.
    pub fn code_name(&self) -> &str {
        match self {
            Self::NoNumbers => "NO_NUMBERS",
            Self::ErrorSql => "ERROR_SQL",
            Self::ChannelsLimit => "CHANNELS_LIMIT",
            Self::NoBalance => "NO_BALANCE",
            Self::NoActivation => "NO_ACTIVATION",
            Self::BadKey => "BAD_KEY",
            Self::BadAction => "BAD_ACTION",
            Self::BadService => "BAD_SERVICE",
            Self::Banned { .. } => "BANNED",
            Self::WrongMaxPrice { .. } => "WRONG_MAX_PRICE",
            Self::EarlyCancelDenied => "EARLY_CANCEL_DENIED",
            Self::BadStatus => "BAD_STATUS",
            Self::WrongActivationId => "WRONG_ACTIVATION_ID",
            Self::Unknown { raw } => raw.as_str(),
        }
    }

    /// Returns human-readable description.
    pub fn description(&self) -> String {
        match self {
            Self::NoNumbers => "No numbers available".to_string(),
            Self::ErrorSql => "Internal SQL error on service side".to_string(),
            Self::ChannelsLimit => "Account blocked by channel limits".to_string(),
            Self::NoBalance => "Insufficient account balance".to_string(),
            Self::NoActivation => "Activation does not exist".to_string(),
            Self::BadKey => "Invalid API key".to_string(),
            Self::BadAction => "Incorrect action".to_string(),
            Self::BadService => "Incorrect service code".to_string(),
            Self::Banned { until } => format!("Account banned until {}", until),
            Self::WrongMaxPrice { min } => match min {
                Some(v) => format!("Maximum price is less than allowed minimum: {}", v),
                None => "Maximum price is less than allowed minimum".to_string(),
            },
            Self::EarlyCancelDenied => "Not allowed to cancel within first 2 minutes".to_string(),
            Self::BadStatus => "Incorrect status".to_string(),
            Self::WrongActivationId => "Invalid activation ID".to_string(),
            Self::Unknown { raw } => format!("Unknown error: {}", raw),
        }
    }

    /// Parse error code from raw API response.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let s = raw.trim();

        let code = match s {
            "NO_NUMBERS" => Self::NoNumbers,
            "ERROR_SQL" => Self::ErrorSql,
            "CHANNELS_LIMIT" => Self::ChannelsLimit,
            "NO_BALANCE" => Self::NoBalance,
            "NO_ACTIVATION" => Self::NoActivation,
            "BAD_KEY" => Self::BadKey,
            "BAD_ACTION" => Self::BadAction,
            "BAD_SERVICE" => Self::BadService,
            "EARLY_CANCEL_DENIED" => Self::EarlyCancelDenied,
            "BAD_STATUS" => Self::BadStatus,
            "WRONG_ACTIVATION_ID" => Self::WrongActivationId,
            _ => return Self::parse_parametrized_error(s),
        };

        Some(code)
    }

    /// Parse error codes with parameters (BANNED, WRONG_MAX_PRICE).
    fn parse_parametrized_error(s: &str) -> Option<Self> {
        // BANNED:'YYYY-m-d H-i-s'
        static RE_BANNED: Lazy<Regex> =
            Lazy::new(|| Regex::new(r#"^BANNED\s*:\s*['"]([^'"]+)['"]$"#).unwrap());
        if let Some(cap) = RE_BANNED.captures(s) {
            let until = cap.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
            return Some(Self::Banned { until });
        }

        // WRONG_MAX_PRICE:<num>
        static RE_WRONG_MAX_PRICE: Lazy<Regex> =
            Lazy::new(|| Regex::new(r#"^WRONG_MAX_PRICE\s*:\s*([0-9]+(?:\.[0-9]+)?)$"#).unwrap());
        if let Some(cap) = RE_WRONG_MAX_PRICE.captures(s) {
            let min = cap.get(1).and_then(|m| m.as_str().parse::<f64>().ok());
            return Some(Self::WrongMaxPrice { min });
        }

        if Self::looks_like_error_code(s) {
            return Some(Self::Unknown { raw: s.to_string() });
        }

        None
    }

    /// Check if string looks like an error code format.
    fn looks_like_error_code(s: &str) -> bool {
        if s.is_empty() || s.starts_with("ACCESS") || s.starts_with("STATUS_") {
            return false;
        }

        const KNOWN_ERROR_PREFIXES: [&str; 8] = [
            "NO_", "ERROR_", "BAD_", "WRONG_", "EARLY_", "BANNED", "CHANNELS_", "ORDER_",
        ];

        KNOWN_ERROR_PREFIXES
            .iter()
            .any(|prefix| s.starts_with(prefix))
    }

    /// Returns true if this error is transient and the request should be repeated.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ErrorSql | Self::ChannelsLimit)
    }

    /// Returns true if the code means the activation itself is gone.
    pub fn is_terminal_for_activation(&self) -> bool {
        matches!(
            self,
            Self::NoActivation | Self::WrongActivationId | Self::BadService | Self::BadStatus
        )
    }

    /// Returns true if a fresh operation (another country, another number) might succeed.
    pub fn should_retry_operation(&self) -> bool {
        match self {
            Self::NoNumbers | Self::ErrorSql | Self::ChannelsLimit => true,
            Self::NoActivation | Self::WrongActivationId | Self::EarlyCancelDenied => true,
            Self::BadStatus | Self::WrongMaxPrice { .. } => true,
            // Tied to the request, not the account
            Self::BadAction | Self::BadService | Self::Unknown { .. } => true,
            Self::NoBalance | Self::BadKey | Self::Banned { .. } => false,
        }
    }
}

impl Display for SmsActivateErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code_name())
    }
}

impl Serialize for SmsActivateErrorCode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.code_name())
    }
}

impl<'de> Deserialize<'de> for SmsActivateErrorCode {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_raw(&s).unwrap_or(Self::Unknown { raw: s }))
    }
}

/// Error returned by SMS Activate service.
#[derive(Debug, Clone, Error)]
#[error("SMS Activate service error: code={code}, description={description}")]
pub struct SmsActivateServiceError {
    /// Error code from the service.
    pub code: SmsActivateErrorCode,
    /// Human-readable description.
    pub description: String,
    /// Original raw response text.
    pub raw: String,
}

impl SmsActivateServiceError {
    /// Create new service error from code and raw response.
    pub fn new(code: SmsActivateErrorCode, raw: String) -> Self {
        let description = code.description();
        Self {
            code,
            description,
            raw,
        }
    }
}

/// Parse SMS Activate error from API response text.
pub(crate) fn parse_sms_activate_error(raw: &str) -> Option<SmsActivateServiceError> {
    let code = SmsActivateErrorCode::from_raw(raw)?;
    let error = SmsActivateServiceError::new(code, raw.to_string());

    #[cfg(feature = "tracing")]
    warn!(
        code = %error.code,
        description = %error.description,
        raw = %raw,
        "SMS Activate service returned error"
    );

    Some(error)
}

/// Main error type for SMS Activate client operations.
#[derive(Debug, Error)]
pub enum SmsActivateError {
    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// Proxy URL rejected by the HTTP client.
    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(#[source] reqwest::Error),

    /// API endpoint is not a valid URL.
    #[error("Invalid SMS Activate endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Error building SMS Activate request URL.
    #[error("Error building SMS Activate request URL: {0}")]
    BuildRequestUrl(#[source] serde_urlencoded::ser::Error),

    /// Failed to send HTTP request (connection error, timeout).
    #[error("Failed to send HTTP request: {0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Server answered with a 4xx/5xx status.
    #[error("HTTP error status: {0}")]
    HttpStatus(#[source] reqwest::Error),

    /// Failed to read the response body.
    #[error("Failed to read response: {0}")]
    ParseResponse(#[source] reqwest::Error),

    /// Body started with `ERROR:`.
    #[error("SMS Activate API error: {message}")]
    Api { message: String },

    /// Body too short to be a real answer, usually a blocked proxy or region.
    #[error("Unexpectedly short response {body:?}, access is probably blocked")]
    SuspiciousResponse { body: String },

    /// SMS Activate service error.
    #[error("SMS Activate service error: {0}")]
    Service(#[source] SmsActivateServiceError),

    /// Response did not match the format expected for the action.
    #[error("Unexpected {action} response: {raw}")]
    UnexpectedResponse { action: &'static str, raw: String },

    /// Rejected status argument.
    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatusCode),

    /// Failed to deserialize JSON response.
    #[error("Failed to deserialize JSON response: {0}")]
    DeserializeJson(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SmsActivateError>;

impl SmsActivateError {
    /// Provider error code, when the service answered with one.
    pub fn code(&self) -> Option<&SmsActivateErrorCode> {
        match self {
            SmsActivateError::Service(error) => Some(&error.code),
            _ => None,
        }
    }
}

impl RetryableError for SmsActivateError {
    fn is_retryable(&self) -> bool {
        match self {
            SmsActivateError::Service(error) => error.code.is_retryable(),
            // Transport problems behave the same way: ask again later
            SmsActivateError::HttpRequest(_)
            | SmsActivateError::HttpStatus(_)
            | SmsActivateError::ParseResponse(_)
            | SmsActivateError::SuspiciousResponse { .. } => true,
            SmsActivateError::BuildHttpClient(_)
            | SmsActivateError::InvalidProxy(_)
            | SmsActivateError::InvalidEndpoint(_)
            | SmsActivateError::BuildRequestUrl(_)
            | SmsActivateError::Api { .. }
            | SmsActivateError::UnexpectedResponse { .. }
            | SmsActivateError::InvalidStatus(_)
            | SmsActivateError::DeserializeJson(_) => false,
        }
    }

    fn should_retry_operation(&self) -> bool {
        match self {
            SmsActivateError::Service(error) => error.code.should_retry_operation(),
            SmsActivateError::HttpRequest(_)
            | SmsActivateError::HttpStatus(_)
            | SmsActivateError::ParseResponse(_)
            | SmsActivateError::SuspiciousResponse { .. }
            | SmsActivateError::Api { .. }
            | SmsActivateError::UnexpectedResponse { .. }
            | SmsActivateError::DeserializeJson(_) => true,
            SmsActivateError::BuildHttpClient(_)
            | SmsActivateError::InvalidProxy(_)
            | SmsActivateError::InvalidEndpoint(_)
            | SmsActivateError::BuildRequestUrl(_)
            | SmsActivateError::InvalidStatus(_) => false,
        }
    }

    fn is_terminal_for_activation(&self) -> bool {
        self.code()
            .is_some_and(SmsActivateErrorCode::is_terminal_for_activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_errors() {
        let test_cases = vec![
            ("NO_ACTIVATION", SmsActivateErrorCode::NoActivation),
            ("ERROR_SQL", SmsActivateErrorCode::ErrorSql),
            ("BAD_KEY", SmsActivateErrorCode::BadKey),
            ("NO_NUMBERS", SmsActivateErrorCode::NoNumbers),
            ("NO_BALANCE", SmsActivateErrorCode::NoBalance),
            ("BAD_STATUS", SmsActivateErrorCode::BadStatus),
        ];

        for (input, expected) in test_cases {
            let error = parse_sms_activate_error(input).unwrap();
            assert_eq!(error.code, expected);
            assert_eq!(error.raw, input);
        }
    }

    #[test]
    fn test_parse_banned_error() {
        let error = parse_sms_activate_error("BANNED:'2025-12-31 23:59:59'").unwrap();
        assert_eq!(
            error.code,
            SmsActivateErrorCode::Banned {
                until: "2025-12-31 23:59:59".to_string()
            }
        );
    }

    #[test]
    fn test_parse_wrong_max_price() {
        let error = parse_sms_activate_error("WRONG_MAX_PRICE:10.5").unwrap();
        assert_eq!(
            error.code,
            SmsActivateErrorCode::WrongMaxPrice { min: Some(10.5) }
        );
    }

    #[test]
    fn test_success_responses_not_treated_as_errors() {
        for response in [
            "ACCESS_READY",
            "ACCESS_ACTIVATION",
            "ACCESS_CANCEL",
            "ACCESS_BALANCE:10.55",
            "ACCESS_NUMBER:123:79001234567",
            "STATUS_WAIT_CODE",
            "STATUS_CANCEL",
            "STATUS_OK:12345",
        ] {
            assert!(
                parse_sms_activate_error(response).is_none(),
                "Success response '{}' should not be treated as an error",
                response
            );
        }
    }

    #[test]
    fn test_unknown_error_prefix() {
        let error = parse_sms_activate_error("NO_SUCH_THING").unwrap();
        assert_eq!(
            error.code,
            SmsActivateErrorCode::Unknown {
                raw: "NO_SUCH_THING".to_string()
            }
        );
    }

    #[test]
    fn test_operation_level_classification() {
        assert!(SmsActivateErrorCode::NoNumbers.should_retry_operation());
        assert!(!SmsActivateErrorCode::NoNumbers.is_retryable());
        assert!(!SmsActivateErrorCode::NoBalance.should_retry_operation());
        assert!(!SmsActivateErrorCode::BadKey.should_retry_operation());
        assert!(SmsActivateErrorCode::ErrorSql.is_retryable());
    }

    #[test]
    fn test_only_account_level_codes_stop_the_country_loop() {
        for code in [
            SmsActivateErrorCode::NoBalance,
            SmsActivateErrorCode::BadKey,
            SmsActivateErrorCode::Banned {
                until: "2025-12-31 23:59:59".to_string(),
            },
        ] {
            assert!(!code.should_retry_operation(), "{code} should stop");
        }

        for code in [
            SmsActivateErrorCode::BadAction,
            SmsActivateErrorCode::BadService,
            SmsActivateErrorCode::NoNumbers,
            SmsActivateErrorCode::Unknown {
                raw: "NEW_CODE".to_string(),
            },
        ] {
            assert!(code.should_retry_operation(), "{code} should move on");
        }
    }

    #[test]
    fn test_activation_specific_codes_end_polling() {
        for raw in ["NO_ACTIVATION", "WRONG_ACTIVATION_ID", "BAD_SERVICE", "BAD_STATUS"] {
            let err = SmsActivateError::Service(parse_sms_activate_error(raw).unwrap());
            assert!(err.is_terminal_for_activation(), "{raw} should end polling");
        }

        for raw in ["ERROR_SQL", "NO_NUMBERS", "NO_SUCH_THING"] {
            let err = SmsActivateError::Service(parse_sms_activate_error(raw).unwrap());
            assert!(!err.is_terminal_for_activation(), "{raw} should keep polling");
        }

        let api = SmsActivateError::Api {
            message: "temporary failure".to_string(),
        };
        let unexpected = SmsActivateError::UnexpectedResponse {
            action: "getStatus",
            raw: "STATUS_SOMETHING_NEW".to_string(),
        };
        assert!(!api.is_terminal_for_activation());
        assert!(!unexpected.is_terminal_for_activation());
    }

    #[test]
    fn test_api_error_is_not_retryable() {
        let err = SmsActivateError::Api {
            message: "wrong key".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(err.code().is_none());
    }
}
