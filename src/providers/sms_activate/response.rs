//! Response classification for SMS Activate API.

use super::errors::{SmsActivateServiceError, parse_sms_activate_error};

/// Plain-text answer of the handler API, split into success or provider error.
///
/// The API answers every action with plain text: either an error code such as
/// `NO_NUMBERS` / `BAD_KEY`, or an action-specific payload (`ACCESS_*`,
/// `STATUS_*`, or a JSON document for the listing actions).
#[derive(Debug)]
pub enum SmsActivateResponse {
    Success(String),
    Error(SmsActivateServiceError),
}

impl SmsActivateResponse {
    /// Parse response from raw text.
    pub fn from_text(text: &str) -> Self {
        if let Some(error) = parse_sms_activate_error(text) {
            Self::Error(error)
        } else {
            Self::Success(text.to_string())
        }
    }

    /// Convert to Result.
    pub fn into_result(self) -> Result<String, SmsActivateServiceError> {
        match self {
            Self::Success(text) => Ok(text),
            Self::Error(e) => Err(e),
        }
    }
}
