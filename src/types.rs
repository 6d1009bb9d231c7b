//! Core types for the activation flow.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// ActivationId
// =============================================================================

/// Provider-assigned identifier of an activation.
///
/// Returned together with the phone number and used for every later status
/// query, finish or cancel request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivationId(String);

impl ActivationId {
    /// Create a new ActivationId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for ActivationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ActivationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for ActivationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ActivationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// SmsCode
// =============================================================================

/// Verification code delivered to the rented number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsCode(pub String);

impl SmsCode {
    /// Create a new SmsCode.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SmsCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SmsCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SmsCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

// =============================================================================
// FullNumber
// =============================================================================

/// Full phone number with country prefix (e.g., "6281234567890"),
/// exactly as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FullNumber(String);

impl FullNumber {
    /// Create a new FullNumber.
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Get the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// International format with a leading `+`.
    pub fn with_plus_prefix(&self) -> String {
        format!("+{}", self.0.trim_start_matches('+'))
    }
}

impl Display for FullNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FullNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for FullNumber {
    fn from(number: String) -> Self {
        Self(number)
    }
}

impl From<&str> for FullNumber {
    fn from(number: &str) -> Self {
        Self(number.to_string())
    }
}

// =============================================================================
// DialCode
// =============================================================================

/// Error when parsing a dial code.
#[derive(Debug, Clone, Error)]
pub enum DialCodeError {
    /// Dial code contains non-digit characters.
    #[error("dial code must contain only digits")]
    NonDigit,
    /// Dial code is empty.
    #[error("dial code cannot be empty")]
    Empty,
}

/// Country calling code (e.g., "1" for USA, "62" for Indonesia).
///
/// Dial codes are stored without the leading '+' sign.
///
/// # Example
///
/// ```rust
/// use tg_autoreg::DialCode;
///
/// let dc = DialCode::new("+380").unwrap();
/// assert_eq!(dc.to_string(), "380");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DialCode(String);

impl DialCode {
    /// Create a new DialCode from a string.
    ///
    /// The input can include a leading '+' which will be stripped.
    pub fn new(s: impl AsRef<str>) -> Result<Self, DialCodeError> {
        let n = s.as_ref().trim().trim_start_matches('+');
        if n.is_empty() {
            return Err(DialCodeError::Empty);
        }
        if !n.chars().all(|c| c.is_ascii_digit()) {
            return Err(DialCodeError::NonDigit);
        }
        Ok(Self(n.to_string()))
    }

    /// Get the dial code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DialCode {
    type Err = DialCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for DialCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for DialCode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        DialCode::new(raw).map_err(de::Error::custom)
    }
}

impl Serialize for DialCode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

// =============================================================================
// Phone normalization
// =============================================================================

/// Strip the country prefix from a full number.
///
/// If `full` starts with `prefix`, exactly one leading occurrence is removed.
/// Otherwise (including an empty prefix) `full` is returned unchanged.
///
/// ```rust
/// use tg_autoreg::types::local_number;
///
/// assert_eq!(local_number("6281234567", "62"), "81234567");
/// assert_eq!(local_number("6281234567", "7"), "6281234567");
/// ```
pub fn local_number<'a>(full: &'a str, prefix: &str) -> &'a str {
    full.strip_prefix(prefix).unwrap_or(full)
}

// =============================================================================
// NumberGet
// =============================================================================

/// A phone number acquired from the provider.
///
/// Created when a "number acquired" response is parsed and discarded once the
/// activation is finished or cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberGet {
    /// Provider-assigned activation identifier.
    pub activation_id: ActivationId,
    /// Full phone number, including the country prefix.
    pub full_phone_number: FullNumber,
    /// Local part of the number with the prefix stripped.
    pub phone_number: String,
    /// Country calling-code prefix, empty when the country is unknown.
    pub country_code: String,
}

impl NumberGet {
    /// Build from a provider response and the resolved country prefix.
    pub fn new(activation_id: ActivationId, full_phone_number: FullNumber, prefix: &str) -> Self {
        let phone_number = local_number(full_phone_number.as_str(), prefix).to_string();
        Self {
            activation_id,
            full_phone_number,
            phone_number,
            country_code: prefix.to_string(),
        }
    }
}

// =============================================================================
// RegisterUserData
// =============================================================================

/// Profile data typed into the sign-up form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegisterUserData {
    /// First name shown on the new account.
    pub first_name: String,
    /// Last name, optional on the sign-up form.
    #[serde(default)]
    pub last_name: String,
}

impl RegisterUserData {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

// =============================================================================
// Provider listings
// =============================================================================

/// Country as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCountry {
    /// Provider-specific numeric country id.
    pub id: u32,
    /// English country name, when the provider supplies one.
    pub name: Option<String>,
}

/// Price and stock of numbers for one country and service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceInfo {
    /// Cost of one activation in the account currency.
    pub cost: f64,
    /// Numbers currently in stock.
    pub count: i64,
}

/// State of an activation as reported by a status poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationState {
    /// No SMS yet.
    WaitingCode,
    /// The verification code arrived.
    CodeReceived(SmsCode),
    /// The activation was cancelled provider-side.
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activation_id_from_string() {
        let id = ActivationId::from("12345");
        assert_eq!(id.to_string(), "12345");
        assert_eq!(id.as_ref(), "12345");
    }

    #[test]
    fn test_full_number_plus_prefix() {
        let num = FullNumber::new("6281234567");
        assert_eq!(num.with_plus_prefix(), "+6281234567");
        assert_eq!(FullNumber::new("+1555").with_plus_prefix(), "+1555");
    }

    #[test]
    fn test_dial_code_with_plus() {
        let dc = DialCode::new("  +380 ").unwrap();
        assert_eq!(dc.as_str(), "380");
    }

    #[test]
    fn test_dial_code_invalid() {
        assert!(matches!(DialCode::new("+"), Err(DialCodeError::Empty)));
        assert!(matches!(DialCode::new("12a"), Err(DialCodeError::NonDigit)));
    }

    #[test]
    fn test_local_number_strips_matching_prefix() {
        assert_eq!(local_number("6281234567", "62"), "81234567");
        assert_eq!(local_number("12025550123", "1"), "2025550123");
    }

    #[test]
    fn test_local_number_keeps_unmatched_number() {
        assert_eq!(local_number("6281234567", "380"), "6281234567");
        assert_eq!(local_number("6281234567", ""), "6281234567");
    }

    #[test]
    fn test_local_number_strips_only_once() {
        assert_eq!(local_number("777123", "7"), "77123");
    }

    #[test]
    fn test_number_get_new() {
        let number = NumberGet::new(
            ActivationId::from("42"),
            FullNumber::new("6281234567"),
            "62",
        );
        assert_eq!(number.phone_number, "81234567");
        assert_eq!(number.country_code, "62");
        assert_eq!(number.full_phone_number.as_str(), "6281234567");
    }

    #[test]
    fn test_register_user_data_default_last_name() {
        let data: RegisterUserData = serde_json::from_str(r#"{"first_name":"Artem"}"#).unwrap();
        assert_eq!(data.first_name, "Artem");
        assert!(data.last_name.is_empty());
    }
}
