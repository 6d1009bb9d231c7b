//! Types for SMS Activate API responses.

use crate::types::{ActivationId, ActivationState, FullNumber, PriceInfo, ProviderCountry, SmsCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Parsed `getBalance` answer: `ACCESS_BALANCE:<float>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceResponse {
    pub balance: f64,
}

impl BalanceResponse {
    /// Parse response from raw API response text.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let balance = raw.trim().strip_prefix("ACCESS_BALANCE:")?.trim().parse().ok()?;
        Some(Self { balance })
    }
}

/// Parsed `getNumber` answer: `ACCESS_NUMBER:<id>:<phone>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberResponse {
    /// Activation ID for this phone number.
    pub activation_id: ActivationId,
    /// Full phone number with country code.
    pub phone_number: FullNumber,
}

impl NumberResponse {
    /// Parse response from raw API response text.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let rest = raw.trim().strip_prefix("ACCESS_NUMBER:")?;
        let (id, phone) = rest.split_once(':')?;
        let (id, phone) = (id.trim(), phone.trim());
        if id.is_empty() || phone.is_empty() {
            return None;
        }

        Some(Self {
            activation_id: ActivationId::new(id),
            phone_number: FullNumber::new(phone),
        })
    }
}

/// Parsed `getStatus` answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusResponse {
    /// `STATUS_WAIT_CODE`: no SMS yet.
    WaitCode,
    /// `STATUS_WAIT_RETRY:<last code>`: waiting for a repeated SMS.
    WaitRetry { last_code: String },
    /// `STATUS_WAIT_RESEND`: waiting for the SMS to be resent.
    WaitResend,
    /// `STATUS_OK:<code>`: code received.
    Ok { code: String },
    /// `STATUS_CANCEL`: activation cancelled.
    Cancel,
}

impl StatusResponse {
    /// Parse response from raw API response text.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let s = raw.trim();
        match s {
            "STATUS_WAIT_CODE" => return Some(Self::WaitCode),
            "STATUS_WAIT_RESEND" => return Some(Self::WaitResend),
            "STATUS_CANCEL" => return Some(Self::Cancel),
            _ => {}
        }

        if let Some(code) = s.strip_prefix("STATUS_OK:") {
            return Some(Self::Ok {
                code: code.trim().to_string(),
            });
        }

        s.strip_prefix("STATUS_WAIT_RETRY:").map(|last| Self::WaitRetry {
            last_code: last.trim().to_string(),
        })
    }
}

impl From<StatusResponse> for ActivationState {
    fn from(status: StatusResponse) -> Self {
        match status {
            StatusResponse::Ok { code } => ActivationState::CodeReceived(SmsCode::new(code)),
            StatusResponse::Cancel => ActivationState::Cancelled,
            StatusResponse::WaitCode
            | StatusResponse::WaitRetry { .. }
            | StatusResponse::WaitResend => ActivationState::WaitingCode,
        }
    }
}

/// Status code rejected by [`ActivationStatus::try_from`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("activation status must be 6 (finish) or 8 (cancel), got {0}")]
pub struct InvalidStatusCode(pub u8);

/// Final activation status codes for the setStatus API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationStatus {
    /// Finish the activation.
    Finish,
    /// Cancel the activation and refund the reservation.
    Cancel,
}

impl ActivationStatus {
    /// Get the numeric status code for the API.
    pub fn code(&self) -> u8 {
        match self {
            Self::Finish => 6,
            Self::Cancel => 8,
        }
    }
}

impl TryFrom<u8> for ActivationStatus {
    type Error = InvalidStatusCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            6 => Ok(Self::Finish),
            8 => Ok(Self::Cancel),
            other => Err(InvalidStatusCode(other)),
        }
    }
}

impl Display for ActivationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Finish => write!(f, "FINISH(6)"),
            Self::Cancel => write!(f, "CANCEL(8)"),
        }
    }
}

/// Response from setStatus API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetStatusResponse {
    /// Service successfully activated.
    Activation,
    /// Activation canceled.
    Cancel,
    /// Any other `ACCESS_*` acknowledgement.
    Accepted(String),
}

impl SetStatusResponse {
    /// Parse response from raw API response text.
    ///
    /// Any body mentioning `ACCESS` counts as an acknowledgement.
    pub fn from_raw(raw: &str) -> Option<Self> {
        match raw.trim() {
            "ACCESS_ACTIVATION" => Some(Self::Activation),
            "ACCESS_CANCEL" => Some(Self::Cancel),
            other if other.contains("ACCESS") => Some(Self::Accepted(other.to_string())),
            _ => None,
        }
    }
}

impl Display for SetStatusResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Activation => write!(f, "ACCESS_ACTIVATION"),
            Self::Cancel => write!(f, "ACCESS_CANCEL"),
            Self::Accepted(raw) => write!(f, "{}", raw),
        }
    }
}

/// One entry of the `getCountries` map.
#[derive(Debug, Clone, Deserialize)]
struct CountryEntry {
    #[serde(default)]
    eng: Option<String>,
}

/// Parse the `getCountries` JSON object into a list sorted by id.
///
/// Keys that are not numeric ids are skipped, as are entries that are not
/// objects.
pub(crate) fn parse_countries(text: &str) -> Result<Vec<ProviderCountry>, serde_json::Error> {
    let raw: HashMap<String, Value> = serde_json::from_str(text)?;

    let mut countries: Vec<ProviderCountry> = raw
        .into_iter()
        .filter_map(|(key, value)| {
            let id = key.trim().parse::<u32>().ok()?;
            let entry = CountryEntry::deserialize(value).ok()?;
            Some(ProviderCountry {
                id,
                name: entry.eng.filter(|name| !name.trim().is_empty()),
            })
        })
        .collect();

    countries.sort_by_key(|c| c.id);
    Ok(countries)
}

/// Parse the `getPrices` JSON object, keeping only the given service.
///
/// Shape: `{"<country>": {"<service>": {"cost": .., "count": ..}}}`. Cost and
/// count may be numbers or numeric strings.
pub(crate) fn parse_prices(
    text: &str,
    service: &str,
) -> Result<HashMap<u32, PriceInfo>, serde_json::Error> {
    let raw: HashMap<String, Value> = serde_json::from_str(text)?;

    let prices = raw
        .into_iter()
        .filter_map(|(key, services)| {
            let id = key.trim().parse::<u32>().ok()?;
            let entry = services.get(service)?;
            let cost = numeric(entry.get("cost")?)?;
            let count = numeric(entry.get("count")?)?;
            Some((
                id,
                PriceInfo {
                    cost,
                    count: count as i64,
                },
            ))
        })
        .collect();

    Ok(prices)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
