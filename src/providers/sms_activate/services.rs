//! Service definitions for SMS Activate API.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// SMS Activate service identifiers.
///
/// Each service is the application the rented number will receive its
/// verification SMS from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Service {
    /// Telegram (code: "tg").
    #[default]
    Telegram,
    /// Other/custom service.
    Other { code: String },
}

impl Service {
    /// Get the service code for the API.
    pub fn code(&self) -> &str {
        match self {
            Service::Telegram => "tg",
            Service::Other { code } => code.as_str(),
        }
    }

    /// Create a Service from a code string.
    pub fn from_code<S: AsRef<str>>(code: S) -> Self {
        match code.as_ref() {
            "tg" => Service::Telegram,
            other => Service::Other {
                code: other.to_string(),
            },
        }
    }
}

impl Display for Service {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Service {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Service::from_code(s))
    }
}

impl Serialize for Service {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Service {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Service::from_code(s))
    }
}
