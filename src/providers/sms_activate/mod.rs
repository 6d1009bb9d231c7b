//! SMS Activate provider.
//!
//! Plain-text handler API at <https://sms-activate.org>.

mod client;
mod errors;
mod provider;
mod response;
mod services;
mod types;

pub use client::{
    DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT, ProxyConfig, SmsActivateClient,
    SmsActivateClientBuilder,
};
pub use errors::{SmsActivateError, SmsActivateErrorCode, SmsActivateServiceError};
pub use provider::SmsActivateProvider;
pub use services::Service;
pub use types::{
    ActivationStatus, InvalidStatusCode, NumberResponse, SetStatusResponse, StatusResponse,
};
