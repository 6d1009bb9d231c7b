//! SMS provider implementations.

pub(crate) mod retryable;
pub(crate) mod traits;

pub mod sms_activate;

pub use retryable::{OnRetryCallback, SmsRetryableProvider};
pub use traits::Provider;
