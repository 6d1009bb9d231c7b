//! Service trait definition.

use crate::errors::RetryableError;
use crate::types::{ActivationId, NumberGet, SmsCode};
use std::error::Error as StdError;

/// Activation lifecycle as seen by the registration flow.
///
/// This trait abstracts the service interface so the UI flow can run against
/// the real provider-backed service or an in-memory fake.
#[allow(async_fn_in_trait)]
pub trait ActivationServiceTrait: Send + Sync {
    /// The error type for this service.
    type Error: StdError + RetryableError;

    /// The service type for phone number requests (e.g., Telegram).
    type Service: Clone + Send + Sync;

    /// Rent the cheapest acceptable number for the service and track it.
    async fn acquire_number(&self, service: Self::Service) -> Result<NumberGet, Self::Error>;

    /// Poll until the SMS code arrives, the activation ends, or the timeout
    /// passes. A received code finishes the activation.
    async fn wait_for_code(&self, activation_id: &ActivationId) -> Result<SmsCode, Self::Error>;

    /// Cancel the activation if the provider's minimum age has passed.
    async fn cancel_activation(&self, activation_id: &ActivationId) -> Result<(), Self::Error>;

    /// Drop the local record without talking to the provider.
    fn forget(&self, activation_id: &ActivationId) -> Result<bool, Self::Error>;
}
