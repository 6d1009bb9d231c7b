//! Provider trait definition.

use crate::errors::RetryableError;
use crate::types::{ActivationId, ActivationState, FullNumber, PriceInfo, ProviderCountry};
use std::collections::HashMap;
use std::error::Error as StdError;
use std::future::Future;

/// Core trait that all SMS providers must implement.
///
/// This trait mirrors the activation lifecycle offered by SMS-Activate style
/// APIs:
/// - Checking the account balance
/// - Listing countries and per-country prices for a service
/// - Renting a phone number in a given country
/// - Polling the activation for the SMS code
/// - Finishing or cancelling the activation
///
/// # Type Parameters
///
/// - `Error`: The error type for this provider
/// - `Service`: The service type for phone number requests (e.g., Telegram)
///
/// # Note on async methods
///
/// All async methods in this trait return `Send` futures, making them
/// compatible with multi-threaded executors.
#[allow(async_fn_in_trait)]
pub trait Provider: Send + Sync + Clone {
    /// Error type returned by provider operations.
    type Error: StdError + RetryableError + Send + Sync + 'static;

    /// Service type for phone number requests.
    type Service: Clone + Send + Sync;

    /// Current account balance.
    fn get_balance(&self) -> impl Future<Output = Result<f64, Self::Error>> + Send;

    /// Countries known to the provider.
    fn get_countries(
        &self,
    ) -> impl Future<Output = Result<Vec<ProviderCountry>, Self::Error>> + Send;

    /// Price and stock for the given service, keyed by provider country id.
    ///
    /// Countries that do not offer the service are absent from the map.
    fn get_prices(
        &self,
        service: &Self::Service,
    ) -> impl Future<Output = Result<HashMap<u32, PriceInfo>, Self::Error>> + Send;

    /// Rent a phone number for the service in the given provider country.
    ///
    /// # Returns
    /// * `activation_id` - Identifier of the new activation
    /// * `full_number` - The full phone number with country prefix
    fn get_phone_number(
        &self,
        country_id: u32,
        service: Self::Service,
    ) -> impl Future<Output = Result<(ActivationId, FullNumber), Self::Error>> + Send;

    /// Poll the activation once.
    fn get_activation_state(
        &self,
        activation_id: &ActivationId,
    ) -> impl Future<Output = Result<ActivationState, Self::Error>> + Send;

    /// Mark the activation as successfully completed.
    fn finish_activation(
        &self,
        activation_id: &ActivationId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Cancel the activation so the reservation is refunded.
    fn cancel_activation(
        &self,
        activation_id: &ActivationId,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Human-readable code of a service, used in logs.
    fn service_code(service: &Self::Service) -> String;
}
