//! SMS Activate provider implementation.

use super::client::SmsActivateClient;
use super::errors::{Result, SmsActivateError};
use super::services::Service;
use super::types::ActivationStatus;
use crate::providers::traits::Provider;
use crate::types::{ActivationId, ActivationState, FullNumber, PriceInfo, ProviderCountry};
use std::collections::HashMap;

#[cfg(feature = "tracing")]
use tracing::debug;

/// SMS Activate provider implementation.
///
/// This wraps the [`SmsActivateClient`] and implements the generic [`Provider`] trait.
/// The service is passed at call time, so a single provider can rent numbers
/// for several services.
///
/// # Example
///
/// ```rust,ignore
/// use tg_autoreg::sms_activate::{Service, SmsActivateClient, SmsActivateProvider};
/// use tg_autoreg::Provider;
///
/// let client = SmsActivateClient::with_api_key("your_api_key")?;
/// let provider = SmsActivateProvider::new(client);
///
/// let (activation_id, number) = provider.get_phone_number(6, Service::Telegram).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SmsActivateProvider {
    client: SmsActivateClient,
}

impl SmsActivateProvider {
    /// Create a new SMS Activate provider.
    ///
    /// # Arguments
    /// * `client` - The SMS Activate client to use
    pub fn new(client: SmsActivateClient) -> Self {
        Self { client }
    }

    /// Get reference to the inner client.
    pub fn client(&self) -> &SmsActivateClient {
        &self.client
    }

    /// Send a validated final status.
    ///
    /// Only 6 (finish) and 8 (cancel) are accepted; anything else fails with
    /// [`SmsActivateError::InvalidStatus`] before a request is made.
    pub async fn set_final_status(&self, activation_id: &ActivationId, status: u8) -> Result<()> {
        let status = ActivationStatus::try_from(status)?;
        let _response = self.client.set_status(activation_id, status).await?;

        #[cfg(feature = "tracing")]
        debug!(activation_id = %activation_id, %status, response = %_response, "Final status accepted");

        Ok(())
    }
}

impl Provider for SmsActivateProvider {
    type Error = SmsActivateError;
    type Service = Service;

    async fn get_balance(&self) -> Result<f64> {
        self.client.get_balance().await
    }

    async fn get_countries(&self) -> Result<Vec<ProviderCountry>> {
        self.client.get_countries().await
    }

    async fn get_prices(&self, service: &Self::Service) -> Result<HashMap<u32, PriceInfo>> {
        self.client.get_prices(service).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsActivateProvider::get_phone_number",
            skip_all,
            fields(service = %service.code(), country_id = country_id)
        )
    )]
    async fn get_phone_number(
        &self,
        country_id: u32,
        service: Self::Service,
    ) -> Result<(ActivationId, FullNumber)> {
        let response = self.client.get_number(country_id, &service).await?;

        Ok((response.activation_id, response.phone_number))
    }

    async fn get_activation_state(&self, activation_id: &ActivationId) -> Result<ActivationState> {
        let status = self.client.get_status(activation_id).await?;
        Ok(status.into())
    }

    async fn finish_activation(&self, activation_id: &ActivationId) -> Result<()> {
        self.set_final_status(activation_id, ActivationStatus::Finish.code())
            .await?;

        #[cfg(feature = "tracing")]
        debug!(activation_id = %activation_id, "Activation finished successfully");

        Ok(())
    }

    async fn cancel_activation(&self, activation_id: &ActivationId) -> Result<()> {
        self.set_final_status(activation_id, ActivationStatus::Cancel.code())
            .await?;

        #[cfg(feature = "tracing")]
        debug!(activation_id = %activation_id, "Activation cancelled");

        Ok(())
    }

    fn service_code(service: &Self::Service) -> String {
        service.code().to_string()
    }
}
