//! Main service implementation.

use super::config::{ActivationServiceConfig, ActivationServiceConfigBuilder};
use super::error::ActivationServiceError;
use super::selection::{CountryOffer, select_countries};
use super::traits::ActivationServiceTrait;
use crate::errors::RetryableError;
use crate::providers::traits::Provider;
use crate::registry::{ActivationRecord, ActivationRegistry, CancelGate};
use crate::types::{ActivationId, ActivationState, NumberGet, SmsCode};
use chrono::Utc;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::{debug, error, info, warn};

/// How many of the cheapest countries are logged before requesting a number.
#[cfg(feature = "tracing")]
const LOGGED_OFFERS: usize = 5;

/// Outcome of [`ActivationService::cleanup`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    /// Activations cancelled and removed from the registry.
    pub cancelled: Vec<ActivationId>,
    /// Activations still too young to cancel, with their age.
    pub skipped: Vec<(ActivationId, Duration)>,
    /// Activations the provider refused to cancel.
    pub failed: Vec<(ActivationId, String)>,
}

/// A tracked activation with its current age.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingActivation {
    pub record: ActivationRecord,
    /// `None` when the record has no usable timestamp.
    pub age: Option<Duration>,
}

/// Provider-backed activation lifecycle.
///
/// This service handles:
/// - Picking the cheapest country that has numbers and renting one
/// - Tracking every rented number in the local [`ActivationRegistry`]
/// - Polling for the SMS code with a timeout
/// - Finishing the activation, or cancelling it once the provider allows
///
/// # Type Parameters
///
/// - `P`: The provider implementation (e.g., `SmsActivateProvider`)
///
/// # Example
///
/// ```rust,ignore
/// use tg_autoreg::{ActivationRegistry, ActivationService, ActivationServiceConfig, ActivationServiceTrait};
/// use tg_autoreg::sms_activate::{Service, SmsActivateClient, SmsActivateProvider};
///
/// let client = SmsActivateClient::with_api_key("api_key")?;
/// let service = ActivationService::new(
///     SmsActivateProvider::new(client),
///     ActivationRegistry::default(),
///     ActivationServiceConfig::default(),
/// );
///
/// let number = service.acquire_number(Service::Telegram).await?;
/// let code = service.wait_for_code(&number.activation_id).await?;
/// println!("Got code: {}", code);
/// ```
#[derive(Debug, Clone)]
pub struct ActivationService<P: Provider> {
    provider: P,
    registry: ActivationRegistry,
    config: ActivationServiceConfig,
}

impl<P: Provider> ActivationService<P> {
    /// Create a new service. The configuration is used as given; see
    /// [`ActivationService::builder`] for a validating constructor.
    pub fn new(provider: P, registry: ActivationRegistry, config: ActivationServiceConfig) -> Self {
        Self {
            provider,
            registry,
            config,
        }
    }

    /// Create a new builder for ActivationService.
    pub fn builder(provider: P) -> ActivationServiceBuilder<P> {
        ActivationServiceBuilder::new(provider)
    }

    /// Get reference to the underlying provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn registry(&self) -> &ActivationRegistry {
        &self.registry
    }

    /// Get reference to the service configuration.
    pub fn config(&self) -> &ActivationServiceConfig {
        &self.config
    }

    /// Current account balance.
    pub async fn balance(&self) -> Result<f64, ActivationServiceError> {
        self.provider
            .get_balance()
            .await
            .map_err(ActivationServiceError::provider)
    }

    /// Countries passing the configured price and stock filter, cheapest first.
    pub async fn available_countries(
        &self,
        service: &P::Service,
    ) -> Result<Vec<CountryOffer>, ActivationServiceError> {
        let countries = self
            .provider
            .get_countries()
            .await
            .map_err(ActivationServiceError::provider)?;

        let prices = self
            .provider
            .get_prices(service)
            .await
            .map_err(ActivationServiceError::provider)?;

        Ok(select_countries(
            &countries,
            &prices,
            self.config.min_price,
            self.config.max_price,
        ))
    }

    /// Finish the activation with the provider and stop tracking it.
    pub async fn finish_activation(
        &self,
        activation_id: &ActivationId,
    ) -> Result<(), ActivationServiceError> {
        self.provider
            .finish_activation(activation_id)
            .await
            .map_err(ActivationServiceError::provider)?;

        self.registry.remove(activation_id)?;
        Ok(())
    }

    /// Cancel every tracked activation that is old enough.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "activation.cleanup", skip_all)
    )]
    pub async fn cleanup(&self) -> Result<CleanupReport, ActivationServiceError> {
        let now = Utc::now();
        let mut report = CleanupReport::default();

        for record in self.registry.load() {
            let id = record.activation_id.clone();

            match self.registry.cancel_gate(&id, self.config.min_cancel_age, now) {
                CancelGate::TooEarly { age, .. } => {
                    #[cfg(feature = "tracing")]
                    debug!(activation_id = %id, age_secs = age.as_secs(), "Too young to cancel");
                    report.skipped.push((id, age));
                }
                // Removed while iterating
                CancelGate::NotTracked => {}
                CancelGate::Allowed => match self.provider.cancel_activation(&id).await {
                    Ok(()) => {
                        self.registry.remove(&id)?;
                        report.cancelled.push(id);
                    }
                    Err(e) => {
                        #[cfg(feature = "tracing")]
                        warn!(activation_id = %id, error = %e, "Failed to cancel activation");
                        report.failed.push((id, e.to_string()));
                    }
                },
            }
        }

        #[cfg(feature = "tracing")]
        info!(
            cancelled = report.cancelled.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Cleanup finished"
        );

        Ok(report)
    }

    /// Tracked activations with their ages.
    pub fn pending(&self) -> Vec<PendingActivation> {
        let now = Utc::now();
        self.registry
            .load()
            .into_iter()
            .map(|record| PendingActivation {
                age: record.age_at(now),
                record,
            })
            .collect()
    }

    fn log_offers(&self, _offers: &[CountryOffer]) {
        #[cfg(feature = "tracing")]
        {
            info!(
                count = _offers.len(),
                min_price = self.config.min_price,
                max_price = self.config.max_price,
                "Countries with available numbers"
            );
            for offer in _offers.iter().take(LOGGED_OFFERS) {
                info!(
                    country = %offer.name,
                    country_id = offer.id,
                    cost = offer.cost,
                    count = offer.count,
                    "Offer"
                );
            }
        }
    }

    fn forget_quietly(&self, activation_id: &ActivationId) {
        if let Err(_e) = self.registry.remove(activation_id) {
            #[cfg(feature = "tracing")]
            warn!(activation_id = %activation_id, error = %_e, "Failed to update activation registry");
        }
    }
}

impl<P: Provider> ActivationServiceTrait for ActivationService<P> {
    type Error = ActivationServiceError;
    type Service = P::Service;

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "activation.acquire_number",
            skip_all,
            fields(service = %P::service_code(&service))
        )
    )]
    async fn acquire_number(&self, service: Self::Service) -> Result<NumberGet, Self::Error> {
        let balance = self.balance().await?;

        #[cfg(feature = "tracing")]
        info!(balance, "Account balance");

        if balance < self.config.min_price {
            return Err(ActivationServiceError::InsufficientBalance {
                balance,
                min_price: self.config.min_price,
            });
        }

        let offers = self.available_countries(&service).await?;
        if offers.is_empty() {
            return Err(ActivationServiceError::NoCountriesAvailable {
                service: P::service_code(&service),
                min_price: self.config.min_price,
                max_price: self.config.max_price,
            });
        }

        self.log_offers(&offers);

        for (attempt, offer) in offers.iter().enumerate() {
            if attempt > 0 {
                tokio::time::sleep(self.config.country_delay).await;
            }

            #[cfg(feature = "tracing")]
            info!(country = %offer.name, country_id = offer.id, cost = offer.cost, "Requesting number");

            match self
                .provider
                .get_phone_number(offer.id, service.clone())
                .await
            {
                Ok((activation_id, full_number)) => {
                    let number = NumberGet::new(activation_id, full_number, &offer.prefix());

                    if let Err(_e) = self
                        .registry
                        .track(&number.activation_id, number.full_phone_number.as_str())
                    {
                        #[cfg(feature = "tracing")]
                        error!(
                            activation_id = %number.activation_id,
                            error = %_e,
                            "Number acquired but not recorded in the registry"
                        );
                    }

                    #[cfg(feature = "tracing")]
                    info!(
                        activation_id = %number.activation_id,
                        phone = %number.full_phone_number,
                        country_code = %number.country_code,
                        "Phone number acquired"
                    );

                    return Ok(number);
                }
                Err(e) if !e.should_retry_operation() => {
                    #[cfg(feature = "tracing")]
                    error!(country = %offer.name, error = %e, "Stopping number search");
                    return Err(ActivationServiceError::provider(e));
                }
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    warn!(country = %offer.name, error = %_e, "No number, trying next country");
                }
            }
        }

        Err(ActivationServiceError::CountriesExhausted {
            attempted: offers.len(),
        })
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "activation.wait_for_code",
            skip_all,
            fields(activation_id = %activation_id)
        )
    )]
    async fn wait_for_code(&self, activation_id: &ActivationId) -> Result<SmsCode, Self::Error> {
        let timeout = self.config.code_timeout;
        let poll_interval = self.config.poll_interval;
        let start = Instant::now();
        let mut poll_count = 0u32;

        #[cfg(feature = "tracing")]
        info!(timeout_secs = %timeout.as_secs_f64(), "Waiting for SMS code");

        loop {
            if start.elapsed() >= timeout {
                #[cfg(feature = "tracing")]
                warn!(
                    timeout_secs = %timeout.as_secs_f64(),
                    poll_count,
                    "Timeout reached, cancelling activation"
                );

                if let Err(_e) = self.cancel_activation(activation_id).await {
                    #[cfg(feature = "tracing")]
                    warn!(error = %_e, "Activation not cancelled after timeout");
                }

                return Err(ActivationServiceError::CodeTimeout {
                    timeout,
                    elapsed: start.elapsed(),
                    poll_count,
                    activation_id: activation_id.clone(),
                });
            }

            poll_count += 1;

            match self.provider.get_activation_state(activation_id).await {
                Ok(ActivationState::CodeReceived(code)) => {
                    #[cfg(feature = "tracing")]
                    info!(
                        elapsed_secs = %start.elapsed().as_secs_f64(),
                        poll_count,
                        "SMS code received"
                    );

                    if let Err(_e) = self.provider.finish_activation(activation_id).await {
                        #[cfg(feature = "tracing")]
                        warn!(error = %_e, "Failed to finish activation");
                    }
                    self.forget_quietly(activation_id);

                    return Ok(code);
                }
                Ok(ActivationState::WaitingCode) => {
                    #[cfg(feature = "tracing")]
                    debug!(poll_count, "Waiting for SMS");
                }
                Ok(ActivationState::Cancelled) => {
                    #[cfg(feature = "tracing")]
                    warn!("Activation was cancelled by the provider");

                    self.forget_quietly(activation_id);
                    return Err(ActivationServiceError::ActivationCancelled {
                        activation_id: activation_id.clone(),
                    });
                }
                Err(e) if e.is_terminal_for_activation() => {
                    #[cfg(feature = "tracing")]
                    error!(error = %e, "Activation is gone, polling stopped");

                    self.forget_quietly(activation_id);
                    return Err(ActivationServiceError::provider(e));
                }
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    warn!(error = %_e, "Status request failed, continuing");
                }
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "activation.cancel",
            skip_all,
            fields(activation_id = %activation_id)
        )
    )]
    async fn cancel_activation(&self, activation_id: &ActivationId) -> Result<(), Self::Error> {
        match self
            .registry
            .cancel_gate(activation_id, self.config.min_cancel_age, Utc::now())
        {
            CancelGate::NotTracked => {
                #[cfg(feature = "tracing")]
                warn!("Activation not in registry, cancel not sent");
                return Err(ActivationServiceError::NotTracked {
                    activation_id: activation_id.clone(),
                });
            }
            CancelGate::TooEarly { age, min_age } => {
                #[cfg(feature = "tracing")]
                warn!(age_secs = age.as_secs(), min_age_secs = min_age.as_secs(), "Too early to cancel");
                return Err(ActivationServiceError::CancelTooEarly {
                    activation_id: activation_id.clone(),
                    age,
                    min_age,
                });
            }
            CancelGate::Allowed => {}
        }

        self.provider
            .cancel_activation(activation_id)
            .await
            .map_err(ActivationServiceError::provider)?;

        self.registry.remove(activation_id)?;

        #[cfg(feature = "tracing")]
        info!("Activation cancelled");

        Ok(())
    }

    fn forget(&self, activation_id: &ActivationId) -> Result<bool, Self::Error> {
        Ok(self.registry.remove(activation_id)?)
    }
}

/// Builder for ActivationService.
///
/// # Example
///
/// ```rust,ignore
/// use tg_autoreg::ActivationService;
/// use std::time::Duration;
///
/// let service = ActivationService::builder(provider)
///     .registry_path("state/activations.json")
///     .code_timeout(Duration::from_secs(120))
///     .max_price(40.0)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct ActivationServiceBuilder<P: Provider> {
    provider: P,
    registry: ActivationRegistry,
    config_builder: ActivationServiceConfigBuilder,
}

impl<P: Provider> ActivationServiceBuilder<P> {
    /// Create a new builder with the given provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            registry: ActivationRegistry::default(),
            config_builder: ActivationServiceConfigBuilder::default(),
        }
    }

    pub fn registry(mut self, registry: ActivationRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.registry = ActivationRegistry::new(path);
        self
    }

    /// Default: 90 seconds
    pub fn code_timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.code_timeout(timeout);
        self
    }

    /// Default: 5 seconds
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config_builder = self.config_builder.poll_interval(interval);
        self
    }

    /// Default: 100.0
    pub fn max_price(mut self, price: f64) -> Self {
        self.config_builder = self.config_builder.max_price(price);
        self
    }

    /// Set the full configuration.
    pub fn config(mut self, config: ActivationServiceConfig) -> Self {
        self.config_builder = ActivationServiceConfigBuilder {
            code_timeout: config.code_timeout,
            poll_interval: config.poll_interval,
            min_cancel_age: config.min_cancel_age,
            min_price: config.min_price,
            max_price: config.max_price,
            country_delay: config.country_delay,
        };
        self
    }

    /// Validate the configuration and build the service.
    pub fn build(self) -> Result<ActivationService<P>, ActivationServiceError> {
        let config = self.config_builder.build();
        config.validate()?;
        Ok(ActivationService::new(self.provider, self.registry, config))
    }
}
