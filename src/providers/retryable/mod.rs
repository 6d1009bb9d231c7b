//! Retryable provider wrapper.

use super::traits::Provider;
use crate::errors::RetryableError;
use crate::types::{ActivationId, ActivationState, FullNumber, PriceInfo, ProviderCountry};
use crate::utils::retry::RetryConfig;
use backon::Retryable;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Callback type for retry notifications.
///
/// Receives the error that caused the retry and the delay before the next
/// attempt.
pub type OnRetryCallback<E> = Arc<dyn Fn(&E, Duration) + Send + Sync>;

/// Wrapper that adds automatic retry logic to any Provider.
///
/// Read-only requests (balance, listings, status polls) and number requests
/// are retried while the error reports `is_retryable()`. Finish and cancel
/// are passed through untouched: repeating a status change is the caller's
/// decision.
///
/// # Example
///
/// ```rust,ignore
/// use tg_autoreg::{RetryConfig, SmsRetryableProvider};
/// use tg_autoreg::sms_activate::{SmsActivateClient, SmsActivateProvider};
/// use std::time::Duration;
///
/// let provider = SmsActivateProvider::new(SmsActivateClient::with_api_key("api_key")?);
/// let retry = RetryConfig::default()
///     .with_max_retries(3)
///     .with_min_delay(Duration::from_millis(500));
/// let provider = SmsRetryableProvider::with_config(provider, retry);
/// ```
pub struct SmsRetryableProvider<P: Provider> {
    inner: Arc<P>,
    retry_config: RetryConfig,
    on_retry: Option<OnRetryCallback<P::Error>>,
}

impl<P: Provider> Clone for SmsRetryableProvider<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            retry_config: self.retry_config.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<P: Provider + Debug> Debug for SmsRetryableProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsRetryableProvider")
            .field("inner", &self.inner)
            .field("retry_config", &self.retry_config)
            .field("on_retry", &self.on_retry.as_ref().map(|_| "..."))
            .finish()
    }
}

impl<P: Provider> SmsRetryableProvider<P> {
    /// Wrap a provider with default retry logic.
    pub fn new(inner: P) -> Self {
        Self::with_config(inner, RetryConfig::default())
    }

    /// Wrap a provider with custom retry configuration.
    pub fn with_config(inner: P, retry_config: RetryConfig) -> Self {
        Self {
            inner: Arc::new(inner),
            retry_config,
            on_retry: None,
        }
    }

    /// Set a callback to be invoked on each retry attempt.
    pub fn with_on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&P::Error, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Get reference to the inner provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Get reference to the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    async fn retrying<T, F, Fut>(&self, _operation: &'static str, call: F) -> Result<T, P::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, P::Error>>,
        P::Error: Debug,
    {
        let on_retry = self.on_retry.clone();
        call.retry(self.retry_config.build_strategy())
            .when(|err: &P::Error| err.is_retryable())
            .notify(move |err, duration| {
                if let Some(ref callback) = on_retry {
                    callback(err, duration);
                }

                #[cfg(feature = "tracing")]
                debug!(
                    error = ?err,
                    operation = _operation,
                    retry_after_secs = %duration.as_secs_f64(),
                    "Retrying provider request"
                );
            })
            .await
    }
}

impl<P: Provider> Provider for SmsRetryableProvider<P>
where
    P::Error: Debug,
{
    type Error = P::Error;
    type Service = P::Service;

    async fn get_balance(&self) -> Result<f64, Self::Error> {
        let inner = Arc::clone(&self.inner);
        self.retrying("get_balance", || {
            let inner = Arc::clone(&inner);
            async move { inner.get_balance().await }
        })
        .await
    }

    async fn get_countries(&self) -> Result<Vec<ProviderCountry>, Self::Error> {
        let inner = Arc::clone(&self.inner);
        self.retrying("get_countries", || {
            let inner = Arc::clone(&inner);
            async move { inner.get_countries().await }
        })
        .await
    }

    async fn get_prices(
        &self,
        service: &Self::Service,
    ) -> Result<HashMap<u32, PriceInfo>, Self::Error> {
        let inner = Arc::clone(&self.inner);
        let service = service.clone();
        self.retrying("get_prices", || {
            let inner = Arc::clone(&inner);
            let svc = service.clone();
            async move { inner.get_prices(&svc).await }
        })
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsRetryableProvider::get_phone_number",
            skip_all,
            fields(country_id = country_id)
        )
    )]
    async fn get_phone_number(
        &self,
        country_id: u32,
        service: Self::Service,
    ) -> Result<(ActivationId, FullNumber), Self::Error> {
        let inner = Arc::clone(&self.inner);
        self.retrying("get_phone_number", || {
            let inner = Arc::clone(&inner);
            let svc = service.clone();
            async move { inner.get_phone_number(country_id, svc).await }
        })
        .await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsRetryableProvider::get_activation_state",
            skip_all,
            fields(activation_id = %activation_id)
        )
    )]
    async fn get_activation_state(
        &self,
        activation_id: &ActivationId,
    ) -> Result<ActivationState, Self::Error> {
        let inner = Arc::clone(&self.inner);
        let activation_id = activation_id.clone();
        self.retrying("get_activation_state", || {
            let inner = Arc::clone(&inner);
            let id = activation_id.clone();
            async move { inner.get_activation_state(&id).await }
        })
        .await
    }

    async fn finish_activation(&self, activation_id: &ActivationId) -> Result<(), Self::Error> {
        self.inner.finish_activation(activation_id).await
    }

    async fn cancel_activation(&self, activation_id: &ActivationId) -> Result<(), Self::Error> {
        self.inner.cancel_activation(activation_id).await
    }

    fn service_code(service: &Self::Service) -> String {
        P::service_code(service)
    }
}
