//! SMS Activate HTTP client.

use super::errors::{Result, SmsActivateError};
use super::response::SmsActivateResponse;
use super::services::Service;
use super::types::{
    ActivationStatus, BalanceResponse, NumberResponse, SetStatusResponse, StatusResponse,
    parse_countries, parse_prices,
};
use crate::types::{ActivationId, PriceInfo, ProviderCountry};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::{Span, debug, error, info};
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Default SMS Activate API URL.
pub const DEFAULT_API_URL: &str = "https://sms-activate.org/stubs/handler_api.php";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Bodies shorter than this that are not `ACCESS*` are treated as a block page.
const MIN_BODY_LEN: usize = 5;

/// HTTP proxy the client should route every request through.
#[derive(Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
}

impl std::fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username.as_ref().map(|_| "[REDACTED]"))
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ProxyConfig {
    /// Proxy without authentication.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            password: None,
        }
    }

    /// Attach basic-auth credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::from(password.into()));
        self
    }

    fn to_reqwest(&self) -> Result<reqwest::Proxy> {
        let proxy = reqwest::Proxy::all(format!("http://{}:{}", self.host, self.port))
            .map_err(SmsActivateError::InvalidProxy)?;

        Ok(match (&self.username, &self.password) {
            (Some(user), Some(pass)) => proxy.basic_auth(user, pass.expose_secret()),
            (Some(user), None) => proxy.basic_auth(user, ""),
            _ => proxy,
        })
    }
}

/// SMS Activate HTTP client.
///
/// Every action is a `GET` against the handler endpoint with `api_key` and
/// `action` query parameters. The client is service-agnostic; the service is
/// passed to the actions that need one.
///
/// # Example
///
/// ```rust,ignore
/// use tg_autoreg::sms_activate::{Service, SmsActivateClient};
///
/// let client = SmsActivateClient::with_api_key("your_api_key")?;
/// let balance = client.get_balance().await?;
/// let number = client.get_number(6, &Service::Telegram).await?;
/// println!("Got number: {}", number.phone_number);
/// ```
#[derive(Clone)]
pub struct SmsActivateClient {
    http_client: ClientWithMiddleware,
    api_key: SecretString,
    endpoint: Url,
}

impl std::fmt::Debug for SmsActivateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsActivateClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Builder for configuring a [`SmsActivateClient`].
pub struct SmsActivateClientBuilder {
    api_key: String,
    endpoint: Option<Url>,
    http_client: Option<ClientWithMiddleware>,
    proxy: Option<ProxyConfig>,
    timeout: Duration,
}

impl SmsActivateClientBuilder {
    /// Create a new builder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: None,
            http_client: None,
            proxy: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set a custom API endpoint.
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set a custom HTTP client with middleware.
    ///
    /// Proxy and timeout settings are ignored when a client is supplied.
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Route requests through an HTTP proxy.
    pub fn proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the [`SmsActivateClient`].
    pub fn build(self) -> Result<SmsActivateClient> {
        let endpoint = match self.endpoint {
            Some(endpoint) => endpoint,
            None => Url::parse(DEFAULT_API_URL)?,
        };

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder().timeout(self.timeout);

                if let Some(proxy) = &self.proxy {
                    #[cfg(feature = "tracing")]
                    info!(host = %proxy.host, port = proxy.port, "Using HTTP proxy");
                    builder = builder.proxy(proxy.to_reqwest()?);
                }

                let client = builder.build().map_err(SmsActivateError::BuildHttpClient)?;
                ClientBuilder::new(client).build()
            }
        };

        Ok(SmsActivateClient {
            http_client,
            api_key: SecretString::from(self.api_key),
            endpoint,
        })
    }
}

impl SmsActivateClient {
    /// Create a new SMS Activate client.
    ///
    /// # Arguments
    /// * `endpoint` - Base URL for the SMS Activate API
    /// * `api_key` - API key for authentication
    pub fn new(endpoint: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        let url = Url::parse(endpoint.as_ref())?;
        Self::builder(api_key).endpoint(url).build()
    }

    /// Create a new client with the default API URL.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    /// Create a builder for configuring the client.
    pub fn builder(api_key: impl Into<String>) -> SmsActivateClientBuilder {
        SmsActivateClientBuilder::new(api_key)
    }

    /// Build request URL with action and parameters.
    fn build_request_url(&self, action: &str, additional: Vec<(&str, String)>) -> Result<Url> {
        let mut endpoint = self.endpoint.clone();

        let mut params: Vec<(&str, String)> = Vec::with_capacity(additional.len() + 2);
        params.push(("api_key", self.api_key.expose_secret().to_string()));
        params.push(("action", action.to_string()));
        params.extend(additional);

        endpoint.set_query(Some(
            &serde_urlencoded::to_string(&params).map_err(SmsActivateError::BuildRequestUrl)?,
        ));

        Ok(endpoint)
    }

    /// Send a GET request and return the trimmed response text.
    ///
    /// Rejects `ERROR:` bodies and suspiciously short bodies before any
    /// action-specific parsing happens.
    async fn send_request(&self, action: &'static str, url: Url) -> Result<String> {
        let response = self.http_client.get(url).send().await.map_err(|e| {
            #[cfg(feature = "tracing")]
            {
                let timed_out = matches!(&e, reqwest_middleware::Error::Reqwest(inner) if inner.is_timeout());
                if timed_out {
                    error!(action, "Timeout while calling SMS Activate");
                } else {
                    error!(action, error = %e, "Connection error, check proxy or VPN");
                }
            }
            SmsActivateError::HttpRequest(e)
        })?;

        let response = response
            .error_for_status()
            .map_err(SmsActivateError::HttpStatus)?;

        let text = response
            .text()
            .await
            .map_err(SmsActivateError::ParseResponse)?;

        let text = text.trim();
        check_body(text)?;

        #[cfg(feature = "tracing")]
        debug!(action, body_len = text.len(), "SMS Activate answered");

        Ok(text.to_string())
    }

    /// Run an action and split the answer into payload or provider error.
    async fn call(&self, action: &'static str, params: Vec<(&str, String)>) -> Result<String> {
        let url = self.build_request_url(action, params)?;
        let text = self.send_request(action, url).await?;

        SmsActivateResponse::from_text(&text)
            .into_result()
            .map_err(SmsActivateError::Service)
    }

    /// Get the account balance.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "SmsActivateClient::get_balance", skip_all)
    )]
    pub async fn get_balance(&self) -> Result<f64> {
        let raw = self.call("getBalance", Vec::new()).await?;

        let balance = BalanceResponse::from_raw(&raw)
            .ok_or(SmsActivateError::UnexpectedResponse {
                action: "getBalance",
                raw,
            })?
            .balance;

        Ok(balance)
    }

    /// List countries known to the provider, sorted by id.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "SmsActivateClient::get_countries", skip_all)
    )]
    pub async fn get_countries(&self) -> Result<Vec<ProviderCountry>> {
        let raw = self.call("getCountries", Vec::new()).await?;
        parse_countries(&raw).map_err(SmsActivateError::DeserializeJson)
    }

    /// Price and stock per country for a service.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsActivateClient::get_prices",
            skip_all,
            fields(service = %service.code())
        )
    )]
    pub async fn get_prices(&self, service: &Service) -> Result<HashMap<u32, PriceInfo>> {
        let raw = self
            .call("getPrices", vec![("service", service.code().to_string())])
            .await?;
        parse_prices(&raw, service.code()).map_err(SmsActivateError::DeserializeJson)
    }

    /// Rent a phone number for a service in a country.
    ///
    /// # Arguments
    /// * `country_id` - SMS Activate numeric country id
    /// * `service` - The service that will send the SMS
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsActivateClient::get_number",
            skip_all,
            fields(
                service = %service.code(),
                country_id = country_id,
                activation_id = tracing::field::Empty,
            )
        )
    )]
    pub async fn get_number(&self, country_id: u32, service: &Service) -> Result<NumberResponse> {
        let raw = self
            .call(
                "getNumber",
                vec![
                    ("service", service.code().to_string()),
                    ("country", country_id.to_string()),
                ],
            )
            .await?;

        let data = NumberResponse::from_raw(&raw).ok_or(SmsActivateError::UnexpectedResponse {
            action: "getNumber",
            raw,
        })?;

        #[cfg(feature = "tracing")]
        {
            Span::current()
                .record("activation_id", data.activation_id.as_ref())
                .set_status(Status::Ok);
        }

        Ok(data)
    }

    /// Poll the status of an activation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsActivateClient::get_status",
            skip_all,
            fields(activation_id = %activation_id)
        )
    )]
    pub async fn get_status(&self, activation_id: &ActivationId) -> Result<StatusResponse> {
        let raw = self
            .call("getStatus", vec![("id", activation_id.to_string())])
            .await?;

        let status = StatusResponse::from_raw(&raw).ok_or(SmsActivateError::UnexpectedResponse {
            action: "getStatus",
            raw,
        })?;

        #[cfg(feature = "tracing")]
        if matches!(status, StatusResponse::Ok { .. }) {
            Span::current().set_status(Status::Ok);
        }

        Ok(status)
    }

    /// Set the final activation status.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsActivateClient::set_status",
            skip_all,
            fields(activation_id = %activation_id, status = %status)
        )
    )]
    pub async fn set_status(
        &self,
        activation_id: &ActivationId,
        status: ActivationStatus,
    ) -> Result<SetStatusResponse> {
        let raw = self
            .call(
                "setStatus",
                vec![
                    ("id", activation_id.to_string()),
                    ("status", status.code().to_string()),
                ],
            )
            .await?;

        let result = SetStatusResponse::from_raw(&raw).ok_or(SmsActivateError::UnexpectedResponse {
            action: "setStatus",
            raw,
        })?;

        #[cfg(feature = "tracing")]
        Span::current().set_status(Status::Ok);

        Ok(result)
    }
}

/// Reject bodies that are errors regardless of the action.
fn check_body(text: &str) -> Result<()> {
    if let Some(message) = text.strip_prefix("ERROR:") {
        return Err(SmsActivateError::Api {
            message: message.trim().to_string(),
        });
    }

    if text.len() < MIN_BODY_LEN && !text.starts_with("ACCESS") {
        return Err(SmsActivateError::SuspiciousResponse {
            body: text.to_string(),
        });
    }

    Ok(())
}
