//! W3C WebDriver client for an Appium server.

use super::capabilities::AppiumCapabilities;
use super::driver::{By, ElementId, UiDriver};
use super::error::AppiumError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Method;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Default Appium server address.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4723";

/// HTTP timeout for a single WebDriver command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Key of an element reference in W3C responses.
const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Legacy JSON Wire Protocol element key, still emitted by some drivers.
const LEGACY_ELEMENT_KEY: &str = "ELEMENT";

/// One open Appium session.
///
/// # Example
///
/// ```rust,ignore
/// use tg_autoreg::automation::{AppiumCapabilities, AppiumDriver, By, UiDriver};
///
/// let caps = AppiumCapabilities::telegram("emulator-5554").with_no_reset(false);
/// let driver = AppiumDriver::connect("http://127.0.0.1:4723", &caps).await?;
/// let inputs = driver.find_elements(&By::xpath("//android.widget.EditText")).await?;
/// driver.quit().await?;
/// ```
#[derive(Debug, Clone)]
pub struct AppiumDriver {
    http_client: ClientWithMiddleware,
    base_url: String,
    session_id: String,
}

impl AppiumDriver {
    /// Open a session on the server at `server_url`.
    pub async fn connect(
        server_url: &str,
        capabilities: &AppiumCapabilities,
    ) -> Result<Self, AppiumError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_COMMAND_TIMEOUT)
            .build()
            .map_err(AppiumError::BuildHttpClient)?;

        Self::connect_with(ClientBuilder::new(client).build(), server_url, capabilities).await
    }

    /// Open a session using a preconfigured HTTP client.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "AppiumDriver::connect",
            skip_all,
            fields(server = %server_url, device = %capabilities.device_name)
        )
    )]
    pub async fn connect_with(
        http_client: ClientWithMiddleware,
        server_url: &str,
        capabilities: &AppiumCapabilities,
    ) -> Result<Self, AppiumError> {
        let base_url = Url::parse(server_url)?.as_str().trim_end_matches('/').to_string();

        let body = json!({
            "capabilities": {
                "alwaysMatch": capabilities.to_json(),
                "firstMatch": [{}],
            }
        });

        let value = send(
            &http_client,
            Method::POST,
            format!("{base_url}/session"),
            Some(body),
            "new session",
        )
        .await?;

        let session_id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| AppiumError::UnexpectedResponse {
                command: "new session",
                body: value.to_string(),
            })?
            .to_string();

        #[cfg(feature = "tracing")]
        info!(session_id = %session_id, "Appium session started");

        Ok(Self {
            http_client,
            base_url,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Close the session on the server.
    pub async fn quit(self) -> Result<(), AppiumError> {
        let url = format!("{}/session/{}", self.base_url, self.session_id);
        send(&self.http_client, Method::DELETE, url, None, "delete session").await?;

        #[cfg(feature = "tracing")]
        info!(session_id = %self.session_id, "Appium session closed");

        Ok(())
    }

    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        command: &'static str,
    ) -> Result<Value, AppiumError> {
        let url = format!("{}/session/{}/{}", self.base_url, self.session_id, path);
        send(&self.http_client, method, url, body, command).await
    }
}

impl UiDriver for AppiumDriver {
    async fn find_elements(&self, by: &By) -> Result<Vec<ElementId>, AppiumError> {
        let body = json!({ "using": by.strategy(), "value": by.value() });
        let value = self
            .command(Method::POST, "elements", Some(body), "find elements")
            .await?;

        let items = value
            .as_array()
            .ok_or_else(|| AppiumError::UnexpectedResponse {
                command: "find elements",
                body: value.to_string(),
            })?;

        let elements: Vec<ElementId> = items.iter().filter_map(element_id).collect();

        #[cfg(feature = "tracing")]
        debug!(selector = %by, found = elements.len(), "Elements lookup");

        Ok(elements)
    }

    async fn click(&self, element: &ElementId) -> Result<(), AppiumError> {
        self.command(
            Method::POST,
            &format!("element/{element}/click"),
            Some(json!({})),
            "click",
        )
        .await?;
        Ok(())
    }

    async fn clear(&self, element: &ElementId) -> Result<(), AppiumError> {
        self.command(
            Method::POST,
            &format!("element/{element}/clear"),
            Some(json!({})),
            "clear",
        )
        .await?;
        Ok(())
    }

    async fn send_keys(&self, element: &ElementId, text: &str) -> Result<(), AppiumError> {
        let chars: Vec<String> = text.chars().map(String::from).collect();
        self.command(
            Method::POST,
            &format!("element/{element}/value"),
            Some(json!({ "text": text, "value": chars })),
            "send keys",
        )
        .await?;
        Ok(())
    }

    async fn text(&self, element: &ElementId) -> Result<String, AppiumError> {
        let value = self
            .command(Method::GET, &format!("element/{element}/text"), None, "get text")
            .await?;

        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, AppiumError> {
        let value = self
            .command(Method::GET, "screenshot", None, "screenshot")
            .await?;

        let encoded = value.as_str().ok_or_else(|| AppiumError::UnexpectedResponse {
            command: "screenshot",
            body: value.to_string(),
        })?;

        // Some servers wrap the payload in newlines
        let compact: String = encoded.split_whitespace().collect();
        Ok(STANDARD.decode(compact)?)
    }
}

/// Send one command and unwrap the `value` member of the answer.
async fn send(
    http_client: &ClientWithMiddleware,
    method: Method,
    url: String,
    body: Option<Value>,
    _command: &'static str,
) -> Result<Value, AppiumError> {
    let request = http_client.request(method, url);
    let request = match body {
        Some(body) => request.json(&body),
        None => request,
    };

    let response = request.send().await?;
    let status = response.status();
    let payload: Value = response
        .json()
        .await
        .map_err(AppiumError::ParseResponse)?;

    let value = payload.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        return Err(AppiumError::WebDriver {
            status: status.as_u16(),
            error,
            message,
        });
    }

    #[cfg(feature = "tracing")]
    debug!(command = _command, status = status.as_u16(), "WebDriver command");

    Ok(value)
}

fn element_id(item: &Value) -> Option<ElementId> {
    item.get(W3C_ELEMENT_KEY)
        .or_else(|| item.get(LEGACY_ELEMENT_KEY))
        .and_then(Value::as_str)
        .map(ElementId::new)
}
