//! Errors raised while talking to the Appium server.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppiumError {
    /// Server URL could not be parsed.
    #[error("Invalid Appium server URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// Request never got an answer (connection refused, timeout).
    #[error("Failed to reach Appium server: {0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Answer body was not the JSON we expected.
    #[error("Failed to read Appium response: {0}")]
    ParseResponse(#[source] reqwest::Error),

    /// The server reported a WebDriver error.
    #[error("WebDriver error '{error}' (HTTP {status}): {message}")]
    WebDriver {
        status: u16,
        error: String,
        message: String,
    },

    /// A successful answer was missing an expected field.
    #[error("Unexpected Appium response to {command}: {body}")]
    UnexpectedResponse { command: &'static str, body: String },

    /// Screenshot payload was not valid base64.
    #[error("Failed to decode screenshot: {0}")]
    DecodeScreenshot(#[from] base64::DecodeError),

    /// Screenshot file could not be written.
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppiumError {
    /// The element handle is gone, usually after the screen changed.
    pub fn is_stale_element(&self) -> bool {
        matches!(self, Self::WebDriver { error, .. } if error == "stale element reference")
    }
}
