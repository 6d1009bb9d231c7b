//! Reading the login code Telegram sends to the freshly registered app.

use crate::automation::{AppiumError, By, Finder, UiDriver};
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::{error, info};

/// Chat row in the app's chat list. The first one is the Telegram service chat.
pub const CHAT_ROW: &str = "//android.view.ViewGroup";

pub const DEFAULT_CHAT_SETTLE: Duration = Duration::from_secs(2);

static LOGIN_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{5}").unwrap());

/// First five-digit run in `text`.
pub fn extract_login_code(text: &str) -> Option<&str> {
    LOGIN_CODE.find(text).map(|m| m.as_str())
}

/// Open the service chat and read the code from its last message.
///
/// Returns `None` when the chat shows no five-digit code.
pub async fn read_login_code<D: UiDriver>(
    finder: &Finder<'_, D>,
    settle: Duration,
) -> Result<Option<String>, AppiumError> {
    let driver = finder.driver();
    let chat = By::xpath(CHAT_ROW);

    if let Some(service_chat) = finder.first(&chat).await? {
        driver.click(&service_chat).await?;
    }

    tokio::time::sleep(settle).await;

    let Some(last) = finder.all(&chat).await?.pop() else {
        return Ok(None);
    };

    let text = driver.text(&last).await?;
    match extract_login_code(&text) {
        Some(code) => {
            #[cfg(feature = "tracing")]
            info!(code, "Login code read from the app");
            Ok(Some(code.to_string()))
        }
        None => {
            #[cfg(feature = "tracing")]
            error!("No five-digit code in the last message");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::testing::FakeDriver;

    #[test]
    fn test_extract_login_code() {
        assert_eq!(
            extract_login_code("Login code: 48213. Do not give this code to anyone"),
            Some("48213")
        );
        assert_eq!(extract_login_code("code 1234"), None);
        assert_eq!(extract_login_code("123456"), Some("12345"));
    }

    #[tokio::test]
    async fn test_read_login_code_from_last_row() {
        let driver = FakeDriver::default()
            .with(By::xpath(CHAT_ROW), &["row-1", "row-2", "row-3"])
            .with_text("row-3", "Telegram\nLogin code: 70921. Do not give this code to anyone");
        let finder = Finder::new(&driver).with_interval(Duration::ZERO);

        let code = read_login_code(&finder, Duration::ZERO).await.unwrap();

        assert_eq!(code.as_deref(), Some("70921"));
        assert!(driver.clicked("row-1"));
    }

    #[tokio::test]
    async fn test_read_login_code_without_code() {
        let driver = FakeDriver::default()
            .with(By::xpath(CHAT_ROW), &["row-1"])
            .with_text("row-1", "Welcome to Telegram");
        let finder = Finder::new(&driver).with_interval(Duration::ZERO);

        assert_eq!(read_login_code(&finder, Duration::ZERO).await.unwrap(), None);
    }
}
