//! Element lookups that wait for the screen to settle.

use super::driver::{By, ElementId, UiDriver};
use super::error::AppiumError;
use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Class of every plain label on Android.
pub const TEXT_VIEW_CLASS: &str = "android.widget.TextView";

pub const DEFAULT_LOOKUP_RETRIES: u32 = 2;
pub const DEFAULT_LOOKUP_INTERVAL: Duration = Duration::from_secs(2);

/// Retrying element finder bound to one driver.
///
/// Every lookup runs once and then up to `retries` more times, sleeping
/// `interval` in between, until something matches. A lookup that never
/// matches yields `None` (or an empty list), not an error.
pub struct Finder<'d, D> {
    driver: &'d D,
    retries: u32,
    interval: Duration,
}

impl<D> Clone for Finder<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for Finder<'_, D> {}

impl<'d, D: UiDriver> Finder<'d, D> {
    pub fn new(driver: &'d D) -> Self {
        Self {
            driver,
            retries: DEFAULT_LOOKUP_RETRIES,
            interval: DEFAULT_LOOKUP_INTERVAL,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn driver(&self) -> &'d D {
        self.driver
    }

    /// All elements matching `by`, or an empty list once retries run out.
    pub async fn all(&self, by: &By) -> Result<Vec<ElementId>, AppiumError> {
        let found = self
            .retry(by, async || {
                self.driver
                    .find_elements(by)
                    .await
                    .map(|elements| (!elements.is_empty()).then_some(elements))
            })
            .await?;

        Ok(found.unwrap_or_default())
    }

    /// First element matching `by`.
    pub async fn first(&self, by: &By) -> Result<Option<ElementId>, AppiumError> {
        self.retry(by, async || {
            self.driver
                .find_elements(by)
                .await
                .map(|elements| elements.into_iter().next())
        })
        .await
    }

    pub async fn xpath(&self, xpath: &str) -> Result<Option<ElementId>, AppiumError> {
        self.first(&By::xpath(xpath)).await
    }

    pub async fn id(&self, id: &str) -> Result<Option<ElementId>, AppiumError> {
        self.first(&By::id(id)).await
    }

    /// First label whose text contains `text`, ignoring case.
    pub async fn by_text(&self, text: &str) -> Result<Option<ElementId>, AppiumError> {
        let needle = text.to_lowercase();
        self.retry(&format!("text~{text}"), async || self.label_containing(&needle).await)
            .await
    }

    async fn label_containing(&self, needle: &str) -> Result<Option<ElementId>, AppiumError> {
        let labels = self
            .driver
            .find_elements(&By::class_name(TEXT_VIEW_CLASS))
            .await?;

        for label in labels {
            match self.driver.text(&label).await {
                Ok(text) if text.to_lowercase().contains(needle) => return Ok(Some(label)),
                Ok(_) => {}
                // The label vanished while scanning
                Err(e) if e.is_stale_element() => {}
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    async fn retry<T>(
        &self,
        _what: &dyn Display,
        lookup: impl AsyncFn() -> Result<Option<T>, AppiumError>,
    ) -> Result<Option<T>, AppiumError> {
        let mut attempt = 0;

        loop {
            match lookup().await {
                Ok(Some(found)) => return Ok(Some(found)),
                Ok(None) if attempt >= self.retries => {
                    #[cfg(feature = "tracing")]
                    debug!(selector = %_what, attempts = attempt + 1, "Nothing found");
                    return Ok(None);
                }
                Err(e) if attempt >= self.retries => return Err(e),
                Ok(None) => {}
                Err(_e) => {
                    #[cfg(feature = "tracing")]
                    warn!(selector = %_what, error = %_e, "Lookup failed, retrying");
                }
            }

            attempt += 1;
            tokio::time::sleep(self.interval).await;
        }
    }
}

/// Write a PNG of the current screen to `path`.
pub async fn save_screenshot<D: UiDriver>(driver: &D, path: &Path) -> Result<(), AppiumError> {
    let png = driver.screenshot().await?;
    std::fs::write(path, png).map_err(|source| AppiumError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    #[cfg(feature = "tracing")]
    debug!(path = %path.display(), "Screenshot saved");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::testing::FakeDriver;

    fn quick(driver: &FakeDriver) -> Finder<'_, FakeDriver> {
        Finder::new(driver).with_interval(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_first_returns_first_match() {
        let driver = FakeDriver::default().with(By::xpath("//android.widget.EditText"), &["a", "b"]);

        let found = quick(&driver).xpath("//android.widget.EditText").await.unwrap();

        assert_eq!(found, Some(ElementId::new("a")));
        assert_eq!(driver.lookups(&By::xpath("//android.widget.EditText")), 1);
    }

    #[tokio::test]
    async fn test_missing_element_retries_then_gives_up() {
        let driver = FakeDriver::default();
        let by = By::xpath("//missing");

        let finder = quick(&driver);
        assert_eq!(finder.first(&by).await.unwrap(), None);
        assert_eq!(driver.lookups(&by), 3);

        let none = finder.with_retries(0).all(&by).await.unwrap();
        assert!(none.is_empty());
        assert_eq!(driver.lookups(&by), 4);
    }

    #[tokio::test]
    async fn test_element_appearing_late_is_found() {
        let by = By::id("org.telegram.messenger.web:id/button");
        let driver = FakeDriver::default().with_delayed(by.clone(), &["btn"], 2);

        let found = quick(&driver).first(&by).await.unwrap();

        assert_eq!(found, Some(ElementId::new("btn")));
        assert_eq!(driver.lookups(&by), 3);
    }

    #[tokio::test]
    async fn test_by_text_is_case_insensitive_substring() {
        let driver = FakeDriver::default()
            .with_label("t1", "Welcome")
            .with_label("t2", "START MESSAGING");

        let found = quick(&driver).by_text("Start Messaging").await.unwrap();
        assert_eq!(found, Some(ElementId::new("t2")));

        let missing = quick(&driver).with_retries(0).by_text("Your password").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_save_screenshot_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("screen_before_6281234567890.png");

        save_screenshot(&FakeDriver::default(), &path).await.unwrap();

        assert!(std::fs::read(&path).unwrap().starts_with(b"\x89PNG"));
    }
}
