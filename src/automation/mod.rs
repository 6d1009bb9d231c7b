//! Appium plumbing: a WebDriver client, the driver seam the UI flows run
//! against, and retrying element lookups.

mod appium;
mod capabilities;
mod driver;
mod error;
mod locator;

#[cfg(test)]
pub(crate) mod testing;

pub use appium::{AppiumDriver, DEFAULT_COMMAND_TIMEOUT, DEFAULT_SERVER_URL};
pub use capabilities::{AppiumCapabilities, TELEGRAM_APP_ACTIVITY, TELEGRAM_APP_PACKAGE};
pub use driver::{By, ElementId, UiDriver};
pub use error::AppiumError;
pub use locator::{
    DEFAULT_LOOKUP_INTERVAL, DEFAULT_LOOKUP_RETRIES, Finder, TEXT_VIEW_CLASS, save_screenshot,
};
