//! Timings of the sign-up flow.

use crate::automation::{DEFAULT_LOOKUP_INTERVAL, DEFAULT_LOOKUP_RETRIES};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CODE_ATTEMPTS: u32 = 60;
pub const DEFAULT_CODE_RETRY_DELAY: Duration = Duration::from_secs(5);
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_DIGIT_LOOKUP_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationConfig {
    /// How many times to wait for the SMS before giving up on the number.
    pub code_attempts: u32,
    /// Pause between two code waits.
    pub code_retry_delay: Duration,
    /// Pause after typing the country code, while the app reformats the field.
    pub phone_settle: Duration,
    /// Pause after typing the code, before checking for a password prompt.
    pub code_settle: Duration,
    pub lookup_retries: u32,
    pub lookup_interval: Duration,
    /// Interval of the single-shot per-digit field lookups.
    pub digit_lookup_interval: Duration,
    /// Where `screen_before_*.png` / `screen_after_*.png` are written.
    pub screenshot_dir: PathBuf,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            code_attempts: DEFAULT_CODE_ATTEMPTS,
            code_retry_delay: DEFAULT_CODE_RETRY_DELAY,
            phone_settle: DEFAULT_SETTLE_DELAY,
            code_settle: DEFAULT_SETTLE_DELAY,
            lookup_retries: DEFAULT_LOOKUP_RETRIES,
            lookup_interval: DEFAULT_LOOKUP_INTERVAL,
            digit_lookup_interval: DEFAULT_DIGIT_LOOKUP_INTERVAL,
            screenshot_dir: PathBuf::from("."),
        }
    }
}

impl RegistrationConfig {
    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    pub fn with_code_attempts(mut self, attempts: u32) -> Self {
        self.code_attempts = attempts;
        self
    }

    /// Drop every pause. Meant for scripted drivers.
    pub fn without_delays(mut self) -> Self {
        self.code_retry_delay = Duration::ZERO;
        self.phone_settle = Duration::ZERO;
        self.code_settle = Duration::ZERO;
        self.lookup_interval = Duration::ZERO;
        self.digit_lookup_interval = Duration::ZERO;
        self
    }
}
