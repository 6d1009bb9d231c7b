//! Appium session capabilities for the Telegram Android app.

use serde_json::{Value, json};

/// Telegram web-build package installed on the device.
pub const TELEGRAM_APP_PACKAGE: &str = "org.telegram.messenger.web";

/// Launcher activity of the Telegram app.
pub const TELEGRAM_APP_ACTIVITY: &str = "org.telegram.messenger.DefaultIcon";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppiumCapabilities {
    pub device_name: String,
    pub platform_name: String,
    pub app_package: String,
    pub app_activity: String,
    pub automation_name: String,
    /// Keep app data between sessions. A fresh sign-up needs `false`.
    pub no_reset: bool,
    pub auto_grant_permissions: bool,
    /// Seconds of inactivity before Appium drops the session; 0 disables it.
    pub new_command_timeout: u64,
}

impl AppiumCapabilities {
    /// Telegram on the given device, with app data kept.
    pub fn telegram(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            platform_name: "android".to_string(),
            app_package: TELEGRAM_APP_PACKAGE.to_string(),
            app_activity: TELEGRAM_APP_ACTIVITY.to_string(),
            automation_name: "uiautomator2".to_string(),
            no_reset: true,
            auto_grant_permissions: true,
            new_command_timeout: 0,
        }
    }

    pub fn with_no_reset(mut self, no_reset: bool) -> Self {
        self.no_reset = no_reset;
        self
    }

    /// W3C capability map with vendor-prefixed Appium keys.
    pub fn to_json(&self) -> Value {
        json!({
            "platformName": self.platform_name,
            "appium:deviceName": self.device_name,
            "appium:appPackage": self.app_package,
            "appium:appActivity": self.app_activity,
            "appium:automationName": self.automation_name,
            "appium:noReset": self.no_reset,
            "appium:autoGrantPermissions": self.auto_grant_permissions,
            "appium:newCommandTimeout": self.new_command_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_telegram_capabilities() {
        let caps = AppiumCapabilities::telegram("emulator-5554")
            .with_no_reset(false)
            .to_json();

        assert_eq!(caps["platformName"], "android");
        assert_eq!(caps["appium:deviceName"], "emulator-5554");
        assert_eq!(caps["appium:appPackage"], TELEGRAM_APP_PACKAGE);
        assert_eq!(caps["appium:automationName"], "uiautomator2");
        assert_eq!(caps["appium:noReset"], false);
        assert_eq!(caps["appium:newCommandTimeout"], 0);
    }
}
