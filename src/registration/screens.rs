//! Selectors and labels of the Telegram Android sign-up screens.

pub const START_MESSAGING: &str = "Start Messaging";

pub const COUNTRY_CODE_INPUT: &str = r#"//android.widget.EditText[@content-desc="Country code"]"#;
pub const PHONE_NUMBER_INPUT: &str = r#"//android.widget.EditText[@content-desc="Phone number"]"#;

pub const BANNED_NUMBER: &str = "This phone number is banned.";

/// Arrow inside the floating "Done" button.
pub const NEXT_ARROW: &str = r#"//android.widget.FrameLayout[@content-desc="Done"]/android.view.View"#;
pub const DONE_BUTTON: &str = r#"//android.widget.FrameLayout[@content-desc="Done"]"#;

pub const CONFIRM_NUMBER: &str = "Is this the correct number?";
pub const YES: &str = "Yes";

/// First text field on screen: code, then first name.
pub const FIRST_INPUT: &str = "//android.widget.EditText";
pub const LAST_NAME_INPUT: &str = "//android.widget.EditText[2]";

pub const PASSWORD_PROMPT: &str = "Your password";
pub const TERMS_OF_SERVICE: &str = "Terms of Service";

/// Right-hand button of a modal dialog (Accept on the terms, OK on the ban popup).
pub const DIALOG_CONFIRM: &str = "/hierarchy/android.widget.FrameLayout/android.widget.FrameLayout/android.widget.FrameLayout/android.widget.LinearLayout/android.widget.FrameLayout[2]/android.widget.TextView[2]";

pub const INTERNAL_ERROR: &str = "An internal error occurred";
pub const OK_BUTTON: &str = r#"//android.widget.TextView[@text="OK"]"#;

/// Field of the `position`-th code digit, 1-based.
pub fn digit_input(position: usize) -> String {
    format!("//android.widget.EditText[{position}]")
}
