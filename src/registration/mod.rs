//! Telegram sign-up through the Android UI.

mod config;
mod error;
mod flow;
pub mod screens;

pub use config::{
    DEFAULT_CODE_ATTEMPTS, DEFAULT_CODE_RETRY_DELAY, DEFAULT_DIGIT_LOOKUP_INTERVAL,
    DEFAULT_SETTLE_DELAY, RegistrationConfig,
};
pub use error::RegistrationError;
pub use flow::TelegramRegistrar;
