//! # tg-autoreg
//!
//! Automated Telegram account registration with rented phone numbers.
//!
//! A number is rented from SMS-Activate, typed into the Telegram Android app
//! through an Appium server, confirmed with the SMS code read back from the
//! provider, and finally signed in with a Telegram client so the session
//! file can be kept.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tg_autoreg::automation::{AppiumCapabilities, AppiumDriver};
//! use tg_autoreg::registration::TelegramRegistrar;
//! use tg_autoreg::sms_activate::{Service, SmsActivateClient, SmsActivateProvider};
//! use tg_autoreg::{ActivationService, ActivationServiceTrait, RegisterUserData};
//!
//! let client = SmsActivateClient::with_api_key("api_key")?;
//! let service = ActivationService::builder(SmsActivateProvider::new(client)).build()?;
//!
//! let number = service.acquire_number(Service::Telegram).await?;
//!
//! let caps = AppiumCapabilities::telegram("emulator-5554").with_no_reset(false);
//! let driver = AppiumDriver::connect("http://127.0.0.1:4723", &caps).await?;
//!
//! TelegramRegistrar::new(&driver, &service)
//!     .register(&number, &RegisterUserData::new("Artem", ""))
//!     .await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! TelegramRegistrar / SessionFinalizer   (UI flows, generic over UiDriver)
//!         │
//!         ▼
//! ActivationService<P>  ──►  ActivationRegistry  (activations.json)
//!         │
//!         ▼
//! SmsRetryableProvider<P>  (optional retry wrapper)
//!         │
//!         ▼
//!     Provider          (trait: SmsActivateProvider)
//! ```
//!
//! ## Features
//!
//! - `tracing` - spans and logs with OpenTelemetry status (enabled by default)
//! - `telegram` - grammers-backed session finalizer (enabled by default)
//! - `cli` - the `tg-autoreg` binary (enabled by default)

pub mod automation;
pub mod errors;
pub mod providers;
pub mod registration;
pub mod registry;
pub mod service;
pub mod session;
pub mod types;
mod utils;

// Re-export commonly used types at the crate root
pub use errors::RetryableError;
pub use providers::sms_activate;
pub use providers::{Provider, SmsRetryableProvider};
pub use registry::{ActivationRecord, ActivationRegistry, CancelGate, RegistryError};
pub use service::{
    ActivationService, ActivationServiceConfig, ActivationServiceError, ActivationServiceTrait,
};
pub use types::{ActivationId, DialCode, FullNumber, NumberGet, RegisterUserData, SmsCode};
pub use utils::retry::RetryConfig;
