//! Activation lifecycle: country selection, code polling, finish and cancel.

pub(crate) mod config;
pub(crate) mod error;
pub(crate) mod selection;
pub(crate) mod structure;
pub(crate) mod traits;

pub use config::{
    ActivationServiceConfig, ActivationServiceConfigBuilder, ConfigError, DEFAULT_MAX_PRICE,
    MIN_PRICE_FILTER,
};
pub use error::ActivationServiceError;
pub use selection::{CountryOffer, select_countries};
pub use structure::{
    ActivationService, ActivationServiceBuilder, CleanupReport, PendingActivation,
};
pub use traits::ActivationServiceTrait;
