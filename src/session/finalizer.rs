//! Sign in to the new account and keep its session.

use super::client::{LoginClient, SignedInUser};
use super::code::{DEFAULT_CHAT_SETTLE, read_login_code};
use crate::automation::{
    AppiumError, DEFAULT_LOOKUP_INTERVAL, DEFAULT_LOOKUP_RETRIES, Finder, UiDriver,
};
use crate::service::ActivationServiceTrait;
use crate::types::NumberGet;
use std::error::Error as StdError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::{Span, info, warn};
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

#[derive(Debug, Error)]
pub enum SessionError {
    /// A Telegram client call failed.
    #[error("Telegram client failed to {stage}: {source}")]
    Client {
        stage: &'static str,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("UI driver error: {0}")]
    Driver(#[from] AppiumError),

    #[error("No login code found in the app")]
    CodeNotFound,
}

impl SessionError {
    fn client<E: StdError + Send + Sync + 'static>(stage: &'static str) -> impl FnOnce(E) -> Self {
        move |e| SessionError::Client {
            stage,
            source: Box::new(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory holding `<full number>.session` files.
    pub session_dir: PathBuf,
    /// Pause after opening the service chat.
    pub chat_settle: Duration,
    pub lookup_retries: u32,
    pub lookup_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_dir: PathBuf::from("."),
            chat_settle: DEFAULT_CHAT_SETTLE,
            lookup_retries: DEFAULT_LOOKUP_RETRIES,
            lookup_interval: DEFAULT_LOOKUP_INTERVAL,
        }
    }
}

impl SessionConfig {
    pub fn with_session_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_dir = dir.into();
        self
    }

    /// Session file of `number`.
    pub fn session_path(&self, number: &NumberGet) -> PathBuf {
        self.session_dir
            .join(format!("{}.session", number.full_phone_number))
    }
}

/// Logs a client into the account just registered on the device.
///
/// The login code is read off the device screen, where Telegram delivers it
/// to the already signed-in app.
pub struct SessionFinalizer<'a, D, S> {
    driver: &'a D,
    service: &'a S,
    config: SessionConfig,
}

impl<'a, D, S> SessionFinalizer<'a, D, S>
where
    D: UiDriver,
    S: ActivationServiceTrait,
{
    pub fn new(driver: &'a D, service: &'a S, config: SessionConfig) -> Self {
        Self {
            driver,
            service,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Request a code, read it from the app, sign in and save the session.
    ///
    /// The activation record is dropped once the session is on disk.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "session.finalize",
            skip_all,
            fields(phone = %number.full_phone_number)
        )
    )]
    pub async fn finalize<C: LoginClient>(
        &self,
        client: &mut C,
        number: &NumberGet,
    ) -> Result<SignedInUser, SessionError> {
        client
            .request_login_code(&number.full_phone_number.with_plus_prefix())
            .await
            .map_err(SessionError::client("request a login code"))?;

        let finder = Finder::new(self.driver)
            .with_retries(self.config.lookup_retries)
            .with_interval(self.config.lookup_interval);
        let code = read_login_code(&finder, self.config.chat_settle)
            .await?
            .ok_or(SessionError::CodeNotFound)?;

        let user = client
            .sign_in(&code)
            .await
            .map_err(SessionError::client("sign in"))?;

        client
            .save_session()
            .map_err(SessionError::client("save the session"))?;

        #[cfg(feature = "tracing")]
        {
            info!(
                session = %self.config.session_path(number).display(),
                first_name = %user.first_name,
                "Session saved"
            );
            Span::current().set_status(Status::Ok);
        }

        if let Err(_e) = self.service.forget(&number.activation_id) {
            #[cfg(feature = "tracing")]
            warn!(error = %_e, "Activation record not removed");
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::By;
    use crate::automation::testing::FakeDriver;
    use crate::service::ActivationServiceError;
    use crate::session::code::CHAT_ROW;
    use crate::types::{ActivationId, FullNumber, SmsCode};
    use std::sync::Mutex;

    #[derive(Debug, Error)]
    #[error("flood wait")]
    struct FloodWait;

    #[derive(Default)]
    struct FakeClient {
        phone: Option<String>,
        code: Option<String>,
        fail_sign_in: bool,
    }

    impl LoginClient for FakeClient {
        type Error = FloodWait;

        async fn request_login_code(&mut self, phone: &str) -> Result<(), FloodWait> {
            self.phone = Some(phone.to_string());
            Ok(())
        }

        async fn sign_in(&mut self, code: &str) -> Result<SignedInUser, FloodWait> {
            if self.fail_sign_in {
                return Err(FloodWait);
            }
            self.code = Some(code.to_string());
            Ok(SignedInUser {
                first_name: "Artem".to_string(),
            })
        }

        fn save_session(&self) -> Result<(), FloodWait> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeService {
        forgotten: Mutex<Vec<ActivationId>>,
    }

    impl ActivationServiceTrait for FakeService {
        type Error = ActivationServiceError;
        type Service = String;

        async fn acquire_number(&self, _service: String) -> Result<NumberGet, Self::Error> {
            Ok(number())
        }

        async fn wait_for_code(&self, _id: &ActivationId) -> Result<SmsCode, Self::Error> {
            Ok(SmsCode::new("00000"))
        }

        async fn cancel_activation(&self, _id: &ActivationId) -> Result<(), Self::Error> {
            Ok(())
        }

        fn forget(&self, id: &ActivationId) -> Result<bool, Self::Error> {
            self.forgotten.lock().unwrap().push(id.clone());
            Ok(true)
        }
    }

    fn number() -> NumberGet {
        NumberGet::new(ActivationId::from("42"), FullNumber::new("6281234567"), "62")
    }

    fn chat_driver(last_message: &str) -> FakeDriver {
        FakeDriver::default()
            .with(By::xpath(CHAT_ROW), &["row-1", "row-2"])
            .with_text("row-2", last_message)
    }

    fn config() -> SessionConfig {
        SessionConfig {
            chat_settle: Duration::ZERO,
            lookup_interval: Duration::ZERO,
            ..SessionConfig::default()
        }
    }

    #[tokio::test]
    async fn test_finalize_signs_in_and_forgets() {
        let driver = chat_driver("Login code: 31337. Do not give this code to anyone");
        let service = FakeService::default();
        let mut client = FakeClient::default();

        let user = SessionFinalizer::new(&driver, &service, config())
            .finalize(&mut client, &number())
            .await
            .unwrap();

        assert_eq!(user.first_name, "Artem");
        assert_eq!(client.phone.as_deref(), Some("+6281234567"));
        assert_eq!(client.code.as_deref(), Some("31337"));
        assert_eq!(*service.forgotten.lock().unwrap(), vec![ActivationId::from("42")]);
    }

    #[tokio::test]
    async fn test_finalize_without_code() {
        let driver = chat_driver("Welcome!");
        let service = FakeService::default();
        let mut client = FakeClient::default();

        let err = SessionFinalizer::new(&driver, &service, config())
            .finalize(&mut client, &number())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::CodeNotFound));
        assert!(client.code.is_none());
        assert!(service.forgotten.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_finalize_reports_client_stage() {
        let driver = chat_driver("Login code: 31337");
        let service = FakeService::default();
        let mut client = FakeClient {
            fail_sign_in: true,
            ..FakeClient::default()
        };

        let err = SessionFinalizer::new(&driver, &service, config())
            .finalize(&mut client, &number())
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Client { stage: "sign in", .. }));
        assert!(service.forgotten.lock().unwrap().is_empty());
    }

    #[test]
    fn test_session_path_uses_full_number() {
        let config = SessionConfig::default().with_session_dir("sessions");
        assert_eq!(
            config.session_path(&number()),
            PathBuf::from("sessions").join("6281234567.session")
        );
    }
}
