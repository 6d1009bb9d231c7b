//! Sign-up of a rented number in the Telegram Android app.

use super::config::RegistrationConfig;
use super::error::RegistrationError;
use super::screens;
use crate::automation::{By, ElementId, Finder, UiDriver, save_screenshot};
use crate::service::{ActivationServiceError, ActivationServiceTrait};
use crate::types::{NumberGet, RegisterUserData, SmsCode};
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::{Span, debug, error, info, warn};
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Walks the app from the welcome screen to a registered account.
///
/// The flow only reacts to what is on screen: every step looks for its
/// element and skips itself when the element is absent. The activation is
/// cancelled (subject to the provider's minimum age) whenever Telegram
/// rejects the number.
pub struct TelegramRegistrar<'a, D, S> {
    driver: &'a D,
    service: &'a S,
    config: RegistrationConfig,
}

impl<'a, D, S> TelegramRegistrar<'a, D, S>
where
    D: UiDriver,
    S: ActivationServiceTrait<Error = ActivationServiceError>,
{
    pub fn new(driver: &'a D, service: &'a S) -> Self {
        Self::with_config(driver, service, RegistrationConfig::default())
    }

    pub fn with_config(driver: &'a D, service: &'a S, config: RegistrationConfig) -> Self {
        Self {
            driver,
            service,
            config,
        }
    }

    pub fn config(&self) -> &RegistrationConfig {
        &self.config
    }

    fn finder(&self) -> Finder<'a, D> {
        Finder::new(self.driver)
            .with_retries(self.config.lookup_retries)
            .with_interval(self.config.lookup_interval)
    }

    /// Register `number` with the given profile.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "registration.register",
            skip_all,
            fields(
                activation_id = %number.activation_id,
                phone = %number.full_phone_number
            )
        )
    )]
    pub async fn register(
        &self,
        number: &NumberGet,
        user: &RegisterUserData,
    ) -> Result<(), RegistrationError> {
        let finder = self.finder();

        if let Some(start) = finder.by_text(screens::START_MESSAGING).await? {
            #[cfg(feature = "tracing")]
            info!("Start Messaging button found");
            self.driver.click(&start).await?;
        }

        if let Some(input) = finder.xpath(screens::COUNTRY_CODE_INPUT).await? {
            self.driver.clear(&input).await?;
            self.driver.send_keys(&input, &number.country_code).await?;
        }

        tokio::time::sleep(self.config.phone_settle).await;

        if let Some(input) = finder.xpath(screens::PHONE_NUMBER_INPUT).await? {
            self.driver.clear(&input).await?;
            self.driver.send_keys(&input, &number.phone_number).await?;
        }

        if finder.by_text(screens::BANNED_NUMBER).await?.is_some() {
            #[cfg(feature = "tracing")]
            error!("Number is banned in Telegram");
            self.abandon(number).await;
            return Err(RegistrationError::PhoneBanned {
                number: number.full_phone_number.clone(),
            });
        }

        let before = self.screenshot_path("screen_before", number);
        #[cfg(feature = "tracing")]
        info!(path = %before.display(), "Taking screenshot before submitting the number");
        if let Err(_e) = save_screenshot(self.driver, &before).await {
            #[cfg(feature = "tracing")]
            warn!(error = %_e, "Screenshot not saved");
        }

        let next = match finder.xpath(screens::NEXT_ARROW).await? {
            Some(arrow) => Some(arrow),
            None => finder.xpath(screens::DONE_BUTTON).await?,
        };
        let Some(next) = next else {
            #[cfg(feature = "tracing")]
            error!("Next button not found");
            self.abandon(number).await;
            return Err(RegistrationError::NextButtonMissing);
        };
        self.driver.click(&next).await?;

        if finder.by_text(screens::CONFIRM_NUMBER).await?.is_some() {
            let yes = match finder.xpath(screens::DONE_BUTTON).await? {
                Some(done) => Some(done),
                None => finder.by_text(screens::YES).await?,
            };
            if let Some(yes) = yes {
                self.driver.click(&yes).await?;
            }
        }

        let Some(code_input) = finder.xpath(screens::FIRST_INPUT).await? else {
            self.dismiss_rejection(&finder).await?;
            remove_screenshot(&before);
            self.abandon(number).await;
            return Err(RegistrationError::CodeInputMissing {
                number: number.full_phone_number.clone(),
            });
        };

        let code = self.receive_code(number).await?;

        #[cfg(feature = "tracing")]
        info!("Typing the code");
        if let Err(_e) = self.type_code(&code_input, &code).await {
            #[cfg(feature = "tracing")]
            error!(error = %_e, "Failed to type the code");
        }

        tokio::time::sleep(self.config.code_settle).await;

        if finder.by_text(screens::PASSWORD_PROMPT).await?.is_some() {
            #[cfg(feature = "tracing")]
            error!("Number is protected by a cloud password, registration impossible");

            let after = self.screenshot_path("screen_after", number);
            if let Err(_e) = save_screenshot(self.driver, &after).await {
                #[cfg(feature = "tracing")]
                warn!(error = %_e, "Screenshot not saved");
            }
            self.abandon(number).await;
            return Err(RegistrationError::PasswordProtected {
                number: number.full_phone_number.clone(),
            });
        }

        remove_screenshot(&before);
        self.fill_profile(&finder, user).await?;

        if finder.by_text(screens::TERMS_OF_SERVICE).await?.is_some() {
            if let Some(accept) = finder.xpath(screens::DIALOG_CONFIRM).await? {
                self.driver.click(&accept).await?;
            }
        }

        #[cfg(feature = "tracing")]
        {
            info!("Registration finished");
            Span::current().set_status(Status::Ok);
        }

        Ok(())
    }

    /// Wait for the SMS, giving the provider several timeout windows.
    async fn receive_code(&self, number: &NumberGet) -> Result<SmsCode, RegistrationError> {
        let attempts = self.config.code_attempts;

        for _attempt in 1..=attempts {
            #[cfg(feature = "tracing")]
            info!(attempt = _attempt, "Waiting for the SMS code");

            match self.service.wait_for_code(&number.activation_id).await {
                Ok(code) => return Ok(code),
                Err(ActivationServiceError::CodeTimeout { .. }) => {}
                Err(e) => return Err(e.into()),
            }

            tokio::time::sleep(self.config.code_retry_delay).await;
        }

        Err(RegistrationError::CodeNotReceived { attempts })
    }

    /// One digit per field when the app shows split inputs, otherwise the
    /// remaining digits go into `fallback`.
    async fn type_code(&self, fallback: &ElementId, code: &SmsCode) -> Result<(), RegistrationError> {
        let digits = Finder::new(self.driver)
            .with_retries(0)
            .with_interval(self.config.digit_lookup_interval);

        for (position, (offset, digit)) in code.as_str().char_indices().enumerate() {
            let field = digits.first(&By::xpath(screens::digit_input(position + 1))).await?;
            match field {
                Some(field) => self.driver.send_keys(&field, &digit.to_string()).await?,
                None => {
                    #[cfg(feature = "tracing")]
                    debug!(position = position + 1, "No split input, typing the rest at once");
                    self.driver.send_keys(fallback, &code.as_str()[offset..]).await?;
                    break;
                }
            }
        }

        Ok(())
    }

    async fn fill_profile(
        &self,
        finder: &Finder<'a, D>,
        user: &RegisterUserData,
    ) -> Result<(), RegistrationError> {
        let Some(first_name) = finder.xpath(screens::FIRST_INPUT).await? else {
            return Ok(());
        };
        self.driver.send_keys(&first_name, &user.first_name).await?;

        let last_name = finder
            .with_retries(0)
            .xpath(screens::LAST_NAME_INPUT)
            .await?;
        if let Some(last_name) = last_name {
            self.driver.send_keys(&last_name, &user.last_name).await?;
        }

        if let Some(done) = finder.xpath(screens::DONE_BUTTON).await? {
            self.driver.click(&done).await?;
        }

        Ok(())
    }

    /// Close the ban popup or the internal-error dialog, whichever is shown.
    async fn dismiss_rejection(&self, finder: &Finder<'a, D>) -> Result<(), RegistrationError> {
        if let Some(ok) = finder.xpath(screens::DIALOG_CONFIRM).await? {
            #[cfg(feature = "tracing")]
            info!("Ban popup shown");
            self.driver.click(&ok).await?;
        }

        if finder.by_text(screens::INTERNAL_ERROR).await?.is_some() {
            #[cfg(feature = "tracing")]
            info!("Telegram internal error");
            if let Some(ok) = finder.xpath(screens::OK_BUTTON).await? {
                self.driver.click(&ok).await?;
            }
        }

        Ok(())
    }

    /// Release the number; a refused cancel leaves it for `cleanup`.
    async fn abandon(&self, number: &NumberGet) {
        if let Err(_e) = self.service.cancel_activation(&number.activation_id).await {
            #[cfg(feature = "tracing")]
            warn!(error = %_e, "Activation not cancelled");
        }
    }

    fn screenshot_path(&self, stage: &str, number: &NumberGet) -> PathBuf {
        self.config
            .screenshot_dir
            .join(format!("{stage}_{}.png", number.full_phone_number))
    }
}

fn remove_screenshot(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(_e) => {
            #[cfg(feature = "tracing")]
            warn!(path = %path.display(), error = %_e, "Screenshot not removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automation::testing::FakeDriver;
    use crate::types::{ActivationId, FullNumber};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeService {
        codes: Mutex<VecDeque<Result<SmsCode, ActivationServiceError>>>,
        waits: Mutex<u32>,
        cancelled: Mutex<Vec<ActivationId>>,
    }

    impl FakeService {
        fn answering(answers: Vec<Result<SmsCode, ActivationServiceError>>) -> Self {
            Self {
                codes: Mutex::new(answers.into()),
                ..Self::default()
            }
        }

        fn cancelled(&self) -> Vec<ActivationId> {
            self.cancelled.lock().unwrap().clone()
        }
    }

    fn timeout() -> ActivationServiceError {
        ActivationServiceError::CodeTimeout {
            timeout: Duration::from_secs(90),
            elapsed: Duration::from_secs(90),
            poll_count: 18,
            activation_id: ActivationId::from("42"),
        }
    }

    impl ActivationServiceTrait for FakeService {
        type Error = ActivationServiceError;
        type Service = String;

        async fn acquire_number(&self, _service: String) -> Result<NumberGet, Self::Error> {
            Ok(number())
        }

        async fn wait_for_code(&self, _id: &ActivationId) -> Result<SmsCode, Self::Error> {
            *self.waits.lock().unwrap() += 1;
            self.codes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(timeout()))
        }

        async fn cancel_activation(&self, id: &ActivationId) -> Result<(), Self::Error> {
            self.cancelled.lock().unwrap().push(id.clone());
            Ok(())
        }

        fn forget(&self, _id: &ActivationId) -> Result<bool, Self::Error> {
            Ok(true)
        }
    }

    fn number() -> NumberGet {
        NumberGet::new(ActivationId::from("42"), FullNumber::new("6281234567"), "62")
    }

    fn user() -> RegisterUserData {
        RegisterUserData::new("Artem", "Petrov")
    }

    /// Screens of a number that goes through without surprises.
    fn happy_driver() -> FakeDriver {
        FakeDriver::default()
            .with_label("start", "Start Messaging")
            .with_label("tos", "Terms of Service")
            .with(By::xpath(screens::COUNTRY_CODE_INPUT), &["cc"])
            .with(By::xpath(screens::PHONE_NUMBER_INPUT), &["phone"])
            .with(By::xpath(screens::NEXT_ARROW), &["next"])
            .with(By::xpath(screens::DONE_BUTTON), &["done"])
            .with(By::xpath(screens::FIRST_INPUT), &["input-1", "input-2"])
            .with(By::xpath(screens::DIALOG_CONFIRM), &["accept"])
    }

    fn config(dir: &std::path::Path) -> RegistrationConfig {
        RegistrationConfig::default()
            .without_delays()
            .with_screenshot_dir(dir)
    }

    #[tokio::test]
    async fn test_register_happy_path() {
        let dir = tempfile::tempdir().unwrap();
        // `EditText[2]` is both the second code cell and the last name field
        let driver = happy_driver()
            .with(By::xpath(screens::LAST_NAME_INPUT), &["input-2"])
            .with(By::xpath(screens::digit_input(1)), &["d1"])
            .with(By::xpath(screens::digit_input(3)), &["d3"])
            .with(By::xpath(screens::digit_input(4)), &["d4"])
            .with(By::xpath(screens::digit_input(5)), &["d5"]);
        let service = FakeService::answering(vec![Ok(SmsCode::new("12345"))]);
        let registrar = TelegramRegistrar::with_config(&driver, &service, config(dir.path()));

        registrar.register(&number(), &user()).await.unwrap();

        assert!(driver.clicked("start"));
        assert_eq!(driver.typed("cc"), "62");
        assert_eq!(driver.typed("phone"), "81234567");
        assert!(driver.clicked("next"));
        let digits: String = ["d1", "d3", "d4", "d5"]
            .iter()
            .map(|id| driver.typed(id))
            .collect();
        assert_eq!(digits, "1345");
        assert_eq!(driver.typed("input-2"), "2Petrov");
        assert_eq!(driver.typed("input-1"), "Artem");
        assert!(driver.clicked("done"));
        assert!(driver.clicked("accept"));
        assert!(service.cancelled().is_empty());
        assert!(!dir.path().join("screen_before_6281234567.png").exists());
    }

    #[tokio::test]
    async fn test_code_falls_back_to_single_input() {
        let dir = tempfile::tempdir().unwrap();
        let driver = happy_driver().with(By::xpath(screens::digit_input(1)), &["d1"]);
        let service = FakeService::answering(vec![Ok(SmsCode::new("12345"))]);
        let registrar = TelegramRegistrar::with_config(&driver, &service, config(dir.path()));

        registrar.register(&number(), &user()).await.unwrap();

        assert_eq!(driver.typed("d1"), "1");
        assert!(driver.typed("input-1").starts_with("2345"));
    }

    #[tokio::test]
    async fn test_banned_number_is_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let driver = happy_driver().with_label("ban", "This phone number is banned.");
        let service = FakeService::default();
        let registrar = TelegramRegistrar::with_config(&driver, &service, config(dir.path()));

        let err = registrar.register(&number(), &user()).await.unwrap_err();

        assert!(matches!(err, RegistrationError::PhoneBanned { .. }));
        assert_eq!(service.cancelled(), vec![ActivationId::from("42")]);
        assert!(!driver.clicked("next"));
    }

    #[tokio::test]
    async fn test_missing_next_button_is_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FakeDriver::default()
            .with(By::xpath(screens::COUNTRY_CODE_INPUT), &["cc"])
            .with(By::xpath(screens::PHONE_NUMBER_INPUT), &["phone"]);
        let service = FakeService::default();
        let registrar = TelegramRegistrar::with_config(&driver, &service, config(dir.path()));

        let err = registrar.register(&number(), &user()).await.unwrap_err();

        assert!(matches!(err, RegistrationError::NextButtonMissing));
        assert_eq!(service.cancelled().len(), 1);
        assert!(dir.path().join("screen_before_6281234567.png").exists());
    }

    #[tokio::test]
    async fn test_rejected_number_dismisses_dialogs() {
        let dir = tempfile::tempdir().unwrap();
        let driver = FakeDriver::default()
            .with(By::xpath(screens::NEXT_ARROW), &["next"])
            .with(By::xpath(screens::DIALOG_CONFIRM), &["ban-ok"])
            .with_label("err", "An internal error occurred. Please try again later.")
            .with(By::xpath(screens::OK_BUTTON), &["ok"]);
        let service = FakeService::default();
        let registrar = TelegramRegistrar::with_config(&driver, &service, config(dir.path()));

        let err = registrar.register(&number(), &user()).await.unwrap_err();

        assert!(matches!(err, RegistrationError::CodeInputMissing { .. }));
        assert!(driver.clicked("ban-ok"));
        assert!(driver.clicked("ok"));
        assert_eq!(service.cancelled().len(), 1);
        assert!(!dir.path().join("screen_before_6281234567.png").exists());
    }

    #[tokio::test]
    async fn test_password_prompt_is_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let driver = happy_driver().with_label("pwd", "Your Password");
        let service = FakeService::answering(vec![Ok(SmsCode::new("12345"))]);
        let registrar = TelegramRegistrar::with_config(&driver, &service, config(dir.path()));

        let err = registrar.register(&number(), &user()).await.unwrap_err();

        assert!(matches!(err, RegistrationError::PasswordProtected { .. }));
        assert_eq!(service.cancelled().len(), 1);
        assert!(dir.path().join("screen_after_6281234567.png").exists());
        assert!(driver.typed("input-1").starts_with("12345"));
        assert!(!driver.clicked("accept"));
    }

    #[tokio::test]
    async fn test_code_wait_retries_only_timeouts() {
        let dir = tempfile::tempdir().unwrap();
        let driver = happy_driver();
        let service = FakeService::answering(vec![Err(timeout()), Ok(SmsCode::new("55555"))]);
        let registrar = TelegramRegistrar::with_config(&driver, &service, config(dir.path()));

        registrar.register(&number(), &user()).await.unwrap();
        assert_eq!(*service.waits.lock().unwrap(), 2);

        let service = FakeService::answering(vec![Err(
            ActivationServiceError::ActivationCancelled {
                activation_id: ActivationId::from("42"),
            },
        )]);
        let registrar = TelegramRegistrar::with_config(&driver, &service, config(dir.path()));

        let err = registrar.register(&number(), &user()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Service(ActivationServiceError::ActivationCancelled { .. })
        ));
        assert_eq!(*service.waits.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_code_attempts_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let driver = happy_driver();
        let service = FakeService::default();
        let registrar = TelegramRegistrar::with_config(
            &driver,
            &service,
            config(dir.path()).with_code_attempts(3),
        );

        let err = registrar.register(&number(), &user()).await.unwrap_err();

        assert!(matches!(err, RegistrationError::CodeNotReceived { attempts: 3 }));
        assert_eq!(*service.waits.lock().unwrap(), 3);
    }
}
