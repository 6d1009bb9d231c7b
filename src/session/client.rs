//! Telegram client seam used to sign in and persist the session.

use std::error::Error as StdError;

/// Account reported by a successful sign-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInUser {
    pub first_name: String,
}

/// The calls the finalizer makes on a Telegram client library.
#[allow(async_fn_in_trait)]
pub trait LoginClient {
    type Error: StdError + Send + Sync + 'static;

    /// Ask Telegram to send a login code to `phone`.
    async fn request_login_code(&mut self, phone: &str) -> Result<(), Self::Error>;

    /// Complete the login started by [`request_login_code`](Self::request_login_code).
    async fn sign_in(&mut self, code: &str) -> Result<SignedInUser, Self::Error>;

    /// Write the authorized session to its file.
    fn save_session(&self) -> Result<(), Self::Error>;
}

#[cfg(feature = "telegram")]
pub use self::grammers::{GrammersError, GrammersLogin};

#[cfg(feature = "telegram")]
mod grammers {
    use super::{LoginClient, SignedInUser};
    use grammers_client::types::LoginToken;
    use grammers_client::{Client, Config, InitParams, SignInError};
    use grammers_session::Session;
    use secrecy::{ExposeSecret, SecretString};
    use std::error::Error as StdError;
    use std::path::{Path, PathBuf};
    use thiserror::Error;

    type BoxError = Box<dyn StdError + Send + Sync>;

    #[cfg(feature = "tracing")]
    use tracing::info;

    #[derive(Debug, Error)]
    pub enum GrammersError {
        #[error("Session file {path}: {source}")]
        SessionFile {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },

        #[error("Failed to connect to Telegram: {0}")]
        Connect(#[source] BoxError),

        #[error("Failed to request login code: {0}")]
        RequestCode(#[source] BoxError),

        #[error("Sign in failed: {0}")]
        SignIn(#[from] SignInError),

        #[error("Sign in attempted before a login code was requested")]
        NoLoginToken,
    }

    /// grammers-backed [`LoginClient`] bound to one session file.
    pub struct GrammersLogin {
        client: Client,
        session_path: PathBuf,
        token: Option<LoginToken>,
    }

    impl GrammersLogin {
        /// Connect with the app credentials, loading `session_path` if it exists.
        pub async fn connect(
            api_id: i32,
            api_hash: &SecretString,
            session_path: impl AsRef<Path>,
        ) -> Result<Self, GrammersError> {
            let session_path = session_path.as_ref().to_path_buf();
            let session = Session::load_file_or_create(&session_path).map_err(|source| {
                GrammersError::SessionFile {
                    path: session_path.clone(),
                    source,
                }
            })?;

            let client = Client::connect(Config {
                session,
                api_id,
                api_hash: api_hash.expose_secret().to_string(),
                params: InitParams::default(),
            })
            .await
            .map_err(|e| GrammersError::Connect(Box::new(e)))?;

            #[cfg(feature = "tracing")]
            info!(session = %session_path.display(), "Connected to Telegram");

            Ok(Self {
                client,
                session_path,
                token: None,
            })
        }

        pub fn session_path(&self) -> &Path {
            &self.session_path
        }
    }

    impl LoginClient for GrammersLogin {
        type Error = GrammersError;

        async fn request_login_code(&mut self, phone: &str) -> Result<(), Self::Error> {
            let token = self
                .client
                .request_login_code(phone)
                .await
                .map_err(|e| GrammersError::RequestCode(Box::new(e)))?;
            self.token = Some(token);
            Ok(())
        }

        async fn sign_in(&mut self, code: &str) -> Result<SignedInUser, Self::Error> {
            let token = self.token.take().ok_or(GrammersError::NoLoginToken)?;
            let user = self.client.sign_in(&token, code).await?;

            Ok(SignedInUser {
                first_name: user.first_name().to_string(),
            })
        }

        fn save_session(&self) -> Result<(), Self::Error> {
            self.client
                .session()
                .save_to_file(&self.session_path)
                .map_err(|source| GrammersError::SessionFile {
                    path: self.session_path.clone(),
                    source,
                })
        }
    }
}
