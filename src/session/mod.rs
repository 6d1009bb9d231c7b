//! Telegram session for a freshly registered account.

mod client;
mod code;
mod finalizer;

pub use client::{LoginClient, SignedInUser};
#[cfg(feature = "telegram")]
pub use client::{GrammersError, GrammersLogin};
pub use code::{CHAT_ROW, DEFAULT_CHAT_SETTLE, extract_login_code, read_login_code};
pub use finalizer::{SessionConfig, SessionError, SessionFinalizer};
