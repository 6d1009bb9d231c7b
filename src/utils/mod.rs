//! Shared helpers.

pub(crate) mod dial_code;
pub(crate) mod retry;
