//! Error classification shared by every layer of the activation flow.

/// Trait for errors that can be classified as retryable or permanent.
///
/// This trait provides two levels of retryability classification:
///
/// 1. **Request-level** (`is_retryable`): Whether the same request for the same
///    activation should be repeated. Use this for transient errors like network
///    timeouts or a proxy hiccup.
///
/// 2. **Operation-level** (`should_retry_operation`): Whether a fresh attempt
///    (another country, another number) might succeed. Use this when a specific
///    request failed but moving on could work.
///
/// # Examples
///
/// ```rust
/// use tg_autoreg::RetryableError;
///
/// enum MyError {
///     NetworkTimeout,      // Repeat the same request
///     NoNumbers,           // Don't repeat, but try another country
///     InvalidApiKey,       // Don't retry at all
///     NoBalance,           // Don't retry until account is funded
/// }
///
/// impl RetryableError for MyError {
///     fn is_retryable(&self) -> bool {
///         matches!(self, MyError::NetworkTimeout)
///     }
///
///     fn should_retry_operation(&self) -> bool {
///         match self {
///             MyError::NetworkTimeout | MyError::NoNumbers => true,
///             MyError::InvalidApiKey | MyError::NoBalance => false,
///         }
///     }
/// }
/// ```
pub trait RetryableError {
    /// Returns true if this error represents a transient failure
    /// that might succeed when the same request is sent again.
    fn is_retryable(&self) -> bool;

    /// Returns true if a fresh operation (another country or number) might succeed.
    ///
    /// Default implementation returns the same as `is_retryable()`.
    ///
    /// Examples where this differs from `is_retryable()`:
    /// - `NoNumbers`: is_retryable=false, should_retry_operation=true
    /// - `CodeTimeout`: is_retryable=false, should_retry_operation=true
    /// - `NoBalance`: is_retryable=false, should_retry_operation=false
    fn should_retry_operation(&self) -> bool {
        self.is_retryable()
    }

    /// Returns true if the activation this error came from no longer exists
    /// or can never deliver a code, so polling its status is pointless.
    ///
    /// Default implementation returns false: unrecognised answers and
    /// transport failures leave the activation open on the provider side.
    fn is_terminal_for_activation(&self) -> bool {
        false
    }
}
