//! Generation backend error types.

/// Specific error conditions for generation backend calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum BackendErrorKind {
    /// Generation capability is not configured (no credentials)
    #[display("Generation backend is not configured (missing API key)")]
    Unavailable,
    /// The provider rejected or failed the request
    #[display("Backend API error {status}: {message}")]
    Api {
        /// HTTP status code returned by the provider
        status: u16,
        /// Provider error message
        message: String,
    },
    /// The request did not complete within its deadline
    #[display("Backend request timed out")]
    Timeout,
    /// Transport-level failure before a response was received
    #[display("Backend transport error: {}", _0)]
    Http(String),
    /// The response arrived but could not be interpreted
    #[display("Malformed backend response: {}", _0)]
    Malformed(String),
}

impl BackendErrorKind {
    /// Whether a retry could plausibly succeed.
    ///
    /// Rate limits, server errors, timeouts and transport failures are
    /// transient; missing credentials and malformed payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout | Self::Http(_) => true,
            Self::Unavailable | Self::Malformed(_) => false,
        }
    }
}

/// Error type for generation backend operations.
///
/// # Examples
///
/// ```
/// use tessera_error::{BackendError, BackendErrorKind};
///
/// let err = BackendError::new(BackendErrorKind::Unavailable);
/// assert!(format!("{}", err).contains("not configured"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Backend Error: {} at line {} in {}", kind, line, file)]
pub struct BackendError {
    /// The specific error condition
    pub kind: BackendErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl BackendError {
    /// Create a new BackendError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: BackendErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}
