//! Epic pipeline error types.

/// Specific error conditions for epic orchestration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum EpicErrorKind {
    /// Referenced epic does not exist
    #[display("Epic '{}' not found", _0)]
    EpicNotFound(String),
    /// Referenced post does not exist
    #[display("Post '{}' not found", _0)]
    PostNotFound(String),
    /// Referenced story block does not exist within its epic
    #[display("Story block '{block_id}' not found in epic '{epic_id}'")]
    BlockNotFound {
        /// Epic identifier
        epic_id: String,
        /// Story block identifier
        block_id: String,
    },
    /// Update payload was empty or malformed
    #[display("Validation failed: {}", _0)]
    Validation(String),
    /// Epic was updated but the post-side sync failed (or vice versa)
    #[display("Partial sync: epic '{epic_id}' updated but post '{post_id}' sync failed: {message}")]
    PartialSync {
        /// Epic identifier
        epic_id: String,
        /// Post identifier
        post_id: String,
        /// Underlying failure description
        message: String,
    },
    /// Story generation produced no usable narrative
    #[display("Generation produced no narrative: {}", _0)]
    EmptyNarrative(String),
}

/// Error type for epic orchestration.
///
/// # Examples
///
/// ```
/// use tessera_error::{EpicError, EpicErrorKind};
///
/// let err = EpicError::new(EpicErrorKind::EpicNotFound("abc123".into()));
/// assert!(format!("{}", err).contains("abc123"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Epic Error: {} at line {} in {}", kind, line, file)]
pub struct EpicError {
    /// The specific error condition
    pub kind: EpicErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl EpicError {
    /// Create a new EpicError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: EpicErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
