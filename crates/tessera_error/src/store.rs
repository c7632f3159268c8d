//! Document store error types.

/// Specific error conditions for document store operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StoreErrorKind {
    /// Document with the given identifier does not exist
    #[display("Document not found: {}", _0)]
    NotFound(String),
    /// Identifier could not be parsed
    #[display("Malformed identifier: {}", _0)]
    MalformedId(String),
    /// Document failed serialization at the store boundary
    #[display("Serialization failed: {}", _0)]
    Serialization(String),
    /// Underlying store connection failed
    #[display("Store connection error: {}", _0)]
    Connection(String),
}

/// Error type for document store operations.
///
/// # Examples
///
/// ```
/// use tessera_error::{StoreError, StoreErrorKind};
///
/// let err = StoreError::new(StoreErrorKind::NotFound("epic 42".into()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    /// The specific error condition
    pub kind: StoreErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl StoreError {
    /// Create a new StoreError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
