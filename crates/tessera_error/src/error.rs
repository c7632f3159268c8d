//! Top-level error wrapper types.

use crate::{BackendError, ConfigError, EpicError, JsonError, StoreError};

/// This is the foundation error enum. Each Tessera crate contributes its
/// own variant through `From` conversions.
///
/// # Examples
///
/// ```
/// use tessera_error::{TesseraError, JsonError};
///
/// let json_err = JsonError::new("trailing comma");
/// let err: TesseraError = json_err.into();
/// assert!(format!("{}", err).contains("JSON Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum TesseraErrorKind {
    /// Generation backend error
    #[from(BackendError)]
    Backend(BackendError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Document store error
    #[from(StoreError)]
    Store(StoreError),
    /// Epic pipeline error
    #[from(EpicError)]
    Epic(EpicError),
}

/// Tessera error with kind discrimination.
///
/// # Examples
///
/// ```
/// use tessera_error::{TesseraResult, ConfigError};
///
/// fn might_fail() -> TesseraResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Tessera Error: {}", _0)]
pub struct TesseraError(Box<TesseraErrorKind>);

impl TesseraError {
    /// Create a new error from a kind.
    pub fn new(kind: TesseraErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TesseraErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to TesseraErrorKind
impl<T> From<T> for TesseraError
where
    T: Into<TesseraErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Tessera operations.
///
/// # Examples
///
/// ```
/// use tessera_error::{TesseraResult, JsonError};
///
/// fn parse_payload() -> TesseraResult<String> {
///     Err(JsonError::new("unexpected end of input"))?
/// }
/// ```
pub type TesseraResult<T> = std::result::Result<T, TesseraError>;
