//! Top-level error wrapper types.

use crate::{
    BookError, CheckpointError, ConfigError, GeminiError, HttpError, JsonError, OverlayError,
    SceneError, StorageError,
};

/// This is the foundation error enum. Each crate in the workspace
/// contributes its domain variant here.
///
/// # Examples
///
/// ```
/// use caldecott_error::{CaldecottError, HttpError};
///
/// let http_err = HttpError::new("Connection failed");
/// let err: CaldecottError = http_err.into();
/// assert!(format!("{}", err).contains("HTTP Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum CaldecottErrorKind {
    /// HTTP error
    #[from(HttpError)]
    Http(HttpError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Book definition error
    #[from(BookError)]
    Book(BookError),
    /// Scene pipeline error
    #[from(SceneError)]
    Scene(SceneError),
    /// Gemini service error
    #[from(GeminiError)]
    Gemini(GeminiError),
    /// Artifact storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Checkpoint persistence error
    #[from(CheckpointError)]
    Checkpoint(CheckpointError),
    /// Text overlay error
    #[from(OverlayError)]
    Overlay(OverlayError),
}

/// Caldecott error with kind discrimination.
///
/// # Examples
///
/// ```
/// use caldecott_error::{CaldecottError, CaldecottResult, ConfigError};
///
/// fn might_fail() -> CaldecottResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Caldecott Error: {}", _0)]
pub struct CaldecottError(Box<CaldecottErrorKind>);

impl CaldecottError {
    /// Create a new error from a kind.
    pub fn new(kind: CaldecottErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &CaldecottErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to CaldecottErrorKind
impl<T> From<T> for CaldecottError
where
    T: Into<CaldecottErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Caldecott operations.
///
/// # Examples
///
/// ```
/// use caldecott_error::{CaldecottResult, HttpError};
///
/// fn fetch_data() -> CaldecottResult<String> {
///     Err(HttpError::new("404 Not Found"))?
/// }
/// ```
pub type CaldecottResult<T> = std::result::Result<T, CaldecottError>;
