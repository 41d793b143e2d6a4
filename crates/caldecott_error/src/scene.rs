//! Scene pipeline error types.

/// Specific error conditions for scene composition and response validation.
///
/// `StoryValidation` and `MissingImage` are the content-check failures that
/// earn one backup-prompt retry before becoming fatal for the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum SceneErrorKind {
    /// Generated story text failed a content check
    #[display("Page {} story text failed validation: {}", page, reason)]
    StoryValidation {
        /// Page number
        page: u32,
        /// What the check found
        reason: String,
    },
    /// Service response carried no usable image payload
    #[display("Page {} response contained no image", _0)]
    MissingImage(u32),
    /// Service response carried no usable content at all
    #[display("Page {} response was empty", _0)]
    EmptyResponse(u32),
    /// Page has no resolvable scene context
    #[display("No scene descriptor resolvable for page {}", _0)]
    UnresolvableScene(u32),
}

/// Scene error with source location tracking.
///
/// # Examples
///
/// ```
/// use caldecott_error::{SceneError, SceneErrorKind};
///
/// let err = SceneError::new(SceneErrorKind::MissingImage(4));
/// assert!(format!("{}", err).contains("no image"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Scene Error: {} at line {} in {}", kind, line, file)]
pub struct SceneError {
    /// The kind of error that occurred
    pub kind: SceneErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl SceneError {
    /// Create a new SceneError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SceneErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
