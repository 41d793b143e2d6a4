//! Text overlay error types.

/// Kinds of overlay errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum OverlayErrorKind {
    /// Renderer failed to composite the caption
    #[display("Overlay rendering failed: {}", _0)]
    Render(String),
    /// Failed to persist the overlay plan
    #[display("Failed to write overlay plan: {}", _0)]
    PlanWrite(String),
}

/// Overlay error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Overlay Error: {} at line {} in {}", kind, line, file)]
pub struct OverlayError {
    /// The kind of error that occurred
    pub kind: OverlayErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl OverlayError {
    /// Create a new overlay error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: OverlayErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
