//! Book definition error types.

/// Specific error conditions for book definition loading and validation.
#[derive(Debug, Clone, PartialEq, derive_more::Display)]
pub enum BookErrorKind {
    /// Failed to read the book definition file
    #[display("Failed to read book file: {}", _0)]
    FileRead(String),
    /// Failed to parse TOML content
    #[display("Failed to parse TOML: {}", _0)]
    TomlParse(String),
    /// Book defines no pages
    #[display("Book must define at least one page")]
    EmptyPages,
    /// Provided story texts do not line up with the page count
    #[display("Book declares {} pages but story provides {} texts", expected, actual)]
    StoryPageCountMismatch {
        /// Pages declared in the book section
        expected: u32,
        /// Story texts provided
        actual: usize,
    },
    /// Phase referenced in the phase map has no scene descriptor
    #[display("Phase '{}' has no scene descriptor", _0)]
    MissingScene(String),
    /// Default phase has no scene descriptor
    #[display("Default phase '{}' has no scene descriptor", _0)]
    MissingDefaultScene(String),
    /// Phase range is inverted or falls outside the page sequence
    #[display("Phase '{}' has invalid page range {}..={}", phase, start, end)]
    InvalidPageRange {
        /// Phase name
        phase: String,
        /// First page of the range
        start: u32,
        /// Last page of the range
        end: u32,
    },
    /// Character introduction page exceeds the page count
    #[display("Character '{}' is introduced on page {} but the book has {} pages", character, page, page_count)]
    IntroductionOutOfRange {
        /// Character key
        character: String,
        /// Configured introduction page
        page: u32,
        /// Total pages in the book
        page_count: u32,
    },
    /// Emotion map key is not a decimal page number
    #[display("Character '{}' has emotion entry with non-numeric page key '{}'", character, key)]
    InvalidEmotionPage {
        /// Character key
        character: String,
        /// Offending map key
        key: String,
    },
    /// Page emotion map key is not a decimal page number
    #[display("Page emotion entry has non-numeric page key '{}'", _0)]
    InvalidPageEmotionKey(String),
    /// Temperature schedule escapes the valid sampling range
    #[display("Temperature schedule is invalid: base {} max {}", base, max)]
    InvalidTemperature {
        /// Base temperature
        base: f32,
        /// Ceiling temperature
        max: f32,
    },
    /// A requested page number is outside the book
    #[display("Page {} is outside the book (1..={})", page, page_count)]
    PageOutOfRange {
        /// Requested page
        page: u32,
        /// Total pages in the book
        page_count: u32,
    },
}

/// Book definition error with source location tracking.
///
/// # Examples
///
/// ```
/// use caldecott_error::{BookError, BookErrorKind};
///
/// let err = BookError::new(BookErrorKind::EmptyPages);
/// assert!(format!("{}", err).contains("at least one page"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Book Error: {} at line {} in {}", kind, line, file)]
pub struct BookError {
    /// The kind of error that occurred
    pub kind: BookErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl BookError {
    /// Create a new BookError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: BookErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
