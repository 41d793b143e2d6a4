//! Checkpoint persistence error types.

/// Kinds of checkpoint errors.
///
/// Any of these is fatal for the run: a checkpoint that cannot be trusted
/// would corrupt resumability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CheckpointErrorKind {
    /// Failed to read the checkpoint file
    #[display("Failed to read checkpoint: {}", _0)]
    FileRead(String),
    /// Failed to write the checkpoint file
    #[display("Failed to write checkpoint: {}", _0)]
    FileWrite(String),
    /// Failed to serialize checkpoint state
    #[display("Failed to serialize checkpoint: {}", _0)]
    Serialize(String),
    /// Tried to update a page the checkpoint never recorded as complete
    #[display("Page {} has no completed record in the checkpoint", _0)]
    PageNotRecorded(u32),
    /// Tried to update the cover before it was generated
    #[display("No cover record exists in the checkpoint")]
    CoverNotRecorded,
}

/// Checkpoint error with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Checkpoint Error: {} at line {} in {}", kind, line, file)]
pub struct CheckpointError {
    /// The kind of error that occurred
    pub kind: CheckpointErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CheckpointError {
    /// Create a new checkpoint error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CheckpointErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
