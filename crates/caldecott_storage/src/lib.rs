//! Content-addressable artifact storage and generation checkpoints.
//!
//! Generated page illustrations are stored by SHA-256 hash so identical
//! content deduplicates automatically and references stay valid across
//! runs. A JSON checkpoint records which pages completed, their story
//! text, and their artifact references, keyed by page number so a run can
//! resume or selectively regenerate after an interruption.
//!
//! # Example
//!
//! ```rust
//! use caldecott_storage::{ArtifactKind, ArtifactMetadata, ArtifactStore, FileSystemArtifacts};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FileSystemArtifacts::new("/tmp/caldecott")?;
//! let metadata = ArtifactMetadata {
//!     kind: ArtifactKind::Illustration,
//!     mime_type: "image/png".to_string(),
//!     page: Some(1),
//! };
//!
//! let data = vec![0u8; 1024]; // PNG data
//! let reference = store.store(&data, &metadata).await?;
//! let retrieved = store.retrieve(&reference).await?;
//! assert_eq!(data, retrieved);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use caldecott_error::CaldecottResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod checkpoint;
mod filesystem;
mod overlay;

pub use caldecott_error::{StorageError, StorageErrorKind};
pub use checkpoint::{
    BookCheckpoint, CheckpointStore, ConversationTurn, CoverRecord, JsonCheckpointStore,
    PageRecord,
};
pub use filesystem::FileSystemArtifacts;
pub use overlay::{CaptionPosition, OverlayJob, OverlayRenderer, OverlayTarget, PlanOverlayRenderer};

/// Pluggable artifact storage backend.
///
/// Implementations persist binary artifact data; bookkeeping about which
/// page produced an artifact lives in the checkpoint, not the store.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store artifact bytes and return a reference.
    ///
    /// Content is addressed by hash: storing the same bytes twice yields
    /// references to a single stored copy.
    async fn store(
        &self,
        data: &[u8],
        metadata: &ArtifactMetadata,
    ) -> CaldecottResult<ArtifactReference>;

    /// Retrieve artifact bytes by reference.
    ///
    /// Fails when the artifact is missing or its content no longer matches
    /// the recorded hash.
    async fn retrieve(&self, reference: &ArtifactReference) -> CaldecottResult<Vec<u8>>;

    /// Delete an artifact.
    async fn delete(&self, reference: &ArtifactReference) -> CaldecottResult<()>;

    /// Whether the referenced artifact exists.
    async fn exists(&self, reference: &ArtifactReference) -> CaldecottResult<bool>;
}

/// Metadata about an artifact being stored.
#[derive(Debug, Clone)]
pub struct ArtifactMetadata {
    /// Role of the artifact in the book.
    pub kind: ArtifactKind,
    /// MIME type (e.g., "image/png").
    pub mime_type: String,
    /// Page that produced the artifact, if any (the cover has none).
    pub page: Option<u32>,
}

/// Reference to a stored artifact.
///
/// Carries everything needed to retrieve the bytes plus the identifiers the
/// checkpoint records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactReference {
    /// Unique identifier for this reference.
    pub id: Uuid,
    /// SHA-256 hash of the content.
    pub content_hash: String,
    /// Storage backend name (e.g., "filesystem").
    pub storage_backend: String,
    /// Backend-specific path to the artifact.
    pub storage_path: String,
    /// Size in bytes.
    pub size_bytes: i64,
    /// Role of the artifact.
    pub kind: ArtifactKind,
    /// MIME type.
    pub mime_type: String,
}

/// Role of an artifact in the finished book.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArtifactKind {
    /// A page's pristine illustration, before any text overlay.
    Illustration,
    /// A page's final image with caption text composited on.
    Composite,
    /// The book cover.
    Cover,
}

impl ArtifactKind {
    /// Directory name grouping artifacts of this kind.
    pub fn dir(&self) -> &'static str {
        match self {
            ArtifactKind::Illustration => "illustrations",
            ArtifactKind::Composite => "composites",
            ArtifactKind::Cover => "covers",
        }
    }
}
