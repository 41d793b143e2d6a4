//! Durable generation progress.
//!
//! The checkpoint is the single source of truth for what has been
//! generated. A page enters it only after its full success (text extracted
//! and validated, illustration stored), so an interrupted run can trust
//! every recorded page when it resumes. A fatal failure leaves a note
//! keyed by page number; the note clears when the page later succeeds.
//! Invalidation removes exactly the listed pages; pages that used an
//! invalidated page as their visual reference keep their records.

use crate::{ArtifactReference, OverlayTarget};
use caldecott_error::{CaldecottResult, CheckpointError, CheckpointErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One completed page's durable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// Story text for the page.
    pub text: String,
    /// Pristine illustration, before any text overlay.
    pub pristine: ArtifactReference,
    /// Final image with the caption composited on, once the overlay pass
    /// has run.
    #[serde(default)]
    pub composite: Option<ArtifactReference>,
    /// Page whose artifact anchored this page's visual continuity, when
    /// one was supplied.
    #[serde(default)]
    pub reference_page: Option<u32>,
    /// When generation succeeded.
    pub completed_at: DateTime<Utc>,
}

/// The cover's durable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverRecord {
    /// Pristine cover art.
    pub pristine: ArtifactReference,
    /// Cover with the title block composited on.
    #[serde(default)]
    pub composite: Option<ArtifactReference>,
    /// When generation succeeded.
    pub completed_at: DateTime<Utc>,
}

/// One exchange with the text model, kept for narrative continuity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// "user" or "model".
    pub role: String,
    /// Message text.
    pub text: String,
}

impl ConversationTurn {
    /// A turn sent to the model.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            text: text.into(),
        }
    }

    /// A turn received from the model.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            text: text.into(),
        }
    }
}

/// Snapshot of generation progress for one book.
///
/// Completed pages are keyed by page number. The full conversation history
/// is retained here; callers window it when feeding context back to the
/// text model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookCheckpoint {
    #[serde(default)]
    pages: BTreeMap<u32, PageRecord>,
    #[serde(default)]
    cover: Option<CoverRecord>,
    #[serde(default)]
    conversation: Vec<ConversationTurn>,
    #[serde(default)]
    failures: BTreeMap<u32, String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl BookCheckpoint {
    /// Record for a completed page.
    pub fn page(&self, page: u32) -> Option<&PageRecord> {
        self.pages.get(&page)
    }

    /// Whether a page has completed generation.
    pub fn is_page_complete(&self, page: u32) -> bool {
        self.pages.contains_key(&page)
    }

    /// Completed page numbers in ascending order.
    pub fn completed_pages(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    /// Whether every page of an n-page book has completed.
    pub fn is_complete(&self, page_count: u32) -> bool {
        (1..=page_count).all(|p| self.pages.contains_key(&p))
    }

    /// Lowest page of an n-page book still awaiting generation.
    pub fn next_pending_page(&self, page_count: u32) -> Option<u32> {
        (1..=page_count).find(|p| !self.pages.contains_key(p))
    }

    /// Completed pages' story text, keyed by page number.
    pub fn previous_texts(&self) -> BTreeMap<u32, String> {
        self.pages
            .iter()
            .map(|(page, record)| (*page, record.text.clone()))
            .collect()
    }

    /// The cover record, once generated.
    pub fn cover(&self) -> Option<&CoverRecord> {
        self.cover.as_ref()
    }

    /// The last fatal error noted for a page still awaiting generation.
    pub fn last_failure(&self, page: u32) -> Option<&str> {
        self.failures.get(&page).map(String::as_str)
    }

    /// All noted failures, keyed by page number.
    pub fn failures(&self) -> &BTreeMap<u32, String> {
        &self.failures
    }

    /// The most recent `window` conversation turns.
    pub fn conversation_window(&self, window: usize) -> &[ConversationTurn] {
        let start = self.conversation.len().saturating_sub(window);
        &self.conversation[start..]
    }

    /// Full conversation history.
    pub fn conversation(&self) -> &[ConversationTurn] {
        &self.conversation
    }

    /// When the checkpoint last changed.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// Durable checkpoint backend.
///
/// Mutators persist before returning: once a call succeeds, the recorded
/// state survives process termination.
#[async_trait::async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Current checkpoint. A missing or unreadable file loads as an empty
    /// checkpoint rather than an error.
    async fn load(&self) -> BookCheckpoint;

    /// Record a page's completed outcome with the conversation turns it
    /// produced. Never called speculatively; a page appears here only
    /// after its text and illustration both succeeded.
    async fn record_page(
        &self,
        page: u32,
        record: PageRecord,
        turns: Vec<ConversationTurn>,
    ) -> CaldecottResult<BookCheckpoint>;

    /// Record the generated cover, replacing any previous cover record.
    async fn record_cover(&self, record: CoverRecord) -> CaldecottResult<BookCheckpoint>;

    /// Note a page's fatal failure so the next run can report why it
    /// stopped. The note clears when the page later records a success.
    async fn record_failure(&self, page: u32, error: String) -> CaldecottResult<BookCheckpoint>;

    /// Attach a composited artifact to an already-recorded page or cover.
    async fn record_composite(
        &self,
        target: OverlayTarget,
        artifact: ArtifactReference,
    ) -> CaldecottResult<BookCheckpoint>;

    /// Clear completion for exactly the listed pages.
    async fn invalidate(&self, pages: &[u32]) -> CaldecottResult<BookCheckpoint>;
}

/// JSON-file checkpoint store.
///
/// Writes go through a temp file and rename, so a crash mid-write leaves
/// the previous checkpoint intact rather than a truncated one.
pub struct JsonCheckpointStore {
    path: PathBuf,
}

impl JsonCheckpointStore {
    /// Store backed by a JSON file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn save(&self, checkpoint: &BookCheckpoint) -> CaldecottResult<()> {
        let json = serde_json::to_vec_pretty(checkpoint)
            .map_err(|e| CheckpointError::new(CheckpointErrorKind::Serialize(e.to_string())))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CheckpointError::new(CheckpointErrorKind::FileWrite(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &json).await.map_err(|e| {
            CheckpointError::new(CheckpointErrorKind::FileWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp_path, &self.path).await.map_err(|e| {
            CheckpointError::new(CheckpointErrorKind::FileWrite(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            )))
        })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl CheckpointStore for JsonCheckpointStore {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> BookCheckpoint {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No checkpoint found, starting fresh");
                return BookCheckpoint::default();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Checkpoint unreadable, starting fresh");
                return BookCheckpoint::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(checkpoint) => checkpoint,
            Err(e) => {
                tracing::warn!(error = %e, "Checkpoint corrupt, starting fresh");
                BookCheckpoint::default()
            }
        }
    }

    #[tracing::instrument(skip(self, record, turns), fields(turns = turns.len()))]
    async fn record_page(
        &self,
        page: u32,
        record: PageRecord,
        turns: Vec<ConversationTurn>,
    ) -> CaldecottResult<BookCheckpoint> {
        let mut checkpoint = self.load().await;
        checkpoint.pages.insert(page, record);
        checkpoint.conversation.extend(turns);
        checkpoint.failures.remove(&page);
        checkpoint.touch();
        self.save(&checkpoint).await?;

        tracing::info!(
            completed = checkpoint.pages.len(),
            "Recorded page completion"
        );
        Ok(checkpoint)
    }

    #[tracing::instrument(skip(self, record))]
    async fn record_cover(&self, record: CoverRecord) -> CaldecottResult<BookCheckpoint> {
        let mut checkpoint = self.load().await;
        checkpoint.cover = Some(record);
        checkpoint.touch();
        self.save(&checkpoint).await?;

        tracing::info!("Recorded cover completion");
        Ok(checkpoint)
    }

    #[tracing::instrument(skip(self, error))]
    async fn record_failure(&self, page: u32, error: String) -> CaldecottResult<BookCheckpoint> {
        let mut checkpoint = self.load().await;
        checkpoint.failures.insert(page, error);
        checkpoint.touch();
        self.save(&checkpoint).await?;

        tracing::info!(page, "Recorded page failure");
        Ok(checkpoint)
    }

    #[tracing::instrument(skip(self, artifact), fields(target = %target))]
    async fn record_composite(
        &self,
        target: OverlayTarget,
        artifact: ArtifactReference,
    ) -> CaldecottResult<BookCheckpoint> {
        let mut checkpoint = self.load().await;
        match target {
            OverlayTarget::Page(page) => {
                let record = checkpoint.pages.get_mut(&page).ok_or_else(|| {
                    CheckpointError::new(CheckpointErrorKind::PageNotRecorded(page))
                })?;
                record.composite = Some(artifact);
            }
            OverlayTarget::Cover => {
                let record = checkpoint
                    .cover
                    .as_mut()
                    .ok_or_else(|| CheckpointError::new(CheckpointErrorKind::CoverNotRecorded))?;
                record.composite = Some(artifact);
            }
        }
        checkpoint.touch();
        self.save(&checkpoint).await?;
        Ok(checkpoint)
    }

    #[tracing::instrument(skip(self))]
    async fn invalidate(&self, pages: &[u32]) -> CaldecottResult<BookCheckpoint> {
        let mut checkpoint = self.load().await;
        for page in pages {
            if checkpoint.pages.remove(page).is_some() {
                tracing::info!(page, "Invalidated page");
            } else {
                tracing::debug!(page, "Page not recorded, nothing to invalidate");
            }
        }
        checkpoint.touch();
        self.save(&checkpoint).await?;
        Ok(checkpoint)
    }
}
