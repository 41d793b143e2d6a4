//! Caption overlay boundary.
//!
//! Rasterizing text onto images happens outside this system. The boundary
//! is an async trait taking pristine artifact bytes plus the caption and
//! its placement; the shipped implementation passes the bytes through
//! unchanged and records an overlay plan manifest that external
//! typesetting tooling consumes.

use caldecott_error::{CaldecottResult, OverlayError, OverlayErrorKind};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// What an overlay job applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayTarget {
    /// A numbered page.
    Page(u32),
    /// The book cover.
    Cover,
}

impl std::fmt::Display for OverlayTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayTarget::Page(page) => write!(f, "page {page}"),
            OverlayTarget::Cover => write!(f, "cover"),
        }
    }
}

/// Where a caption band lands on the artifact.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CaptionPosition {
    /// Along the bottom edge. Pages default here.
    #[default]
    Bottom,
    /// Centered vertically. Covers default here.
    Middle,
    /// Along the top edge.
    Top,
}

/// One caption compositing job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayJob {
    /// Artifact the caption applies to.
    pub target: OverlayTarget,
    /// Caption text.
    pub text: String,
    /// Vertical placement of the caption band.
    pub position: CaptionPosition,
}

/// Composites caption text onto pristine artifact bytes.
///
/// Implementations may rasterize directly or defer to external tooling;
/// either way the input bytes are the pristine artifact, never an already
/// composited one, so overlay can be re-applied after text edits.
#[async_trait::async_trait]
pub trait OverlayRenderer: Send + Sync {
    /// Produce the composited bytes for a job.
    async fn render(&self, pristine: &[u8], job: &OverlayJob) -> CaldecottResult<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PlanEntry {
    target: OverlayTarget,
    text: String,
    position: CaptionPosition,
    /// SHA-256 of the pristine artifact the caption applies to.
    pristine_hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct OverlayPlan {
    #[serde(default)]
    entries: Vec<PlanEntry>,
}

/// Records overlay jobs in a JSON manifest for external typesetting.
///
/// The returned bytes are the pristine input unchanged. Re-rendering a
/// target replaces its manifest entry, so re-applying text after an edit
/// does not grow the plan.
pub struct PlanOverlayRenderer {
    plan_path: PathBuf,
}

impl PlanOverlayRenderer {
    /// Renderer writing its manifest to `plan_path`.
    pub fn new(plan_path: impl Into<PathBuf>) -> Self {
        Self {
            plan_path: plan_path.into(),
        }
    }

    async fn load_plan(&self) -> OverlayPlan {
        let bytes = match tokio::fs::read(&self.plan_path).await {
            Ok(bytes) => bytes,
            Err(_) => return OverlayPlan::default(),
        };
        match serde_json::from_slice(&bytes) {
            Ok(plan) => plan,
            Err(e) => {
                tracing::warn!(error = %e, "Overlay plan corrupt, starting a new one");
                OverlayPlan::default()
            }
        }
    }

    async fn save_plan(&self, plan: &OverlayPlan) -> CaldecottResult<()> {
        let json = serde_json::to_vec_pretty(plan)
            .map_err(|e| OverlayError::new(OverlayErrorKind::PlanWrite(e.to_string())))?;

        if let Some(parent) = self.plan_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                OverlayError::new(OverlayErrorKind::PlanWrite(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let temp_path = self.plan_path.with_extension("tmp");
        tokio::fs::write(&temp_path, &json).await.map_err(|e| {
            OverlayError::new(OverlayErrorKind::PlanWrite(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp_path, &self.plan_path)
            .await
            .map_err(|e| {
                OverlayError::new(OverlayErrorKind::PlanWrite(format!(
                    "rename {} to {}: {}",
                    temp_path.display(),
                    self.plan_path.display(),
                    e
                )))
            })?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl OverlayRenderer for PlanOverlayRenderer {
    #[tracing::instrument(skip(self, pristine, job), fields(target = %job.target, size = pristine.len()))]
    async fn render(&self, pristine: &[u8], job: &OverlayJob) -> CaldecottResult<Vec<u8>> {
        let mut hasher = Sha256::new();
        hasher.update(pristine);
        let pristine_hash = format!("{:x}", hasher.finalize());

        let entry = PlanEntry {
            target: job.target,
            text: job.text.clone(),
            position: job.position,
            pristine_hash,
        };

        let mut plan = self.load_plan().await;
        match plan.entries.iter_mut().find(|e| e.target == job.target) {
            Some(existing) => *existing = entry,
            None => plan.entries.push(entry),
        }
        self.save_plan(&plan).await?;

        tracing::info!(entries = plan.entries.len(), "Recorded overlay job");
        Ok(pristine.to_vec())
    }
}
