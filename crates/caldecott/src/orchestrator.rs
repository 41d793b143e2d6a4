//! The page loop.
//!
//! The orchestrator is the only component with side effects beyond memory.
//! Scene resolution and prompt composition stay pure; everything durable
//! goes through the checkpoint and artifact stores, and the checkpoint is
//! written only after a page fully succeeds. That split keeps every page
//! regenerable at any time: its inputs are the book definition and the
//! checkpoint, never an in-memory run history.

use caldecott_book::BookConfig;
use caldecott_core::{GenerateRequest, Message, Role};
use caldecott_error::{
    BookError, BookErrorKind, CaldecottError, CaldecottErrorKind, CaldecottResult,
    CheckpointError, CheckpointErrorKind, GeminiError, GeminiErrorKind, RetryableError,
};
use caldecott_interface::{ArtDriver, Illustrate, IllustrateRequest, ReferenceImage};
use caldecott_scene::{
    PageState, PageStatus, PhaseResolver, PromptComposer, ScenePipeline, extract_story_text,
    validate_story_text,
};
use caldecott_storage::{
    ArtifactKind, ArtifactMetadata, ArtifactStore, BookCheckpoint, CaptionPosition,
    CheckpointStore, ConversationTurn, CoverRecord, OverlayJob, OverlayRenderer, OverlayTarget,
    PageRecord,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Duration;

/// What a generation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Pages generated during this pass, in order.
    pub pages_generated: Vec<u32>,
    /// Pages skipped because the checkpoint already had them.
    pub pages_skipped: Vec<u32>,
    /// Whether this pass produced the cover.
    pub cover_generated: bool,
}

/// Which artifacts an overlay pass covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlaySelection {
    /// Every completed page, plus the cover when one exists.
    Completed,
    /// A single page.
    Page(u32),
    /// The cover only.
    Cover,
}

/// Drives page-by-page generation against a driver.
///
/// Pages run strictly in order because page N+1's composition depends on
/// page N's completed state. Each page moves through
/// `Pending → Composing → Calling → Succeeded`, with transient service
/// failures re-entering `Calling` after a backoff until the configured
/// attempt ceiling, and anything else fatal. A fatal page halts the run;
/// earlier pages stay checkpointed, so the next invocation resumes
/// instead of restarting.
pub struct Orchestrator<D: ArtDriver + Illustrate, C: CheckpointStore, A: ArtifactStore> {
    config: BookConfig,
    driver: D,
    checkpoints: C,
    artifacts: A,
}

impl<D: ArtDriver + Illustrate, C: CheckpointStore, A: ArtifactStore> Orchestrator<D, C, A> {
    /// Create an orchestrator over a validated book definition.
    pub fn new(config: BookConfig, driver: D, checkpoints: C, artifacts: A) -> Self {
        Self {
            config,
            driver,
            checkpoints,
            artifacts,
        }
    }

    /// Generate every pending page, then the cover if one is configured.
    ///
    /// Pages already in the checkpoint are skipped, so calling this on a
    /// finished book is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the failing page's error once its retry ladder is
    /// exhausted. The checkpoint keeps every page completed before the
    /// failure.
    #[tracing::instrument(skip(self), fields(title = %self.config.book().title(), pages = self.config.book().page_count()))]
    pub async fn run(&self) -> CaldecottResult<RunOutcome> {
        let page_count = *self.config.book().page_count();
        let mut checkpoint = self.checkpoints.load().await;
        let mut outcome = RunOutcome::default();

        let completed = checkpoint.completed_pages();
        if !completed.is_empty() {
            tracing::info!(completed = completed.len(), "resuming from checkpoint");
        }

        for page in 1..=page_count {
            if checkpoint.is_page_complete(page) {
                tracing::debug!(page, "page already complete");
                outcome.pages_skipped.push(page);
                continue;
            }
            checkpoint = match self.generate_page(page, &checkpoint).await {
                Ok(updated) => updated,
                Err(err) => {
                    self.note_failure(page, &err).await;
                    return Err(err);
                }
            };
            outcome.pages_generated.push(page);
            if page < page_count {
                self.pace().await;
            }
        }

        if *self.config.cover().generate_cover() && checkpoint.cover().is_none() {
            self.generate_cover().await?;
            outcome.cover_generated = true;
        }

        tracing::info!(
            generated = outcome.pages_generated.len(),
            skipped = outcome.pages_skipped.len(),
            cover = outcome.cover_generated,
            "run complete"
        );
        Ok(outcome)
    }

    /// Regenerate an explicit list of pages.
    ///
    /// The listed pages are invalidated first, so reference selection
    /// sees only the pages that remain complete. Pages that referenced a
    /// regenerated page keep their records.
    ///
    /// # Errors
    ///
    /// Fails before touching the checkpoint when any listed page is
    /// outside the book.
    #[tracing::instrument(skip(self))]
    pub async fn regenerate(&self, pages: &[u32]) -> CaldecottResult<RunOutcome> {
        let page_count = *self.config.book().page_count();
        for &page in pages {
            if page == 0 || page > page_count {
                return Err(
                    BookError::new(BookErrorKind::PageOutOfRange { page, page_count }).into(),
                );
            }
        }

        let mut targets: Vec<u32> = pages.to_vec();
        targets.sort_unstable();
        targets.dedup();

        let mut checkpoint = self.checkpoints.invalidate(&targets).await?;
        let mut outcome = RunOutcome::default();
        for (index, &page) in targets.iter().enumerate() {
            checkpoint = match self.generate_page(page, &checkpoint).await {
                Ok(updated) => updated,
                Err(err) => {
                    self.note_failure(page, &err).await;
                    return Err(err);
                }
            };
            outcome.pages_generated.push(page);
            if index + 1 < targets.len() {
                self.pace().await;
            }
        }

        tracing::info!(regenerated = outcome.pages_generated.len(), "regeneration complete");
        Ok(outcome)
    }

    /// Generate the cover, replacing any previous cover record.
    ///
    /// The cover anchors its style to a completed interior page, so that
    /// page must already be in the checkpoint.
    #[tracing::instrument(skip(self))]
    pub async fn generate_cover(&self) -> CaldecottResult<CoverRecord> {
        let checkpoint = self.checkpoints.load().await;
        let composer = PromptComposer::new(&self.config);
        let cover = composer.cover_prompt();

        let anchor = *cover.reference_page();
        let reference = Some(self.reference_for_page(anchor, &checkpoint).await?);

        let max_attempts = *self.config.generation().max_attempts();
        let mut attempts = 0u32;
        let (mime_type, data) = loop {
            attempts += 1;
            match self
                .illustrate_once(cover.prompt(), composer.temperature_for(0), reference.clone())
                .await
            {
                Ok(image) => break image,
                Err(err) => match retry_delay(&err, attempts) {
                    Some(delay) if attempts < max_attempts => {
                        tracing::warn!(
                            attempt = attempts,
                            delay_ms = delay.as_millis() as u64,
                            %err,
                            "transient cover failure, backing off"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    _ => {
                        tracing::error!(attempts, %err, "cover failed");
                        return Err(err);
                    }
                },
            }
        };

        let metadata = ArtifactMetadata {
            kind: ArtifactKind::Cover,
            mime_type,
            page: None,
        };
        let pristine = self.artifacts.store(&data, &metadata).await?;
        let record = CoverRecord {
            pristine,
            composite: None,
            completed_at: Utc::now(),
        };
        self.checkpoints.record_cover(record.clone()).await?;
        tracing::info!(attempts, "cover complete");
        Ok(record)
    }

    /// Composite caption text onto pristine artifacts.
    ///
    /// Works entirely from the checkpoint: each target's pristine
    /// artifact and caption are loaded, the renderer produces the
    /// composited bytes, and the result is stored and recorded. Pristine
    /// artifacts are never replaced, so the pass can run again after text
    /// edits.
    ///
    /// # Errors
    ///
    /// Fails when an explicitly selected page or cover has no checkpoint
    /// record yet.
    #[tracing::instrument(skip(self, renderer))]
    pub async fn apply_text<O: OverlayRenderer>(
        &self,
        renderer: &O,
        selection: OverlaySelection,
    ) -> CaldecottResult<Vec<OverlayTarget>> {
        let checkpoint = self.checkpoints.load().await;
        let targets: Vec<OverlayTarget> = match selection {
            OverlaySelection::Completed => {
                let mut targets: Vec<OverlayTarget> = checkpoint
                    .completed_pages()
                    .into_iter()
                    .map(OverlayTarget::Page)
                    .collect();
                if checkpoint.cover().is_some() {
                    targets.push(OverlayTarget::Cover);
                }
                targets
            }
            OverlaySelection::Page(page) => vec![OverlayTarget::Page(page)],
            OverlaySelection::Cover => vec![OverlayTarget::Cover],
        };

        for target in &targets {
            let (pristine_reference, text, position) = match *target {
                OverlayTarget::Page(page) => {
                    let record = checkpoint.page(page).ok_or_else(|| {
                        CheckpointError::new(CheckpointErrorKind::PageNotRecorded(page))
                    })?;
                    (
                        record.pristine.clone(),
                        record.text.clone(),
                        CaptionPosition::Bottom,
                    )
                }
                OverlayTarget::Cover => {
                    let record = checkpoint
                        .cover()
                        .ok_or_else(|| CheckpointError::new(CheckpointErrorKind::CoverNotRecorded))?;
                    let cover = PromptComposer::new(&self.config).cover_prompt();
                    let position = cover.position().parse().unwrap_or(CaptionPosition::Middle);
                    (
                        record.pristine.clone(),
                        cover.overlay_text().clone(),
                        position,
                    )
                }
            };

            let job = OverlayJob {
                target: *target,
                text,
                position,
            };
            let pristine = self.artifacts.retrieve(&pristine_reference).await?;
            let composited = renderer.render(&pristine, &job).await?;
            let metadata = ArtifactMetadata {
                kind: ArtifactKind::Composite,
                mime_type: pristine_reference.mime_type.clone(),
                page: match *target {
                    OverlayTarget::Page(page) => Some(page),
                    OverlayTarget::Cover => None,
                },
            };
            let artifact = self.artifacts.store(&composited, &metadata).await?;
            self.checkpoints.record_composite(*target, artifact).await?;
            tracing::info!(target = %target, "caption applied");
        }

        Ok(targets)
    }

    /// Generate one page and return the checkpoint that records it.
    #[tracing::instrument(skip(self, checkpoint))]
    async fn generate_page(
        &self,
        page: u32,
        checkpoint: &BookCheckpoint,
    ) -> CaldecottResult<BookCheckpoint> {
        let pipeline = ScenePipeline::new(&self.config);
        let composer = PromptComposer::new(&self.config);
        let completed = checkpoint.completed_pages();

        let mut state = pipeline.resolve(page, &completed).ok_or_else(|| {
            let phase = PhaseResolver::new(&self.config).resolve(page);
            BookError::new(BookErrorKind::MissingScene(phase.to_string()))
        })?;
        state.set_status(PageStatus::Composing);

        let previous = checkpoint.previous_texts();
        let temperature = composer.temperature_for(*state.phase_index());
        let (text, turns) = self
            .story_text(&composer, page, &previous, checkpoint, temperature)
            .await?;
        let bundle = composer.compose(&state, &text, &previous);
        let reference = self.reference_image(&state, checkpoint).await?;

        state.set_status(PageStatus::Calling);
        let max_attempts = *self.config.generation().max_attempts();
        let (mime_type, data) = loop {
            state.record_attempt();
            match self
                .illustrate_once(bundle.image_prompt(), *bundle.temperature(), reference.clone())
                .await
            {
                Ok(image) => break image,
                Err(err) => match retry_delay(&err, *state.attempts()) {
                    Some(delay) if *state.attempts() < max_attempts => {
                        state.set_status(PageStatus::FailedRetryable);
                        tracing::warn!(
                            page,
                            attempt = state.attempts(),
                            delay_ms = delay.as_millis() as u64,
                            %err,
                            "transient failure, backing off"
                        );
                        tokio::time::sleep(delay).await;
                        state.set_status(PageStatus::Calling);
                    }
                    _ => {
                        state.set_status(PageStatus::FailedFatal);
                        tracing::error!(page, attempts = state.attempts(), %err, "page failed");
                        return Err(err);
                    }
                },
            }
        };

        let metadata = ArtifactMetadata {
            kind: ArtifactKind::Illustration,
            mime_type,
            page: Some(page),
        };
        let pristine = self.artifacts.store(&data, &metadata).await?;
        let record = PageRecord {
            text,
            pristine,
            composite: None,
            reference_page: *state.reference_page(),
            completed_at: Utc::now(),
        };
        let updated = self.checkpoints.record_page(page, record, turns).await?;
        state.set_status(PageStatus::Succeeded);
        tracing::info!(page, attempts = state.attempts(), "page complete");
        Ok(updated)
    }

    /// Produce the page's story text and the conversation turns it cost.
    ///
    /// Pre-written text from the book definition wins and costs nothing.
    /// Otherwise the text model writes it: one call with the primary
    /// prompt, and on a validation failure a single call with the backup
    /// prompt before the page goes fatal.
    async fn story_text(
        &self,
        composer: &PromptComposer<'_>,
        page: u32,
        previous: &BTreeMap<u32, String>,
        checkpoint: &BookCheckpoint,
        temperature: f32,
    ) -> CaldecottResult<(String, Vec<ConversationTurn>)> {
        if let Some(text) = self.config.page_text(page)? {
            tracing::debug!(page, "using pre-written story text");
            return Ok((text.to_string(), Vec::new()));
        }

        let prompt = composer.text_prompt(page, previous);
        let raw = self.call_text(&prompt, checkpoint, temperature).await?;
        let text = extract_story_text(&raw, page);
        match validate_story_text(page, &text) {
            Ok(()) => {
                let turns = vec![
                    ConversationTurn::user(prompt),
                    ConversationTurn::model(text.clone()),
                ];
                Ok((text, turns))
            }
            Err(err) => {
                tracing::warn!(page, %err, "story text rejected, trying backup prompt");
                let backup = composer.backup_text_prompt(page, previous);
                let raw = self.call_text(&backup, checkpoint, temperature).await?;
                let text = extract_story_text(&raw, page);
                validate_story_text(page, &text)?;
                let turns = vec![
                    ConversationTurn::user(backup),
                    ConversationTurn::model(text.clone()),
                ];
                Ok((text, turns))
            }
        }
    }

    /// One text call with the rolling conversation window as context.
    async fn call_text(
        &self,
        prompt: &str,
        checkpoint: &BookCheckpoint,
        temperature: f32,
    ) -> CaldecottResult<String> {
        let window = *self.config.generation().conversation_window();
        let mut messages: Vec<Message> = checkpoint
            .conversation_window(window)
            .iter()
            .map(|turn| {
                let role = if turn.role == "user" {
                    Role::User
                } else {
                    Role::Assistant
                };
                Message::text(role, turn.text.clone())
            })
            .collect();
        messages.push(Message::text(Role::User, prompt));

        let request = GenerateRequest {
            messages,
            max_tokens: None,
            temperature: Some(temperature),
            model: None,
        };
        let response = self.driver.generate(&request).await?;
        response.text().map(str::to_string).ok_or_else(|| {
            GeminiError::new(GeminiErrorKind::ResponseDecode(
                "response contained no text".to_string(),
            ))
            .into()
        })
    }

    /// One illustration call; an imageless reply is an error so the
    /// retry ladder can treat it like any other transient failure.
    async fn illustrate_once(
        &self,
        prompt: &str,
        temperature: f32,
        reference: Option<ReferenceImage>,
    ) -> CaldecottResult<(String, Vec<u8>)> {
        let request = IllustrateRequest {
            prompt: prompt.to_string(),
            reference,
            temperature: Some(temperature),
            model: None,
        };
        let response = self.driver.illustrate(&request).await?;
        let Some((mime, data)) = response.image() else {
            return Err(GeminiError::new(GeminiErrorKind::MissingImage).into());
        };
        Ok((mime.unwrap_or("image/png").to_string(), data.to_vec()))
    }

    /// The visual reference for a page, when the selector chose one.
    async fn reference_image(
        &self,
        state: &PageState<'_>,
        checkpoint: &BookCheckpoint,
    ) -> CaldecottResult<Option<ReferenceImage>> {
        match *state.reference_page() {
            Some(page) => {
                let reference = self.reference_for_page(page, checkpoint).await?;
                tracing::debug!(page = state.page(), reference = page, "loaded visual reference");
                Ok(Some(reference))
            }
            None => Ok(None),
        }
    }

    /// Load a completed page's pristine artifact as reference input.
    async fn reference_for_page(
        &self,
        page: u32,
        checkpoint: &BookCheckpoint,
    ) -> CaldecottResult<ReferenceImage> {
        let record = checkpoint
            .page(page)
            .ok_or_else(|| CheckpointError::new(CheckpointErrorKind::PageNotRecorded(page)))?;
        let data = self.artifacts.retrieve(&record.pristine).await?;
        Ok(ReferenceImage {
            mime: record.pristine.mime_type.clone(),
            data,
        })
    }

    /// Best-effort failure note; the page's original error still
    /// propagates even when the note cannot be written.
    async fn note_failure(&self, page: u32, err: &CaldecottError) {
        if let Err(note_err) = self.checkpoints.record_failure(page, err.to_string()).await {
            tracing::warn!(page, %note_err, "could not record the failure");
        }
    }

    /// Fixed pause between successive generations, additional to the
    /// reactive rate limiter.
    async fn pace(&self) {
        let delay = *self.config.generation().page_delay_seconds();
        if delay > 0 {
            tracing::debug!(seconds = delay, "pacing before next page");
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }
    }
}

/// Backoff before the next attempt, or `None` when the error is not
/// retryable.
///
/// Doubles from the error kind's initial backoff and caps at its maximum
/// delay. The attempt ceiling comes from the book's generation controls;
/// the kind's own retry count is unused here.
fn retry_delay(err: &CaldecottError, attempt: u32) -> Option<Duration> {
    let CaldecottErrorKind::Gemini(gemini) = err.kind() else {
        return None;
    };
    if !gemini.is_retryable() {
        return None;
    }
    let (initial_ms, _, max_delay_secs) = gemini.retry_strategy_params();
    let exponent = attempt.saturating_sub(1).min(16);
    let delay_ms = initial_ms.saturating_mul(1u64 << exponent);
    Some(Duration::from_millis(delay_ms.min(max_delay_secs * 1000)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_error(status_code: u16) -> CaldecottError {
        GeminiError::new(GeminiErrorKind::HttpError {
            status_code,
            message: "busy".to_string(),
        })
        .into()
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let err = http_error(503);
        assert_eq!(retry_delay(&err, 1), Some(Duration::from_millis(2000)));
        assert_eq!(retry_delay(&err, 2), Some(Duration::from_millis(4000)));
        assert_eq!(retry_delay(&err, 3), Some(Duration::from_millis(8000)));
        assert_eq!(retry_delay(&err, 10), Some(Duration::from_secs(60)));
    }

    #[test]
    fn permanent_errors_do_not_retry() {
        assert_eq!(retry_delay(&http_error(401), 1), None);
        let err: CaldecottError =
            CheckpointError::new(CheckpointErrorKind::CoverNotRecorded).into();
        assert_eq!(retry_delay(&err, 1), None);
    }

    #[test]
    fn missing_image_is_retryable() {
        let err: CaldecottError = GeminiError::new(GeminiErrorKind::MissingImage).into();
        assert_eq!(retry_delay(&err, 1), Some(Duration::from_millis(2000)));
        assert_eq!(retry_delay(&err, 12), Some(Duration::from_secs(30)));
    }
}
