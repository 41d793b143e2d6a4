//! Per-page runtime state.

use crate::{
    ActiveCharacter, CharacterPresenceResolver, EnvironmentClassifier, PhaseResolver,
    ReferenceSelector, SceneFrame, TransitionGuidance, TransitionGuideBuilder,
};
use caldecott_book::{BookConfig, SceneDescriptor};

/// Lifecycle of a single page generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PageStatus {
    /// Not reached yet.
    Pending,
    /// Resolving context and building prompts.
    Composing,
    /// Waiting on the generation service.
    Calling,
    /// Generated and checkpointed.
    Succeeded,
    /// Failed on a transient error; eligible for another attempt.
    FailedRetryable,
    /// Failed permanently; halts pages after this one.
    FailedFatal,
}

/// Everything resolved about a page before the service is called.
///
/// Built fresh for every generation attempt and discarded afterwards;
/// durable state lives in the checkpoint, never here.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct PageState<'a> {
    /// Page number.
    page: u32,
    /// Resolved narrative phase.
    phase: &'a str,
    /// Ordinal of the phase in the primary phase list.
    phase_index: usize,
    /// Scene descriptor for the phase.
    scene: &'a SceneDescriptor,
    /// Classified environment tag.
    environment: &'a str,
    /// Active characters in declaration order.
    characters: Vec<ActiveCharacter<'a>>,
    /// Continuity guidance from the previous page, absent on page 1.
    guidance: Option<TransitionGuidance>,
    /// Completed page supplying the visual reference, if any.
    reference_page: Option<u32>,
    /// Where the page is in its lifecycle.
    status: PageStatus,
    /// Attempts made so far.
    attempts: u32,
}

impl PageState<'_> {
    /// Advance the lifecycle.
    pub fn set_status(&mut self, status: PageStatus) {
        tracing::debug!(page = self.page, from = %self.status, to = %status, "page status");
        self.status = status;
    }

    /// Count one more generation attempt.
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }
}

/// Chains the resolution steps for one page into a single pure call.
///
/// Resolution depends only on the book definition and the completed-page
/// list, so a page can be (re)resolved at any time: mid-run, after a
/// restart, or for standalone regeneration.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct ScenePipeline<'a> {
    config: &'a BookConfig,
}

impl<'a> ScenePipeline<'a> {
    /// Resolve everything the composer needs for `page`.
    ///
    /// Returns `None` only when the page's phase has no scene descriptor,
    /// which validation rules out for any phase the resolver can produce.
    #[tracing::instrument(skip(self, completed_pages))]
    pub fn resolve(&self, page: u32, completed_pages: &[u32]) -> Option<PageState<'a>> {
        let phases = PhaseResolver::new(self.config);
        let classifier = EnvironmentClassifier::new(self.config);

        let phase = phases.resolve(page);
        let scene = self.config.scene(phase)?;
        let environment = classifier.classify(scene);
        let characters = CharacterPresenceResolver::new(self.config).resolve(page, phase);

        let guidance = if page > 1 {
            let prev_page = page - 1;
            let prev_phase = phases.resolve(prev_page);
            self.config.scene(prev_phase).map(|prev_scene| {
                let prev_tag = classifier.classify(prev_scene);
                TransitionGuideBuilder::new(self.config).build(
                    SceneFrame::new(prev_page, prev_tag, prev_scene),
                    SceneFrame::new(page, environment, scene),
                )
            })
        } else {
            None
        };

        let reference_page = ReferenceSelector::new(self.config).select(page, completed_pages);

        Some(PageState {
            page,
            phase,
            phase_index: phases.phase_index(phase),
            scene,
            environment,
            characters,
            guidance,
            reference_page,
            status: PageStatus::Pending,
            attempts: 0,
        })
    }
}
