//! Scene continuity engine.
//!
//! Everything here is a pure function over a validated [`caldecott_book::BookConfig`]
//! and prior-page history. For each page the pipeline resolves a narrative
//! phase, determines which characters are present and in what state,
//! classifies the visual environment, derives concrete continuity
//! instructions relative to the previous page, picks a completed page to
//! supply as a visual reference, and composes the instruction payload for
//! the generation service. Sequencing and side effects live with the
//! caller; nothing in this crate performs IO.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod compose;
mod environment;
mod extract;
mod phase;
mod presence;
mod reference;
mod state;
mod transition;

pub use compose::{CoverPrompt, PromptBundle, PromptComposer};
pub use environment::{EnvironmentClassifier, UNCLASSIFIED};
pub use extract::{extract_story_text, validate_story_text};
pub use phase::PhaseResolver;
pub use presence::{ActiveCharacter, CharacterPresenceResolver, DescriptorKind};
pub use reference::ReferenceSelector;
pub use state::{PageState, PageStatus, ScenePipeline};
pub use transition::{SceneFrame, TransitionGuidance, TransitionGuideBuilder};
