//! Book definition model.
//!
//! This crate parses and validates the TOML book definition that drives a
//! generation run: page texts, characters, narrative phases, scene
//! descriptors, the environment taxonomy, transition rules, and generation
//! controls. The parsed [`BookConfig`] is immutable for the life of a run;
//! everything downstream treats it as a read-only lookup structure.
//!
//! Collections whose declaration order carries meaning (phases, characters,
//! environments) are arrays of tables in the TOML so the order survives
//! parsing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod character;
mod config;
mod controls;
mod environment;
mod progression;
mod scene;
mod transition;

pub use character::{Character, Introduction};
pub use config::{BookConfig, BookMeta, Story};
pub use controls::{
    AntiDuplication, ArtStyle, CoverConfig, GenerationControls, ImageSettings, Metadata,
    ReferencePolicy, SceneManagement, SpecialIntroduction, TemperatureSchedule,
};
pub use environment::EnvironmentType;
pub use progression::{FallbackRange, PhaseRange, StoryProgression};
pub use scene::{PageEmotion, ReferenceOverride, SceneDescriptor};
pub use transition::{DefaultTransition, TransitionRule, Transitions};
