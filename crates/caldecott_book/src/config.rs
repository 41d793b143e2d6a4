//! Book definition loading and validation.
//!
//! A book is a single TOML file. Every section other than `[book]` is
//! optional: missing sections deserialize to empty defaults and the engine
//! degrades gracefully (no characters means no character instructions, no
//! transitions means blend defaults, and so on). Validation is structural
//! only and runs once at load, so downstream resolution never has to
//! re-check page ranges or scene references.

use crate::{
    Character, CoverConfig, EnvironmentType, GenerationControls, ImageSettings, Metadata,
    PageEmotion, SceneDescriptor, SceneManagement, StoryProgression, Transitions,
};
use caldecott_error::{BookError, BookErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

/// Book identity and global prompt instructions from the `[book]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct BookMeta {
    /// Book title.
    title: String,
    /// Number of story pages (the cover is extra).
    page_count: u32,
    /// Story theme, used in cover prompts.
    #[serde(default)]
    theme: Option<String>,
    /// Overall art style label.
    #[serde(default)]
    art_style: Option<String>,
    /// Character consistency directives copied into every image prompt.
    #[serde(default)]
    character_consistency: Vec<String>,
    /// Style consistency directives copied into every image prompt.
    #[serde(default)]
    style_consistency: Vec<String>,
    /// Directives for the story text calls.
    #[serde(default)]
    text_instructions: Vec<String>,
    /// Extra directives appended only on the final page.
    #[serde(default)]
    final_page_instructions: Vec<String>,
    /// Extra directives appended to every image prompt.
    #[serde(default)]
    generation_instructions: Vec<String>,
}

/// Pre-written page texts from the `[story]` section.
///
/// When present, one entry per page in order. An empty list means the
/// service writes the text for each page instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct Story {
    /// Page texts, index 0 is page 1.
    #[serde(default)]
    pages: Vec<String>,
}

/// Complete book definition parsed from TOML.
///
/// # Example TOML Structure
///
/// ```toml
/// [book]
/// title = "The River Lantern"
/// page_count = 2
///
/// [story]
/// pages = ["Nia finds a lantern.", "The lantern lights the river."]
///
/// [[characters]]
/// key = "nia"
/// name = "Nia"
/// appearance = "sleek brown fur, bright amber eyes"
///
/// [[story_progression.phases]]
/// name = "intro"
/// start_page = 1
/// end_page = 2
///
/// [scenes.intro]
/// location = "riverbank"
/// description = "a quiet riverbank at dusk"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, derive_getters::Getters)]
pub struct BookConfig {
    /// Book identity and global instructions.
    book: BookMeta,
    /// Pre-written page texts.
    #[serde(default)]
    story: Story,
    /// Character roster in declaration order.
    #[serde(default)]
    characters: Vec<Character>,
    /// Phase mapping.
    #[serde(default)]
    story_progression: StoryProgression,
    /// Phase name → scene descriptor.
    #[serde(default)]
    scenes: HashMap<String, SceneDescriptor>,
    /// Environment taxonomy in declaration order.
    #[serde(default)]
    environments: Vec<EnvironmentType>,
    /// Transition rules between environment tags.
    #[serde(default)]
    transitions: Transitions,
    /// Page number (decimal string) → emotional overrides.
    #[serde(default)]
    page_emotions: HashMap<String, PageEmotion>,
    /// Generation controls.
    #[serde(default)]
    generation: GenerationControls,
    /// Output frame dimensions.
    #[serde(default)]
    image_settings: ImageSettings,
    /// Scene management knobs.
    #[serde(default)]
    scene_management: SceneManagement,
    /// Cover settings.
    #[serde(default)]
    cover: CoverConfig,
    /// Authoring metadata.
    #[serde(default)]
    metadata: Metadata,
}

impl BookConfig {
    /// Loads a book definition from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML is invalid
    /// - Validation fails (empty book, dangling phase references, etc.)
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, BookError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BookError::new(BookErrorKind::FileRead(e.to_string())))?;

        content.parse()
    }

    /// Validates the book structure.
    ///
    /// Ensures:
    /// - At least one page exists
    /// - Story texts, when present, match the page count
    /// - Phase ranges stay inside the page sequence
    /// - Every referenced phase has a scene descriptor
    /// - Character introductions and emotion keys are well formed
    /// - The temperature schedule stays in sampling range
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    #[tracing::instrument(skip(self), fields(title = %self.book.title, pages = self.book.page_count))]
    pub fn validate(&self) -> Result<(), BookError> {
        let page_count = self.book.page_count;
        if page_count == 0 {
            return Err(BookError::new(BookErrorKind::EmptyPages));
        }

        if !self.story.pages.is_empty() && self.story.pages.len() != page_count as usize {
            return Err(BookError::new(BookErrorKind::StoryPageCountMismatch {
                expected: page_count,
                actual: self.story.pages.len(),
            }));
        }

        for phase in self.story_progression.phases() {
            let start = *phase.start_page();
            let end = *phase.end_page();
            if start == 0 || start > end || end > page_count {
                return Err(BookError::new(BookErrorKind::InvalidPageRange {
                    phase: phase.name().clone(),
                    start,
                    end,
                }));
            }
            if !self.scenes.contains_key(phase.name()) {
                return Err(BookError::new(BookErrorKind::MissingScene(
                    phase.name().clone(),
                )));
            }
        }

        for fallback in self.story_progression.fallback_phases() {
            let start = fallback.start_page().unwrap_or(1);
            let end = fallback.end_page().unwrap_or(page_count);
            if start == 0 || start > end || end > page_count {
                return Err(BookError::new(BookErrorKind::InvalidPageRange {
                    phase: fallback.name().clone(),
                    start,
                    end,
                }));
            }
            if !self.scenes.contains_key(fallback.name()) {
                return Err(BookError::new(BookErrorKind::MissingScene(
                    fallback.name().clone(),
                )));
            }
        }

        let default_phase = self.story_progression.default_phase();
        if !self.scenes.contains_key(default_phase) {
            return Err(BookError::new(BookErrorKind::MissingDefaultScene(
                default_phase.clone(),
            )));
        }

        for character in &self.characters {
            let intro_page = *character.introduction().page();
            if intro_page == 0 || intro_page > page_count {
                return Err(BookError::new(BookErrorKind::IntroductionOutOfRange {
                    character: character.key().clone(),
                    page: intro_page,
                    page_count,
                }));
            }
            for key in character.emotional_states().keys() {
                if key.parse::<u32>().is_err() {
                    return Err(BookError::new(BookErrorKind::InvalidEmotionPage {
                        character: character.key().clone(),
                        key: key.clone(),
                    }));
                }
            }
        }

        for key in self.page_emotions.keys() {
            if key.parse::<u32>().is_err() {
                return Err(BookError::new(BookErrorKind::InvalidPageEmotionKey(
                    key.clone(),
                )));
            }
        }

        let schedule = self.generation.temperature();
        if *schedule.base() < 0.0 || schedule.max() < schedule.base() {
            return Err(BookError::new(BookErrorKind::InvalidTemperature {
                base: *schedule.base(),
                max: *schedule.max(),
            }));
        }

        if *self.cover.generate_cover() {
            let reference = *self.cover.reference_page_for_style();
            if reference == 0 || reference > page_count {
                return Err(BookError::new(BookErrorKind::PageOutOfRange {
                    page: reference,
                    page_count,
                }));
            }
        }

        Ok(())
    }

    /// Pre-written text for a page, if the story section provides one.
    ///
    /// # Errors
    ///
    /// Returns an error if `page` is outside the book.
    pub fn page_text(&self, page: u32) -> Result<Option<&str>, BookError> {
        if page == 0 || page > self.book.page_count {
            return Err(BookError::new(BookErrorKind::PageOutOfRange {
                page,
                page_count: self.book.page_count,
            }));
        }
        Ok(self.story.pages.get(page as usize - 1).map(String::as_str))
    }

    /// Character by configuration key.
    pub fn character(&self, key: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.key() == key)
    }

    /// Scene descriptor for a phase.
    pub fn scene(&self, phase: &str) -> Option<&SceneDescriptor> {
        self.scenes.get(phase)
    }

    /// Page-level emotional overrides, if any.
    ///
    /// Entries are keyed by the page's decimal string form.
    pub fn page_emotion(&self, page: u32) -> Option<&PageEmotion> {
        self.page_emotions.get(&page.to_string())
    }

    /// Environment type by name.
    pub fn environment(&self, name: &str) -> Option<&EnvironmentType> {
        self.environments.iter().find(|e| e.name() == name)
    }

    /// Whether `page` is the last story page.
    pub fn is_final_page(&self, page: u32) -> bool {
        page == self.book.page_count && page > 0
    }
}

impl FromStr for BookConfig {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self =
            toml::from_str(s).map_err(|e| BookError::new(BookErrorKind::TomlParse(e.to_string())))?;
        config.validate()?;
        Ok(config)
    }
}
