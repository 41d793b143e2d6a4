//! Generation control sections: temperature schedule, anti-duplication
//! rules, art style, retry and pacing knobs, cover settings.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Temperature schedule from `[generation.temperature]`.
///
/// The effective temperature for a page is
/// `min(base + phase_increment * phase_index, max)` where `phase_index` is
/// the ordinal of the page's resolved phase in the primary phase map. Later
/// phases get more creative variance, up to a hard ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, derive_getters::Getters)]
pub struct TemperatureSchedule {
    /// Temperature for the first phase.
    #[serde(default = "default_base")]
    base: f32,
    /// Added per phase ordinal.
    #[serde(default = "default_increment")]
    phase_increment: f32,
    /// Hard ceiling.
    #[serde(default = "default_max")]
    max: f32,
}

fn default_base() -> f32 {
    0.2
}

fn default_increment() -> f32 {
    0.3
}

fn default_max() -> f32 {
    0.5
}

impl Default for TemperatureSchedule {
    fn default() -> Self {
        Self {
            base: default_base(),
            phase_increment: default_increment(),
            max: default_max(),
        }
    }
}

impl TemperatureSchedule {
    /// Effective temperature for a phase ordinal.
    pub fn for_phase_index(&self, phase_index: usize) -> f32 {
        (self.base + self.phase_increment * phase_index as f32).min(self.max)
    }
}

/// Anti-duplication rule text from `[generation.anti_duplication]`.
///
/// Rules may contain a `{num_characters}` placeholder which the composer
/// substitutes with the page's exact character count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct AntiDuplication {
    /// Core rules.
    #[serde(default)]
    rules: Vec<String>,
    /// Consistency requirements.
    #[serde(default)]
    consistency_rules: Vec<String>,
    /// Allowed variations.
    #[serde(default)]
    flexibility_rules: Vec<String>,
    /// Final verification checks.
    #[serde(default)]
    verification_rules: Vec<String>,
}

/// Art style directives from `[generation.art_style]`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct ArtStyle {
    /// Overall tone.
    #[serde(default = "default_tone")]
    tone: String,
    /// Render quality directive.
    #[serde(default = "default_quality")]
    quality: String,
    /// Embedded-text policy. Text is composited later, never rendered.
    #[serde(default = "default_text_policy")]
    text_policy: String,
    /// Frame format directive with `{width}`/`{height}` placeholders.
    #[serde(default = "default_format")]
    format: String,
}

fn default_tone() -> String {
    "Child-friendly".to_string()
}

fn default_quality() -> String {
    "High detail".to_string()
}

fn default_text_policy() -> String {
    "NO text in image".to_string()
}

fn default_format() -> String {
    "SQUARE image ({width}x{height} pixels)".to_string()
}

impl Default for ArtStyle {
    fn default() -> Self {
        Self {
            tone: default_tone(),
            quality: default_quality(),
            text_policy: default_text_policy(),
            format: default_format(),
        }
    }
}

/// Generation controls from the `[generation]` section.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, derive_getters::Getters)]
pub struct GenerationControls {
    /// Temperature schedule.
    #[serde(default)]
    temperature: TemperatureSchedule,
    /// Attempt ceiling per page, counting the first attempt.
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
    /// Pause between pages to stay under service quotas.
    #[serde(default = "default_page_delay")]
    page_delay_seconds: u64,
    /// How many conversation entries feed later text calls.
    #[serde(default = "default_conversation_window")]
    conversation_window: usize,
    /// Anti-duplication rule text.
    #[serde(default)]
    anti_duplication: AntiDuplication,
    /// Sequential generation steps for the image prompt.
    #[serde(default = "default_steps")]
    steps: Vec<String>,
    /// Art style directives.
    #[serde(default)]
    art_style: ArtStyle,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_page_delay() -> u64 {
    8
}

fn default_conversation_window() -> usize {
    10
}

fn default_steps() -> Vec<String> {
    vec![
        "Create the scene background based on requirements.".to_string(),
        "Leave the scene EMPTY of characters initially.".to_string(),
        "Add EACH character ONE at a time, ensuring NO duplication occurs.".to_string(),
        "Position characters to clearly depict the story actions.".to_string(),
    ]
}

impl Default for GenerationControls {
    fn default() -> Self {
        Self {
            temperature: TemperatureSchedule::default(),
            max_attempts: default_max_attempts(),
            page_delay_seconds: default_page_delay(),
            conversation_window: default_conversation_window(),
            anti_duplication: AntiDuplication::default(),
            steps: default_steps(),
            art_style: ArtStyle::default(),
        }
    }
}

/// Output frame dimensions from `[image_settings]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct ImageSettings {
    /// Frame width in pixels.
    #[serde(default = "default_dimension")]
    width: u32,
    /// Frame height in pixels.
    #[serde(default = "default_dimension")]
    height: u32,
}

fn default_dimension() -> u32 {
    1024
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            width: default_dimension(),
            height: default_dimension(),
        }
    }
}

/// Reference-page selection policy from `[scene_management.reference_page]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize, derive_getters::Getters)]
pub struct ReferencePolicy {
    /// Advisory bound on how aggressively introduction-page preference
    /// overrides the most-recent-page default. Zero or negative disables
    /// the preference.
    #[serde(default = "default_similarity_threshold")]
    similarity_threshold: f64,
}

fn default_similarity_threshold() -> f64 {
    0.7
}

impl Default for ReferencePolicy {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

/// A character whose first appearance warrants special reference handling.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct SpecialIntroduction {
    /// Page of the distinctive first appearance.
    page: u32,
    /// Free-text role label for logging (e.g., "villain").
    #[serde(default)]
    character_type: Option<String>,
}

/// Scene management knobs from `[scene_management]`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, derive_getters::Getters)]
pub struct SceneManagement {
    /// Reference-page selection policy.
    #[serde(default)]
    reference_page: ReferencePolicy,
    /// Character key → special introduction record.
    #[serde(default)]
    special_introductions: HashMap<String, SpecialIntroduction>,
}

/// Cover settings from the `[cover]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct CoverConfig {
    /// Whether a cover is generated after the last page.
    #[serde(default)]
    generate_cover: bool,
    /// Title printed on the cover (book title when absent).
    #[serde(default)]
    cover_title: Option<String>,
    /// Author printed on the cover.
    #[serde(default)]
    cover_author: Option<String>,
    /// Completed page whose art anchors the cover style.
    #[serde(default = "default_reference_page")]
    reference_page_for_style: u32,
    /// Vertical placement of the cover text overlay.
    #[serde(default = "default_cover_position")]
    cover_text_position: String,
    /// Template with `{title}`, `{characters}`, `{theme}`, `{art_style}`,
    /// and `{author}` placeholders.
    #[serde(default)]
    cover_prompt_template: Option<String>,
}

fn default_reference_page() -> u32 {
    1
}

fn default_cover_position() -> String {
    "middle".to_string()
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            generate_cover: false,
            cover_title: None,
            cover_author: None,
            reference_page_for_style: default_reference_page(),
            cover_text_position: default_cover_position(),
            cover_prompt_template: None,
        }
    }
}

/// Authoring metadata from the `[metadata]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct Metadata {
    /// Book author.
    #[serde(default)]
    author: Option<String>,
}
