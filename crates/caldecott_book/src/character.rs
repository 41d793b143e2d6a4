//! Character definitions from the `[[characters]]` section.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// When and how a character first enters the narrative.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct Introduction {
    /// First page the character may appear on.
    #[serde(default = "default_intro_page")]
    page: u32,
    /// Optional word in the page text that announces the character.
    #[serde(default)]
    trigger: Option<String>,
}

fn default_intro_page() -> u32 {
    1
}

impl Default for Introduction {
    fn default() -> Self {
        Self {
            page: default_intro_page(),
            trigger: None,
        }
    }
}

/// A character in the book.
///
/// The `appearance`, `outfit`, and `features` fields are consistency-critical:
/// when present they are copied into every prompt that references the
/// character, verbatim and tagged as mandatory.
///
/// A character is active on a page when it has an action for the page's
/// resolved phase or an emotion entry for that page number. A character with
/// neither simply drops out of the story from that page on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct Character {
    /// Stable configuration key (e.g., "fox", "villain").
    key: String,
    /// Display name used in prompts and page text.
    name: String,
    /// Free-text description.
    #[serde(default)]
    description: String,
    /// Physical appearance, copied verbatim into prompts.
    #[serde(default)]
    appearance: Option<String>,
    /// Clothing, copied verbatim into prompts.
    #[serde(default)]
    outfit: Option<String>,
    /// Distinguishing features, copied verbatim into prompts.
    #[serde(default)]
    features: Option<String>,
    /// Introduction record.
    #[serde(default)]
    introduction: Introduction,
    /// Phase name → action text.
    #[serde(default)]
    actions: HashMap<String, String>,
    /// Page number (decimal string) → emotion text.
    #[serde(default)]
    emotional_states: HashMap<String, String>,
}

impl Character {
    /// Action text for a phase, if one is defined.
    pub fn action_for_phase(&self, phase: &str) -> Option<&str> {
        self.actions.get(phase).map(String::as_str)
    }

    /// Emotion text for a page, if one is defined.
    ///
    /// Emotion entries are keyed by the page's decimal string form.
    pub fn emotion_for_page(&self, page: u32) -> Option<&str> {
        self.emotional_states.get(&page.to_string()).map(String::as_str)
    }

    /// Whether the character has been introduced by `page`.
    pub fn introduced_by(&self, page: u32) -> bool {
        page >= *self.introduction.page()
    }
}
