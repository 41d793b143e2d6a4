//! Narrative phase mapping from the `[story_progression]` section.

use serde::{Deserialize, Serialize};

/// A primary phase entry covering an inclusive page range.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct PhaseRange {
    /// Phase name (keys into scene descriptors and character actions).
    name: String,
    /// First page of the range (inclusive).
    start_page: u32,
    /// Last page of the range (inclusive).
    end_page: u32,
}

impl PhaseRange {
    /// Whether `page` falls inside this range.
    pub fn contains(&self, page: u32) -> bool {
        self.start_page <= page && page <= self.end_page
    }
}

/// A fallback phase entry consulted when no primary range matches.
///
/// Either bound may be omitted: a missing start means "from page 1", a
/// missing end means "through the last page".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct FallbackRange {
    /// Phase name.
    name: String,
    /// First page of the range, open toward 1 when absent.
    #[serde(default)]
    start_page: Option<u32>,
    /// Last page of the range, open toward the page count when absent.
    #[serde(default)]
    end_page: Option<u32>,
}

impl FallbackRange {
    /// Whether `page` falls inside this range for a book of `page_count` pages.
    pub fn contains(&self, page: u32, page_count: u32) -> bool {
        let start = self.start_page.unwrap_or(1);
        let end = self.end_page.unwrap_or(page_count);
        start <= page && page <= end
    }
}

/// Ordered phase mapping with fallbacks and a guaranteed default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct StoryProgression {
    /// Primary phase ranges, scanned in declaration order.
    #[serde(default)]
    phases: Vec<PhaseRange>,
    /// Fallback ranges, scanned when no primary range matches.
    #[serde(default)]
    fallback_phases: Vec<FallbackRange>,
    /// Phase returned when nothing else matches.
    #[serde(default = "default_phase")]
    default_phase: String,
}

fn default_phase() -> String {
    "conclusion".to_string()
}

impl Default for StoryProgression {
    fn default() -> Self {
        Self {
            phases: Vec::new(),
            fallback_phases: Vec::new(),
            default_phase: default_phase(),
        }
    }
}

impl StoryProgression {
    /// Ordinal position of `phase` among the primary phases.
    ///
    /// Phases outside the primary map (fallbacks, the default) sit past the
    /// end of the primary ordering.
    pub fn phase_index(&self, phase: &str) -> usize {
        self.phases
            .iter()
            .position(|p| p.name() == phase)
            .unwrap_or(self.phases.len())
    }
}
