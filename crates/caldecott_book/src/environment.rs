//! Environment taxonomy from the `[[environments]]` section.

use serde::{Deserialize, Serialize};

/// One environment category with its keyword signals.
///
/// Indicators are strong signals (a match scores 2), characteristics are
/// weaker (a match scores 1). Categories are compared case-insensitively by
/// substring against a scene's description, elements, and atmosphere; ties
/// go to the earlier declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct EnvironmentType {
    /// Category name (e.g., "forest", "village").
    name: String,
    /// Strong keyword signals.
    #[serde(default)]
    indicators: Vec<String>,
    /// Weaker keyword signals, also used as the maintain list when
    /// consecutive pages share this environment.
    #[serde(default)]
    characteristics: Vec<String>,
    /// Lighting used when no page-level override applies.
    #[serde(default)]
    lighting_defaults: Vec<String>,
}
