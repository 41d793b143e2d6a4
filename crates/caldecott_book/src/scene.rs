//! Scene descriptors and per-page emotional overrides.

use serde::{Deserialize, Serialize};

/// Explicit reference-image override for a scene.
///
/// When present this takes precedence over computed transition guidance:
/// `ignore_elements` are merged into the phase-out list and `force_elements`
/// into the introduce list. Setting `full_replacement` declares the prior
/// page's image actively misleading, which suppresses reference selection
/// entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct ReferenceOverride {
    /// Elements from the reference image to drop.
    #[serde(default)]
    ignore_elements: Vec<String>,
    /// Elements that must appear regardless of the reference image.
    #[serde(default)]
    force_elements: Vec<String>,
    /// Treat the scene as a fresh composition with no visual reference.
    #[serde(default)]
    full_replacement: bool,
}

/// Per-phase scene description from the `[scenes.<phase>]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct SceneDescriptor {
    /// Optional named location.
    #[serde(default)]
    location: Option<String>,
    /// What the scene depicts.
    #[serde(default)]
    description: String,
    /// Atmospheric notes.
    #[serde(default)]
    atmosphere: String,
    /// Ordered visual elements the scene should contain.
    #[serde(default)]
    elements: Vec<String>,
    /// Dominant emotion.
    #[serde(default)]
    emotion: String,
    /// Lighting directive.
    #[serde(default)]
    lighting: String,
    /// Overall mood.
    #[serde(default)]
    mood: String,
    /// What the eye should land on first.
    #[serde(default)]
    visual_focus: String,
    /// Palette directive.
    #[serde(default)]
    color_palette: String,
    /// How this scene evolves from the previous one.
    #[serde(default)]
    transition_from_previous: Option<String>,
    /// Explicit reference handling override.
    #[serde(default)]
    reference_override: Option<ReferenceOverride>,
}

/// Per-page emotional and visual overrides from `[page_emotions.<page>]`.
///
/// Keys are decimal page numbers. Any field left empty falls through to the
/// scene descriptor of the page's phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct PageEmotion {
    /// Emotion override.
    #[serde(default)]
    emotion: String,
    /// Lighting override.
    #[serde(default)]
    lighting: String,
    /// Mood override.
    #[serde(default)]
    mood: String,
    /// Visual focus override.
    #[serde(default)]
    visual_focus: String,
    /// Palette override.
    #[serde(default)]
    color_palette: String,
    /// Transition note carried into emotional guidance.
    #[serde(default)]
    transition_from_previous: Option<String>,
}
