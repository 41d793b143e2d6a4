//! Core type definitions for the Caldecott interface.

use serde::{Deserialize, Serialize};

/// A reference image attached to an illustration request.
///
/// Carries raw bytes rather than a [`caldecott_core::MediaSource`] because
/// illustration backends upload inline data, never URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceImage {
    /// MIME type of the image payload (e.g., "image/png").
    pub mime: String,
    /// Raw image bytes.
    pub data: Vec<u8>,
}

/// Request for a single illustration.
///
/// The prompt carries the full scene description; the optional reference
/// image conditions the backend on previously rendered art so characters
/// and environments stay visually consistent across pages.
#[derive(Debug, Clone, Default, PartialEq, derive_builder::Builder)]
#[builder(default, setter(into, strip_option))]
pub struct IllustrateRequest {
    /// Scene description to render.
    pub prompt: String,
    /// Optional reference image for visual continuity.
    pub reference: Option<ReferenceImage>,
    /// Sampling temperature override.
    pub temperature: Option<f32>,
    /// Model override (None = backend default).
    pub model: Option<String>,
}

/// Information about model capabilities and limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMetadata {
    /// Provider name (e.g., "gemini")
    pub provider: &'static str,
    /// Model identifier (e.g., "gemini-2.0-flash")
    pub model: String,
    /// Maximum input context tokens
    pub max_input_tokens: usize,
    /// Maximum output tokens per request
    pub max_output_tokens: usize,
    /// Supports image inputs (vision)
    pub supports_vision: bool,
    /// Supports image outputs (illustration)
    pub supports_illustration: bool,
}

