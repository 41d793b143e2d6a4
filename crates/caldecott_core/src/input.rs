//! Input types for generation requests.

use crate::MediaSource;
use serde::{Deserialize, Serialize};

/// Supported input types to the generation service.
///
/// The engine speaks two modalities: prompt text and reference images
/// (a previously generated page supplied to anchor visual continuity).
///
/// # Examples
///
/// ```
/// use caldecott_core::{Input, MediaSource};
///
/// // Text input
/// let text = Input::Text("A fox crosses a mossy bridge".to_string());
///
/// // Reference image input with raw bytes
/// let image = Input::Image {
///     mime: Some("image/png".to_string()),
///     source: MediaSource::Binary(vec![0x89, 0x50, 0x4E, 0x47]),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Input {
    /// Plain text input.
    Text(String),

    /// Image input (PNG, JPEG, WebP, etc.).
    Image {
        /// MIME type, e.g., "image/png" or "image/jpeg"
        mime: Option<String>,
        /// Media source (URL, base64, or raw bytes)
        source: MediaSource,
    },
}

impl Input {
    /// Borrow the text content, if this is a text input.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Input::Text(text) => Some(text),
            _ => None,
        }
    }
}
