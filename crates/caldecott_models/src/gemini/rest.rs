//! Wire types for the Gemini `generateContent` REST endpoint.
//!
//! Text generation rides the `gemini-rust` SDK, so these types only serve the
//! illustration path: that request must attach an inline reference image and
//! ask for image response modalities, which the SDK builder does not carry.

use serde::{Deserialize, Serialize};

/// Request body for a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    /// Conversation turns; illustration calls send a single user turn.
    pub contents: Vec<Content>,
    /// Sampling and modality settings.
    pub generation_config: GenerationConfig,
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// Turn role ("user" or "model"); responses may omit it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Ordered message parts.
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// A user turn carrying the given parts.
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }
}

/// One part of a turn: prompt text or inline binary data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    /// Text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Inline binary content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    /// A text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    /// An inline data part from an already base64-encoded payload.
    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

/// Inline binary payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    /// MIME type, e.g. "image/png".
    pub mime_type: String,
    /// Base64-encoded bytes.
    pub data: String,
}

/// Sampling and modality settings for a `generateContent` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Top-k sampling cutoff.
    pub top_k: u32,
    /// Output token ceiling; `None` lets the service default apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Requested response modalities; empty means text only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<String>,
}

impl GenerationConfig {
    /// Settings for an illustration call (text and image response modalities).
    pub fn for_illustration(temperature: f32) -> Self {
        Self {
            temperature,
            top_p: 1.0,
            top_k: 32,
            max_output_tokens: None,
            response_modalities: vec!["Text".to_string(), "Image".to_string()],
        }
    }
}

/// Response body from a `generateContent` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    /// Generated candidates; empty when the prompt was blocked.
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Generated content; may be absent on safety stops.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    /// Why generation stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: Option<ApiErrorDetail>,
}

/// Error details within the envelope.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}
