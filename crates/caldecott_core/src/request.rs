//! Request and response types for generation calls.

use crate::{Message, Output};
use serde::{Deserialize, Serialize};

/// Generic generation request (multimodal-safe).
///
/// # Examples
///
/// ```
/// use caldecott_core::{GenerateRequest, Message, Role, Input};
///
/// let request = GenerateRequest {
///     messages: vec![Message {
///         role: Role::User,
///         content: vec![Input::Text("Hello!".to_string())],
///     }],
///     max_tokens: Some(100),
///     temperature: Some(0.7),
///     model: Some("gemini-2.0-flash-lite".to_string()),
/// };
///
/// assert_eq!(request.messages.len(), 1);
/// assert_eq!(request.max_tokens, Some(100));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, derive_builder::Builder)]
#[builder(default, setter(into))]
pub struct GenerateRequest {
    /// The conversation messages to send
    pub messages: Vec<Message>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Model identifier to use
    pub model: Option<String>,
}

/// The unified response object.
///
/// # Examples
///
/// ```
/// use caldecott_core::{GenerateResponse, Output};
///
/// let response = GenerateResponse {
///     outputs: vec![Output::Text("Once upon a time...".to_string())],
/// };
///
/// assert_eq!(response.text(), Some("Once upon a time..."));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated outputs from the model
    pub outputs: Vec<Output>,
}

impl GenerateResponse {
    /// First text output, if any.
    pub fn text(&self) -> Option<&str> {
        self.outputs.iter().find_map(|o| match o {
            Output::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// First image output, if any, as `(mime, bytes)`.
    pub fn image(&self) -> Option<(Option<&str>, &[u8])> {
        self.outputs.iter().find_map(|o| match o {
            Output::Image { mime, data } => Some((mime.as_deref(), data.as_slice())),
            _ => None,
        })
    }
}
