//! Shared helpers for driver integration tests.

pub mod mock_gemini;

#[allow(unused_imports)]
pub use mock_gemini::{MockBehavior, MockGeminiClient, MockResponse};

use caldecott_core::{GenerateRequest, Message, Role};

/// A single-turn user request.
pub fn user_request(prompt: &str, max_tokens: Option<u32>) -> GenerateRequest {
    GenerateRequest {
        messages: vec![Message::text(Role::User, prompt)],
        max_tokens,
        ..GenerateRequest::default()
    }
}
