//! Google Gemini API client implementation.
//!
//! This module provides one client with two call paths:
//!
//! - [`GeminiClient::generate`](caldecott_interface::ArtDriver::generate) -
//!   conversation-style text generation through the `gemini-rust` SDK
//! - [`GeminiClient::illustrate`](caldecott_interface::Illustrate::illustrate) -
//!   direct REST calls for image generation, because the request must carry
//!   inline reference image data and image response modalities
//!
//! Both paths share the same per-model rate limiting pool semantics:
//! clients and limiters are created lazily per model name, so different
//! pages (or the cover) can target different models with independent quotas.

mod client;
mod rest;

pub use client::{GeminiClient, TieredGemini};
pub use rest::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    InlineData, Part,
};

/// Result type for Gemini operations.
pub type GeminiResult<T> = Result<T, caldecott_error::GeminiError>;
