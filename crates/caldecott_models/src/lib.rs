//! Generation service drivers for Caldecott.
//!
//! This crate provides the client implementation that drives the external
//! multimodal generation service. The engine speaks to it through the
//! [`caldecott_interface`] traits, so the orchestrator never depends on a
//! concrete provider.
//!
//! # Gemini
//!
//! [`GeminiClient`] covers both call paths the book pipeline needs:
//!
//! - **Text generation** (story text, backup prompts) through the
//!   `gemini-rust` SDK, with per-model client pooling and rate limiting.
//! - **Illustration** through the REST `generateContent` endpoint, carrying
//!   an inline reference image and requesting image response modalities.
//!
//! # Example
//!
//! ```no_run
//! use caldecott_core::{GenerateRequest, Message, Role};
//! use caldecott_interface::ArtDriver;
//! use caldecott_models::GeminiClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GeminiClient::new()?;
//! let request = GenerateRequest {
//!     messages: vec![Message::text(Role::User, "Describe a village at dusk")],
//!     ..GenerateRequest::default()
//! };
//! let response = client.generate(&request).await?;
//! println!("{:?}", response.text());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod gemini;

pub use gemini::{
    Candidate, Content, GeminiClient, GeminiResult, GenerateContentRequest,
    GenerateContentResponse, GenerationConfig, InlineData, Part, TieredGemini,
};
