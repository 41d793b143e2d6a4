//! Trait definitions for generation backends and their capabilities.

use crate::{IllustrateRequest, ModelMetadata};
use async_trait::async_trait;
use caldecott_core::{GenerateRequest, GenerateResponse};
use caldecott_error::CaldecottResult;

/// Core trait that all generation backends must implement.
///
/// This provides the minimal interface for synchronous text generation.
/// Additional capabilities are exposed through optional traits.
#[async_trait]
pub trait ArtDriver: Send + Sync {
    /// Generate model output given a multimodal request.
    async fn generate(&self, req: &GenerateRequest) -> CaldecottResult<GenerateResponse>;

    /// Provider name (e.g., "gemini").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "gemini-2.0-flash").
    fn model_name(&self) -> &str;
}

/// Trait for backends that can render an illustration from a prompt.
///
/// Responses may interleave narration text with the rendered image, so
/// implementations return the full multimodal output rather than bare
/// image bytes.
#[async_trait]
pub trait Illustrate: ArtDriver {
    /// Render one illustration, optionally conditioned on a reference image.
    async fn illustrate(&self, req: &IllustrateRequest) -> CaldecottResult<GenerateResponse>;

    /// Maximum number of reference images per request.
    fn max_reference_images(&self) -> usize {
        1
    }

    /// Supported reference image formats (MIME types).
    fn supported_image_formats(&self) -> &[&'static str] {
        &["image/png", "image/jpeg", "image/webp"]
    }

    /// Maximum reference image size in bytes.
    fn max_image_size_bytes(&self) -> usize {
        7 * 1024 * 1024
    }
}

/// Trait for querying model capabilities and limits.
pub trait Metadata: ArtDriver {
    /// Get comprehensive metadata about this model.
    fn metadata(&self) -> ModelMetadata;

    /// Maximum tokens in input context.
    fn max_input_tokens(&self) -> usize {
        self.metadata().max_input_tokens
    }

    /// Maximum tokens in output.
    fn max_output_tokens(&self) -> usize {
        self.metadata().max_output_tokens
    }
}
