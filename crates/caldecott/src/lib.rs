//! Caldecott - Illustrated Book Generation Engine
//!
//! Caldecott generates multi-page illustrated picture books against a
//! multimodal model API, one page at a time, with visual continuity
//! between pages. A TOML book definition drives the run; a checkpoint
//! makes every run resumable and every page regenerable.
//!
//! # Features
//!
//! - **Scene Continuity**: Each page is composed from its narrative phase,
//!   environment, and the characters present, so illustrations stay
//!   consistent across the book
//! - **Checkpointed Resume**: Completed pages persist immediately; an
//!   interrupted run picks up at the first pending page
//! - **Visual References**: Completed illustrations feed back into later
//!   pages as style and character references
//! - **Rate Limiting**: Automatic rate limiting and retry with exponential
//!   backoff
//! - **Cover Generation**: A cover pass anchored to a completed interior
//!   page
//! - **Caption Overlay**: Story text composited onto pristine artifacts as
//!   a separate, repeatable pass
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use caldecott::{
//!     BookConfig, FileSystemArtifacts, GeminiClient, JsonCheckpointStore, Orchestrator,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BookConfig::from_file("book.toml")?;
//!     let driver = GeminiClient::new_with_config(None)?;
//!     let artifacts = FileSystemArtifacts::new("output")?;
//!     let checkpoints = JsonCheckpointStore::new("output/checkpoint.json");
//!
//!     let orchestrator = Orchestrator::new(config, driver, checkpoints, artifacts);
//!     let outcome = orchestrator.run().await?;
//!     println!("Generated pages: {:?}", outcome.pages_generated);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Caldecott is organized as a workspace with focused crates:
//!
//! - `caldecott-core` - Core request and response types
//! - `caldecott-interface` - ArtDriver trait definition
//! - `caldecott-error` - Error types
//! - `caldecott-rate-limit` - Rate limiting and retry logic
//! - `caldecott-book` - TOML book definition model
//! - `caldecott-scene` - Scene resolution and prompt composition
//! - `caldecott-storage` - Artifacts, checkpoints, and caption overlay
//! - `caldecott-models` - Model provider implementations
//!
//! This crate (`caldecott`) adds the page-by-page orchestrator and
//! re-exports everything for convenience.

// Re-export member crates
pub use caldecott_book::*;
pub use caldecott_core::*;
pub use caldecott_error::*;
pub use caldecott_interface::{
    ArtDriver,
    Illustrate,
    IllustrateRequest,
    IllustrateRequestBuilder,
    IllustrateRequestBuilderError,
    ModelMetadata,
    ReferenceImage,
    // Note: Metadata trait NOT re-exported to avoid ambiguity
    // Use caldecott_interface::Metadata for the capability trait
    // Use caldecott_book::Metadata for the book metadata table
};
pub use caldecott_models::*;
pub use caldecott_rate_limit::*;
pub use caldecott_scene::*;
pub use caldecott_storage::*;

// The page loop lives here rather than in a member crate
mod orchestrator;

pub use orchestrator::{Orchestrator, OverlaySelection, RunOutcome};
