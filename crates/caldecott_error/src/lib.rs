//! Error types for the Caldecott picture-book engine.
//!
//! This crate provides the foundation error types used throughout the Caldecott
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! The four failure classes of the generation pipeline map onto these types:
//! configuration problems ([`BookError`], [`ConfigError`]) abort before any page
//! runs, transient service problems (retryable [`GeminiError`] kinds) back off
//! and retry, content validation problems ([`SceneError`]) get one backup-prompt
//! retry, and persistence problems ([`StorageError`], [`CheckpointError`]) are
//! fatal because silent loss would corrupt resumability.
//!
//! # Examples
//!
//! ```
//! use caldecott_error::{CaldecottResult, HttpError};
//!
//! fn fetch_data() -> CaldecottResult<String> {
//!     Err(HttpError::new("Connection refused"))?
//! }
//!
//! match fetch_data() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod book;
mod checkpoint;
mod config;
mod error;
mod gemini;
mod http;
mod json;
mod overlay;
mod scene;
mod storage;

pub use book::{BookError, BookErrorKind};
pub use checkpoint::{CheckpointError, CheckpointErrorKind};
pub use config::ConfigError;
pub use error::{CaldecottError, CaldecottErrorKind, CaldecottResult};
pub use gemini::{GeminiError, GeminiErrorKind, RetryableError};
pub use http::HttpError;
pub use json::JsonError;
pub use overlay::{OverlayError, OverlayErrorKind};
pub use scene::{SceneError, SceneErrorKind};
pub use storage::{StorageError, StorageErrorKind};
