//! Core data types for the Caldecott picture-book engine.
//!
//! This crate provides the wire vocabulary spoken between the orchestrator and
//! the generation service drivers: multimodal inputs, conversation messages,
//! and generation requests/responses.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod input;
mod media;
mod message;
mod output;
mod request;
mod role;

pub use input::Input;
pub use media::MediaSource;
pub use message::{Message, MessageBuilder};
pub use output::Output;
pub use request::{GenerateRequest, GenerateRequestBuilder, GenerateResponse};
pub use role::Role;
