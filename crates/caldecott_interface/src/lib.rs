//! Trait definitions for the Caldecott generation library.
//!
//! This crate provides the core driver trait and the capability traits a
//! backend may additionally implement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{ArtDriver, Illustrate, Metadata};
pub use types::{
    IllustrateRequest, IllustrateRequestBuilder, IllustrateRequestBuilderError, ModelMetadata,
    ReferenceImage,
};
