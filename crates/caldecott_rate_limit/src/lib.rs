//! Rate limiting and usage tier management.
//!
//! This crate provides rate limiting functionality to comply with Gemini API
//! quotas. Tier limits are loaded from TOML configuration rather than baked
//! into the library, so quota changes on the provider side never require a
//! code change.
//!
//! Limits are enforced with the governor crate (GCRA algorithm) for RPM, TPM
//! and RPD quotas plus a Tokio semaphore for concurrent request caps.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod limiter;
mod tier;

pub use config::{CaldecottConfig, ModelTierConfig, ProviderConfig, TierConfig};
pub use limiter::{RateLimiter, RateLimiterGuard};
pub use tier::Tier;
