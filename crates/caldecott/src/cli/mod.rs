//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the caldecott binary.

mod commands;
mod generate;
mod overlay;

pub use commands::{Cli, Commands};
pub use generate::{generate_cover, regenerate_pages, run_book};
pub use overlay::apply_text;
