//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Caldecott - Illustrated book generation with scene continuity and checkpointed resume
#[derive(Parser, Debug)]
#[command(name = "caldecott")]
#[command(about = "Illustrated book generation with scene continuity and checkpointed resume", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate every pending page of a book, resuming from the checkpoint
    Run {
        /// Path to the book definition TOML file
        #[arg(long)]
        book: PathBuf,

        /// Directory for artifacts and the checkpoint
        #[arg(long, default_value = "output")]
        output: PathBuf,
    },

    /// Regenerate specific pages, leaving the rest of the book untouched
    Regenerate {
        /// Path to the book definition TOML file
        #[arg(long)]
        book: PathBuf,

        /// Directory for artifacts and the checkpoint
        #[arg(long, default_value = "output")]
        output: PathBuf,

        /// Page numbers to regenerate
        #[arg(long, value_delimiter = ',', required = true)]
        pages: Vec<u32>,
    },

    /// Generate the cover from completed interior pages
    Cover {
        /// Path to the book definition TOML file
        #[arg(long)]
        book: PathBuf,

        /// Directory for artifacts and the checkpoint
        #[arg(long, default_value = "output")]
        output: PathBuf,
    },

    /// Composite caption text onto pristine artwork
    ApplyText {
        /// Path to the book definition TOML file
        #[arg(long)]
        book: PathBuf,

        /// Directory for artifacts and the checkpoint
        #[arg(long, default_value = "output")]
        output: PathBuf,

        /// Caption a single page instead of everything completed
        #[arg(long, conflicts_with = "cover")]
        page: Option<u32>,

        /// Caption the cover only
        #[arg(long)]
        cover: bool,
    },
}
