//! Caldecott CLI binary.
//!
//! This binary provides command-line access to Caldecott's functionality:
//! - Generate an illustrated book from a TOML definition
//! - Regenerate individual pages
//! - Generate the cover
//! - Composite caption text onto finished artwork

use clap::Parser;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use cli::{Cli, Commands, apply_text, generate_cover, regenerate_pages, run_book};

    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Execute the requested command
    match cli.command {
        Commands::Run { book, output } => {
            run_book(&book, &output).await?;
        }

        Commands::Regenerate {
            book,
            output,
            pages,
        } => {
            regenerate_pages(&book, &output, &pages).await?;
        }

        Commands::Cover { book, output } => {
            generate_cover(&book, &output).await?;
        }

        Commands::ApplyText {
            book,
            output,
            page,
            cover,
        } => {
            apply_text(&book, &output, page, cover).await?;
        }
    }

    Ok(())
}
