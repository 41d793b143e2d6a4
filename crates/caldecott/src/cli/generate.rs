//! Generation command handlers.

use caldecott::{
    BookConfig, CaldecottResult, FileSystemArtifacts, GeminiClient, JsonCheckpointStore,
    Orchestrator,
};
use std::path::Path;

/// Build the production orchestrator for an output directory.
///
/// The driver reads its tier from `caldecott.toml` and its API key from
/// the environment; artifacts and the checkpoint land under `output`.
pub(crate) fn build_orchestrator(
    config: BookConfig,
    output: &Path,
) -> CaldecottResult<Orchestrator<GeminiClient, JsonCheckpointStore, FileSystemArtifacts>> {
    let driver = GeminiClient::new_with_config(None)?;
    let artifacts = FileSystemArtifacts::new(output)?;
    let checkpoints = JsonCheckpointStore::new(output.join("checkpoint.json"));
    Ok(Orchestrator::new(config, driver, checkpoints, artifacts))
}

/// Generate a book from a TOML definition.
///
/// # Arguments
///
/// * `book` - Path to the book definition TOML file
/// * `output` - Directory for artifacts and the checkpoint
pub async fn run_book(book: &Path, output: &Path) -> CaldecottResult<()> {
    tracing::info!(book = %book.display(), "Loading book definition");
    let config = BookConfig::from_file(book)?;
    let title = config.book().title().clone();
    tracing::info!(
        title = %title,
        pages = config.book().page_count(),
        "Book definition loaded"
    );

    let orchestrator = build_orchestrator(config, output)?;
    let outcome = orchestrator.run().await?;

    // Print generation summary
    println!("\nBook Generation Summary:");
    println!("========================");
    println!("Book: {}", title);
    println!("Pages generated: {}", outcome.pages_generated.len());
    println!("Pages skipped: {}", outcome.pages_skipped.len());
    println!("Cover generated: {}", outcome.cover_generated);
    println!("Output: {}", output.display());
    println!();

    Ok(())
}

/// Regenerate specific pages of a book.
///
/// # Arguments
///
/// * `book` - Path to the book definition TOML file
/// * `output` - Directory for artifacts and the checkpoint
/// * `pages` - Page numbers to regenerate
pub async fn regenerate_pages(book: &Path, output: &Path, pages: &[u32]) -> CaldecottResult<()> {
    tracing::info!(book = %book.display(), ?pages, "Loading book definition");
    let config = BookConfig::from_file(book)?;
    let title = config.book().title().clone();

    let orchestrator = build_orchestrator(config, output)?;
    let outcome = orchestrator.regenerate(pages).await?;

    // Print regeneration summary
    println!("\nPage Regeneration Summary:");
    println!("==========================");
    println!("Book: {}", title);
    println!("Pages regenerated: {:?}", outcome.pages_generated);
    println!("Output: {}", output.display());
    println!();

    Ok(())
}

/// Generate the cover for a book with completed interior pages.
///
/// # Arguments
///
/// * `book` - Path to the book definition TOML file
/// * `output` - Directory for artifacts and the checkpoint
pub async fn generate_cover(book: &Path, output: &Path) -> CaldecottResult<()> {
    tracing::info!(book = %book.display(), "Loading book definition");
    let config = BookConfig::from_file(book)?;
    let title = config.book().title().clone();

    let orchestrator = build_orchestrator(config, output)?;
    let record = orchestrator.generate_cover().await?;

    // Print cover summary
    println!("\nCover Generation Summary:");
    println!("=========================");
    println!("Book: {}", title);
    println!("Cover artifact: {}", record.pristine.storage_path);
    println!("Output: {}", output.display());
    println!();

    Ok(())
}
