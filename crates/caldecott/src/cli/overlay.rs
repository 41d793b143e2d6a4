//! Caption overlay command handler.

use caldecott::{BookConfig, CaldecottResult, OverlaySelection, PlanOverlayRenderer};
use std::path::Path;

/// Composite caption text onto pristine artwork.
///
/// # Arguments
///
/// * `book` - Path to the book definition TOML file
/// * `output` - Directory for artifacts and the checkpoint
/// * `page` - Caption a single page when set
/// * `cover` - Caption the cover only when set
pub async fn apply_text(
    book: &Path,
    output: &Path,
    page: Option<u32>,
    cover: bool,
) -> CaldecottResult<()> {
    use super::generate::build_orchestrator;

    let selection = if cover {
        OverlaySelection::Cover
    } else if let Some(page) = page {
        OverlaySelection::Page(page)
    } else {
        OverlaySelection::Completed
    };

    tracing::info!(book = %book.display(), ?selection, "Loading book definition");
    let config = BookConfig::from_file(book)?;
    let title = config.book().title().clone();

    let orchestrator = build_orchestrator(config, output)?;
    let renderer = PlanOverlayRenderer::new(output.join("overlay_plan.json"));
    let targets = orchestrator.apply_text(&renderer, selection).await?;

    // Print overlay summary
    println!("\nCaption Overlay Summary:");
    println!("========================");
    println!("Book: {}", title);
    println!("Targets composited: {}", targets.len());
    for target in &targets {
        println!("  {}", target);
    }
    println!("Output: {}", output.display());
    println!();

    Ok(())
}
