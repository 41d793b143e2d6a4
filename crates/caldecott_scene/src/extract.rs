//! Story text extraction from raw generation responses.
//!
//! Responses are asked to wrap the page text in TEXT START / TEXT END
//! markers, but models drift: some answer with labeled sections, some with
//! quoted sentences, some with page headings. Extraction works down a
//! chain of progressively weaker heuristics so a usable candidate always
//! comes back; validation then decides whether the candidate is worth
//! keeping.

use caldecott_error::{SceneError, SceneErrorKind};

const TEXT_START: &str = "TEXT START";
const TEXT_END: &str = "TEXT END";

/// Minimum words for a page text to count as a story rather than noise.
const MIN_STORY_WORDS: usize = 5;

/// Pulls the story text for a page out of a raw response.
///
/// Tries, in order: explicit TEXT START/END markers, a labeled "text:"
/// section, quoted lines, lines following a `Page {n}` heading, and
/// finally the first three substantive lines. Always returns something;
/// callers decide whether the result passes validation.
pub fn extract_story_text(raw: &str, page: u32) -> String {
    if let Some(marked) = between_markers(raw) {
        return marked;
    }

    let lines: Vec<&str> = raw.lines().collect();

    let mut story_lines = labeled_section(&lines);
    if story_lines.is_empty() {
        story_lines = quoted_lines(&lines);
    }
    if story_lines.is_empty() {
        story_lines = after_page_heading(&lines, page);
    }
    if story_lines.is_empty() {
        story_lines = substantive_lines(&lines, 3);
    }

    story_lines.join("\n")
}

/// Content checks for an extracted page text.
///
/// # Errors
///
/// Returns an error when the text is too short to be a story. A failure
/// here earns one retry with the backup prompt before the page is fatal.
pub fn validate_story_text(page: u32, text: &str) -> Result<(), SceneError> {
    let words = text.split_whitespace().count();
    if words < MIN_STORY_WORDS {
        return Err(SceneError::new(SceneErrorKind::StoryValidation {
            page,
            reason: format!("only {words} words extracted"),
        }));
    }
    Ok(())
}

fn between_markers(raw: &str) -> Option<String> {
    let start = raw.find(TEXT_START)? + TEXT_START.len();
    let end = raw.find(TEXT_END)?;
    if start >= end {
        return None;
    }
    let extracted = raw[start..end].trim();
    if extracted.is_empty() {
        None
    } else {
        Some(extracted.to_string())
    }
}

/// Lines between a "text:" label and an "illustration" label.
fn labeled_section(lines: &[&str]) -> Vec<String> {
    let mut collected = Vec::new();
    let mut in_section = false;
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let lowered = line.to_lowercase();
        if lowered.contains("text:") {
            in_section = true;
            continue;
        }
        if lowered.contains("illustration") {
            in_section = false;
            continue;
        }
        if in_section {
            collected.push(line.to_string());
        }
    }
    collected
}

fn quoted_lines(lines: &[&str]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| {
            line.matches('"').count() >= 2 || (line.starts_with('"') && line.ends_with('"'))
        })
        .map(|line| line.to_string())
        .collect()
}

/// Up to three substantive lines following a `Page {n}` heading.
fn after_page_heading(lines: &[&str], page: u32) -> Vec<String> {
    let plain = format!("Page {page}");
    let bold = format!("**Page {page}**");
    let mut collected = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        if !line.contains(&plain) && !line.contains(&bold) {
            continue;
        }
        for candidate in lines.iter().skip(i + 1).take(9) {
            if candidate.trim().is_empty() {
                continue;
            }
            if !candidate.starts_with('#')
                && !candidate.starts_with("**")
                && !candidate.to_lowercase().contains("text:")
            {
                collected.push(candidate.to_string());
            }
            if collected.len() >= 3 {
                break;
            }
        }
        break;
    }
    collected
}

fn substantive_lines(lines: &[&str], limit: usize) -> Vec<String> {
    lines
        .iter()
        .filter(|line| {
            !line.trim().is_empty() && !line.starts_with('#') && !line.starts_with("**")
        })
        .take(limit)
        .map(|line| line.to_string())
        .collect()
}
