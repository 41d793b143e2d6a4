//! Keyword-based environment classification.

use caldecott_book::{BookConfig, SceneDescriptor};

/// Tag returned when no environment category matches a scene.
///
/// Downstream transition building treats this as "no rule applicable" and
/// falls back to default transition parameters.
pub const UNCLASSIFIED: &str = "unclassified";

/// Scores scenes against the configured environment taxonomy.
///
/// This is a heuristic stand-in for semantic scene understanding: indicator
/// keywords score 2, characteristic keywords score 1, matched
/// case-insensitively by substring against the scene's description,
/// elements, and atmosphere. A richer classifier could replace this behind
/// the same contract without touching anything downstream.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct EnvironmentClassifier<'a> {
    config: &'a BookConfig,
}

impl<'a> EnvironmentClassifier<'a> {
    /// Environment tag for a scene.
    ///
    /// Returns the highest-scoring category, ties going to the earlier
    /// declaration. [`UNCLASSIFIED`] when nothing scores above zero.
    #[tracing::instrument(skip_all)]
    pub fn classify(&self, scene: &SceneDescriptor) -> &'a str {
        let haystack = format!(
            "{} {} {}",
            scene.description().to_lowercase(),
            scene
                .elements()
                .iter()
                .map(|e| e.to_lowercase())
                .collect::<Vec<_>>()
                .join(" "),
            scene.atmosphere().to_lowercase()
        );

        let mut best: Option<(&'a str, u32)> = None;
        for environment in self.config.environments() {
            let mut score = 0u32;
            for indicator in environment.indicators() {
                if haystack.contains(&indicator.to_lowercase()) {
                    score += 2;
                }
            }
            for characteristic in environment.characteristics() {
                if haystack.contains(&characteristic.to_lowercase()) {
                    score += 1;
                }
            }
            // Strict comparison keeps the first declaration on ties.
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((environment.name(), score));
            }
        }

        match best {
            Some((tag, score)) => {
                tracing::debug!(tag, score, "classified scene");
                tag
            }
            None => {
                tracing::debug!("no environment matched");
                UNCLASSIFIED
            }
        }
    }
}
