//! Visual reference page selection.

use crate::{EnvironmentClassifier, PhaseResolver};
use caldecott_book::BookConfig;

/// Chooses which completed page, if any, anchors the current page visually.
///
/// The default policy is the most recently completed page strictly before
/// the current one. Two things change that: a scene whose reference
/// override declares full replacement gets no reference at all, and a
/// special character introduction prefers the nearest prior page set in the
/// same environment, so a distinctive first appearance is not anchored to
/// an unrelated composition.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct ReferenceSelector<'a> {
    config: &'a BookConfig,
}

impl ReferenceSelector<'_> {
    /// Reference page for `page`, drawn from `completed_pages`.
    ///
    /// Never returns the current page, a later page, or a page missing from
    /// `completed_pages`.
    #[tracing::instrument(skip(self, completed_pages))]
    pub fn select(&self, page: u32, completed_pages: &[u32]) -> Option<u32> {
        let scene = self.config.scene(PhaseResolver::new(self.config).resolve(page))?;

        if scene
            .reference_override()
            .as_ref()
            .is_some_and(|o| *o.full_replacement())
        {
            tracing::debug!(page, "override declares full replacement, no reference");
            return None;
        }

        let most_recent = completed_pages
            .iter()
            .copied()
            .filter(|&p| p < page)
            .max()?;

        if self.prefers_environment_match(page) {
            let tag = self.environment_tag(page);
            let same_tag = completed_pages
                .iter()
                .copied()
                .filter(|&p| p < page && self.environment_tag(p) == tag)
                .max();
            if let Some(candidate) = same_tag {
                if candidate != most_recent {
                    tracing::debug!(
                        page,
                        candidate,
                        most_recent,
                        "introduction page prefers matching environment"
                    );
                }
                return Some(candidate);
            }
        }

        Some(most_recent)
    }

    /// Whether this page is a special character introduction whose
    /// reference should match the environment rather than mere recency.
    fn prefers_environment_match(&self, page: u32) -> bool {
        let threshold = *self
            .config
            .scene_management()
            .reference_page()
            .similarity_threshold();
        if threshold <= 0.0 {
            return false;
        }
        self.config
            .scene_management()
            .special_introductions()
            .values()
            .any(|intro| *intro.page() == page)
    }

    fn environment_tag(&self, page: u32) -> &str {
        let phase = PhaseResolver::new(self.config).resolve(page);
        match self.config.scene(phase) {
            Some(scene) => EnvironmentClassifier::new(self.config).classify(scene),
            None => crate::UNCLASSIFIED,
        }
    }
}
