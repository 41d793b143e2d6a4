//! Page to narrative phase resolution.

use caldecott_book::BookConfig;

/// Maps page numbers to narrative phase names.
///
/// Resolution is total: primary ranges are scanned in declaration order,
/// then fallback ranges, then the configured default. Every page gets
/// exactly one phase, so downstream lookups always have a key.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct PhaseResolver<'a> {
    config: &'a BookConfig,
}

impl<'a> PhaseResolver<'a> {
    /// Phase name for a page.
    pub fn resolve(&self, page: u32) -> &'a str {
        let progression = self.config.story_progression();

        for phase in progression.phases() {
            if phase.contains(page) {
                return phase.name();
            }
        }

        let page_count = *self.config.book().page_count();
        for fallback in progression.fallback_phases() {
            if fallback.contains(page, page_count) {
                return fallback.name();
            }
        }

        progression.default_phase()
    }

    /// Ordinal of a phase in the primary phase list.
    ///
    /// Phases outside the primary list (fallbacks, the default) sort after
    /// every primary phase, so they get the highest temperature the
    /// schedule allows.
    pub fn phase_index(&self, phase: &str) -> usize {
        self.config.story_progression().phase_index(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BookConfig {
        r#"
        [book]
        title = "Resolution"
        page_count = 6

        [[story_progression.phases]]
        name = "intro"
        start_page = 1
        end_page = 2

        [[story_progression.phases]]
        name = "journey"
        start_page = 3
        end_page = 4

        [[story_progression.fallback_phases]]
        name = "twilight"
        start_page = 5

        [scenes.intro]
        description = "opening"

        [scenes.journey]
        description = "on the road"

        [scenes.twilight]
        description = "dusk settles"

        [scenes.conclusion]
        description = "the end"
        "#
        .parse()
        .unwrap()
    }

    #[test]
    fn every_page_resolves_to_exactly_one_phase() {
        let config = config();
        let resolver = PhaseResolver::new(&config);
        let phases: Vec<&str> = (1..=6).map(|p| resolver.resolve(p)).collect();
        assert_eq!(
            phases,
            vec!["intro", "intro", "journey", "journey", "twilight", "twilight"]
        );
    }

    #[test]
    fn default_phase_covers_gaps() {
        let config: BookConfig = r#"
            [book]
            title = "Gappy"
            page_count = 3

            [[story_progression.phases]]
            name = "intro"
            start_page = 1
            end_page = 1

            [scenes.intro]
            description = "opening"

            [scenes.conclusion]
            description = "the end"
            "#
        .parse()
        .unwrap();
        let resolver = PhaseResolver::new(&config);
        assert_eq!(resolver.resolve(2), "conclusion");
        assert_eq!(resolver.resolve(3), "conclusion");
    }

    #[test]
    fn primary_phases_win_over_fallbacks() {
        let config = config();
        let resolver = PhaseResolver::new(&config);
        // Page 3 is inside both "journey" and the open-ended region a
        // fallback could claim; the primary mapping wins.
        assert_eq!(resolver.resolve(3), "journey");
    }

    #[test]
    fn phase_index_follows_declaration_order() {
        let config = config();
        let resolver = PhaseResolver::new(&config);
        assert_eq!(resolver.phase_index("intro"), 0);
        assert_eq!(resolver.phase_index("journey"), 1);
        // Non-primary phases sort last.
        assert_eq!(resolver.phase_index("twilight"), 2);
        assert_eq!(resolver.phase_index("conclusion"), 2);
    }
}
