//! Character presence resolution.

use caldecott_book::{BookConfig, Character};

/// Which lookup produced a character's primary descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DescriptorKind {
    /// The character has an action for the page's phase.
    Action,
    /// The character has an emotion for the page itself.
    Emotion,
}

/// A character active on a page with its situational descriptor.
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct ActiveCharacter<'a> {
    /// The character definition.
    character: &'a Character,
    /// Primary descriptor text.
    descriptor: &'a str,
    /// Where the primary descriptor came from.
    kind: DescriptorKind,
    /// Secondary expression guidance when an action-driven character also
    /// has an emotion for the page.
    expression: Option<&'a str>,
}

impl ActiveCharacter<'_> {
    /// The page's emotion for this character, whichever slot holds it.
    pub fn emotion(&self) -> Option<&str> {
        match self.kind {
            DescriptorKind::Emotion => Some(self.descriptor),
            DescriptorKind::Action => self.expression,
        }
    }

    /// The page's action for this character, if the descriptor is one.
    pub fn action(&self) -> Option<&str> {
        match self.kind {
            DescriptorKind::Action => Some(self.descriptor),
            DescriptorKind::Emotion => None,
        }
    }
}

/// Determines the active character set for a page.
///
/// A character is active when introduced by the page and carrying either an
/// action for the page's phase or an emotion for the page number. A
/// character with neither simply drops out of the result, which is how a
/// character exits the narrative: no removal step exists or is needed.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct CharacterPresenceResolver<'a> {
    config: &'a BookConfig,
}

impl<'a> CharacterPresenceResolver<'a> {
    /// Active characters for a page, in declaration order.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, page: u32, phase: &str) -> Vec<ActiveCharacter<'a>> {
        let mut active = Vec::new();

        for character in self.config.characters() {
            if !character.introduced_by(page) {
                tracing::debug!(
                    character = %character.name(),
                    intro_page = character.introduction().page(),
                    "not yet introduced"
                );
                continue;
            }

            let action = character.action_for_phase(phase);
            let emotion = character.emotion_for_page(page);

            let entry = match (action, emotion) {
                (Some(action), emotion) => ActiveCharacter {
                    character,
                    descriptor: action,
                    kind: DescriptorKind::Action,
                    expression: emotion,
                },
                (None, Some(emotion)) => ActiveCharacter {
                    character,
                    descriptor: emotion,
                    kind: DescriptorKind::Emotion,
                    expression: None,
                },
                (None, None) => {
                    tracing::debug!(character = %character.name(), "no descriptor, omitted");
                    continue;
                }
            };
            active.push(entry);
        }

        tracing::debug!(count = active.len(), "resolved active characters");
        active
    }
}
