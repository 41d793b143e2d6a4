//! Instruction payload composition.
//!
//! Generation services weight earlier instructions more heavily, so the
//! image prompt leads with the anti-duplication contract and character
//! sheets, then scene, transition, and style material in descending
//! priority. The text prompt follows the conversational register the
//! service expects for story writing; the backup prompt is a reduced-risk
//! restatement composed eagerly so a validation failure costs no extra
//! assembly round-trip.

use crate::{PageState, UNCLASSIFIED};
use caldecott_book::BookConfig;
use std::collections::BTreeMap;

/// How many prior page texts feed the consistency context.
const CONTEXT_PAGES: u32 = 5;

/// The composed payloads for one page.
#[derive(Debug, Clone, PartialEq, derive_getters::Getters)]
pub struct PromptBundle {
    /// Prompt for the story text call.
    text_prompt: String,
    /// Prompt for the illustration call.
    image_prompt: String,
    /// Reduced-risk restatement for the validation-failure retry.
    backup_text_prompt: String,
    /// Sampling temperature for the page's phase.
    temperature: f32,
}

/// The composed cover payload.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct CoverPrompt {
    /// Prompt for the cover illustration call.
    prompt: String,
    /// Title and author block for the text overlay.
    overlay_text: String,
    /// Completed page whose art anchors the cover style.
    reference_page: u32,
    /// Vertical placement of the overlay.
    position: String,
}

/// Merges character sheets, scene context, transition guidance, and style
/// rules into service-ready prompts.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct PromptComposer<'a> {
    config: &'a BookConfig,
}

impl PromptComposer<'_> {
    /// Compose the full bundle for a page.
    ///
    /// `text` is the page's story text, either pre-written or already
    /// generated; it anchors the image prompt's context sections.
    #[tracing::instrument(skip_all, fields(page = state.page()))]
    pub fn compose(
        &self,
        state: &PageState<'_>,
        text: &str,
        previous: &BTreeMap<u32, String>,
    ) -> PromptBundle {
        PromptBundle {
            text_prompt: self.text_prompt(*state.page(), previous),
            image_prompt: self.image_prompt(state, text),
            backup_text_prompt: self.backup_text_prompt(*state.page(), previous),
            temperature: self.temperature_for(*state.phase_index()),
        }
    }

    /// Sampling temperature for a phase ordinal.
    pub fn temperature_for(&self, phase_index: usize) -> f32 {
        self.config
            .generation()
            .temperature()
            .for_phase_index(phase_index)
    }

    /// Prompt asking the service to write the page's story text.
    pub fn text_prompt(&self, page: u32, previous: &BTreeMap<u32, String>) -> String {
        let book = self.config.book();
        let mut parts = vec![
            format!(
                "Create a children's book page with text for page {page} of \"{}\".",
                book.title()
            ),
            String::new(),
        ];

        parts.push("Book Details:".to_string());
        if let Some(theme) = book.theme() {
            parts.push(format!("- Theme: {theme}"));
        }
        if let Some(art_style) = book.art_style() {
            parts.push(format!("- Art Style: {art_style}"));
        }

        parts.push(String::new());
        parts.push("Characters:".to_string());
        for character in self.config.characters() {
            parts.push(format!("- {} ({})", character.name(), character.description()));
        }

        if let Some(scene) = self
            .config
            .scene(crate::PhaseResolver::new(self.config).resolve(page))
        {
            parts.push(String::new());
            parts.push("Setting:".to_string());
            parts.push(format!(
                "- Location: {}",
                scene.location().as_deref().unwrap_or("N/A")
            ));
            parts.push(format!("- Description: {}", or_na(scene.description())));
            parts.push(format!("- Atmosphere: {}", or_na(scene.atmosphere())));
            if !scene.elements().is_empty() {
                parts.push("- Elements:".to_string());
                for element in scene.elements() {
                    parts.push(format!("  * {element}"));
                }
            }
        }

        let context = self.consistency_context(page, previous);
        let has_history = !previous.is_empty();
        parts.push(String::new());
        parts.push("Previous Context (for consistency):".to_string());
        parts.push(context);

        parts.push(String::new());
        parts.push("Important consistency instructions:".to_string());
        if book.character_consistency().is_empty() {
            parts.push(
                "- Keep all character appearances EXACTLY THE SAME across all pages".to_string(),
            );
        } else {
            parts.extend(book.character_consistency().iter().cloned());
        }
        if book.style_consistency().is_empty() {
            parts.push("- Maintain the same narrative tone throughout".to_string());
        } else {
            parts.extend(book.style_consistency().iter().cloned());
        }
        if has_history {
            parts.push(
                "- **Narrative Flow:** Ensure the text flows logically from previous events."
                    .to_string(),
            );
        }

        parts.push(String::new());
        parts.push("FORMAT AND CONTENT INSTRUCTIONS:".to_string());
        if book.text_instructions().is_empty() {
            parts.extend([
                "1. First, write the text for the page (2-3 child-friendly sentences) between \"TEXT START\" and \"TEXT END\"".to_string(),
                "2. **Action:** The text MUST clearly describe what the main character(s) are *doing* in this scene".to_string(),
                "3. **Progression:** The text should logically advance the story based on previous events".to_string(),
            ]);
        } else {
            parts.extend(book.text_instructions().iter().cloned());
        }

        if self.config.is_final_page(page) {
            parts.push(String::new());
            parts.push("FINAL PAGE INSTRUCTIONS:".to_string());
            if book.final_page_instructions().is_empty() {
                parts.extend([
                    "- As this is the final page, provide a satisfying conclusion.".to_string(),
                    "- Do NOT end with a question or cliffhanger.".to_string(),
                    "- Wrap up the main storyline with a positive and clear ending.".to_string(),
                ]);
            } else {
                parts.extend(book.final_page_instructions().iter().cloned());
            }
        }

        parts.push(String::new());
        parts.push("Generation Guidance:".to_string());
        if book.generation_instructions().is_empty() {
            parts.extend([
                "- Please provide engaging text describing character actions and story progression.".to_string(),
                "- The text should be enclosed between \"TEXT START\" and \"TEXT END\" markers.".to_string(),
            ]);
        } else {
            for instruction in book.generation_instructions() {
                parts.push(format!("- {instruction}"));
            }
        }

        parts.join("\n")
    }

    /// Minimal restatement used when the primary text fails validation.
    pub fn backup_text_prompt(&self, page: u32, previous: &BTreeMap<u32, String>) -> String {
        let mut parts = vec![format!(
            "Based on the provided context, please write 2-3 sentences ONLY for page {page} of the children's book \"{}\".",
            self.config.book().title()
        )];

        if page > 1 {
            if let Some(prev_text) = previous.get(&(page - 1)) {
                parts.push(String::new());
                parts.push(format!("Previous page: {prev_text}"));
            }
        }

        parts.push(String::new());
        parts.push(
            "The text should be engaging for children, consistent with the story so far, and suitable for illustration.".to_string(),
        );
        parts.push(
            "ONLY provide the exact text for the page - no additional commentary or descriptions."
                .to_string(),
        );
        parts.join("\n")
    }

    /// Prompt for the illustration call, highest-priority content first.
    pub fn image_prompt(&self, state: &PageState<'_>, text: &str) -> String {
        let mut parts = vec![
            format!(
                "PROMPT TYPE: Children's book illustration for page {}",
                state.page()
            ),
            format!("TEXT CONTEXT: \"{text}\""),
            String::new(),
            "CRITICAL REQUIREMENTS (FOLLOW THESE EXACTLY):".to_string(),
            "- NO CHARACTER DUPLICATION: Each character must appear EXACTLY ONCE in the image"
                .to_string(),
            String::new(),
            self.anti_duplication_block(state),
            String::new(),
            "CHARACTERS:".to_string(),
            self.character_instructions(state),
            String::new(),
            "SCENE ANALYSIS:".to_string(),
            self.scene_analysis(state, text),
        ];

        if let Some(guidance) = state.guidance() {
            parts.push(String::new());
            parts.push("TRANSITION GUIDANCE (from previous page):".to_string());
            parts.push(format!("- Transition Type: {}", guidance.transition_type()));
            parts.push(format!(
                "- Composition Guide: {}",
                guidance.composition_ratio()
            ));
            parts.push(format!("- Emphasis: {}", guidance.emphasis()));
            parts.push(format!("- Maintain: {}", join_or_none(guidance.maintain())));
            parts.push(format!(
                "- Introduce: {}",
                join_or_none(guidance.introduce())
            ));
            parts.push(format!(
                "- Phase Out: {}",
                join_or_none(guidance.phase_out())
            ));
            if !guidance.emotional_guidance().is_empty() {
                parts.push(format!(
                    "- Emotional Guidance: {}",
                    guidance.emotional_guidance()
                ));
            }
            if !guidance.lighting_guidance().is_empty() {
                parts.push(format!(
                    "- Lighting Guidance: {}",
                    guidance.lighting_guidance()
                ));
            }
        }

        parts.push(String::new());
        parts.push("GENERATION STEPS:".to_string());
        parts.push(self.generation_steps());
        parts.push(String::new());
        parts.push("ART STYLE:".to_string());
        parts.extend(self.art_style_guidance());

        if let Some(reference) = state.reference_page() {
            parts.push(String::new());
            parts.push(format!(
                "REFERENCE IMAGE: Match the character designs, art style, and color harmony of the supplied image from page {reference}."
            ));
        }

        parts.join("\n")
    }

    /// Cover payload: prompt text plus the overlay block.
    pub fn cover_prompt(&self) -> CoverPrompt {
        let cover = self.config.cover();
        let book = self.config.book();

        let title = cover
            .cover_title()
            .clone()
            .unwrap_or_else(|| book.title().clone());
        let author = cover
            .cover_author()
            .clone()
            .or_else(|| self.config.metadata().author().clone())
            .unwrap_or_else(|| "Anonymous".to_string());
        let theme = book
            .theme()
            .clone()
            .unwrap_or_else(|| "a children's story".to_string());
        let art_style = book
            .art_style()
            .clone()
            .unwrap_or_else(|| "illustration".to_string());

        let names: Vec<&str> = self
            .config
            .characters()
            .iter()
            .map(|c| c.name().as_str())
            .collect();
        let characters = if names.is_empty() {
            "the main character".to_string()
        } else {
            names.join(", ")
        };

        let template = cover
            .cover_prompt_template()
            .clone()
            .unwrap_or_else(|| "A vibrant book cover for '{title}'".to_string());
        let base = template
            .replace("{title}", &title)
            .replace("{characters}", &characters)
            .replace("{theme}", &theme)
            .replace("{art_style}", &art_style)
            .replace("{author}", &author);

        let mut details = vec!["CHARACTER DETAILS (MUST FOLLOW):".to_string()];
        for character in self.config.characters() {
            let mut block = vec![format!("- {}:", character.name())];
            if let Some(appearance) = character.appearance() {
                block.push(format!("  - Appearance: {appearance}"));
            }
            if let Some(outfit) = character.outfit() {
                block.push(format!("  - Outfit: {outfit}"));
            }
            if let Some(features) = character.features() {
                block.push(format!("  - Features: {features}"));
            }
            details.push(block.join("\n"));
        }

        let prompt = format!(
            "{base}\n\n{}\n\n**CONSISTENCY:** Ensure characters match details & reference style.",
            details.join("\n")
        );

        CoverPrompt {
            prompt,
            overlay_text: format!("{title}\n{author}"),
            reference_page: *cover.reference_page_for_style(),
            position: cover.cover_text_position().clone(),
        }
    }

    fn consistency_context(&self, page: u32, previous: &BTreeMap<u32, String>) -> String {
        let mut context = Vec::new();
        for character in self.config.characters() {
            context.push(format!(
                "{} ({})",
                character.name(),
                character.description()
            ));
        }
        let earliest = page.saturating_sub(CONTEXT_PAGES).max(1);
        for prev_page in earliest..page {
            if let Some(text) = previous.get(&prev_page) {
                context.push(format!("Previous page {prev_page}: {text}"));
            }
        }
        if context.is_empty() {
            "No previous context available.".to_string()
        } else {
            context.join("\n")
        }
    }

    fn anti_duplication_block(&self, state: &PageState<'_>) -> String {
        let rules = self.config.generation().anti_duplication();
        let count = state.characters().len();
        let count_text = count.to_string();

        let mut block = vec!["ANTI-DUPLICATION INSTRUCTIONS (EXTREMELY IMPORTANT):".to_string()];
        if !rules.rules().is_empty() {
            block.push("\nCORE RULES:".to_string());
            for rule in rules.rules() {
                block.push(format!("- {}", rule.replace("{num_characters}", &count_text)));
            }
        }
        if !state.characters().is_empty() {
            block.push("\nCHARACTER COUNT REQUIREMENTS:".to_string());
            for active in state.characters() {
                block.push(format!(
                    "- {}: {} - MUST APPEAR EXACTLY ONCE",
                    active.character().name(),
                    active.character().description()
                ));
            }
        }
        if !rules.consistency_rules().is_empty() {
            block.push("\nCONSISTENCY REQUIREMENTS:".to_string());
            for rule in rules.consistency_rules() {
                block.push(format!("- {rule}"));
            }
        }
        if !rules.flexibility_rules().is_empty() {
            block.push("\nALLOWED VARIATIONS:".to_string());
            for rule in rules.flexibility_rules() {
                block.push(format!("- {rule}"));
            }
        }
        if !rules.verification_rules().is_empty() {
            block.push("\nFINAL VERIFICATION (BEFORE RENDERING):".to_string());
            for rule in rules.verification_rules() {
                block.push(format!("- {}", rule.replace("{num_characters}", &count_text)));
            }
        }
        block.push("\nWARNING: DUPLICATING CHARACTERS IS THE MOST COMMON ERROR.".to_string());
        block.push("CAREFULLY CHECK YOUR SCENE AND REMOVE ANY DUPLICATE CHARACTERS.".to_string());
        block.join("\n")
    }

    fn character_instructions(&self, state: &PageState<'_>) -> String {
        let mut blocks = Vec::new();
        for (i, active) in state.characters().iter().enumerate() {
            let character = active.character();
            let mut lines = vec![format!(
                "{}. Character: {} | Description: {}",
                i + 1,
                character.name(),
                or_na(character.description())
            )];

            let sheet: Vec<(&str, Option<&String>)> = vec![
                ("Appearance", character.appearance().as_ref()),
                ("Outfit", character.outfit().as_ref()),
                ("Features", character.features().as_ref()),
            ];
            if sheet.iter().any(|(_, v)| v.is_some()) {
                lines.push("   | MANDATORY APPEARANCE RULES:".to_string());
                for (label, value) in sheet {
                    if let Some(value) = value {
                        lines.push(format!("     - {label} (ALWAYS): {value}"));
                    }
                }
            }

            if let Some(action) = active.action() {
                lines.push(format!("   | Action: {action}"));
            }
            match active.emotion() {
                Some(emotion) => lines.push(format!("   | Emotion: {emotion}")),
                None => lines.push("   | Emotion: None specified".to_string()),
            }

            blocks.push(lines.join("\n"));
        }
        blocks.join("\n\n")
    }

    fn scene_analysis(&self, state: &PageState<'_>, text: &str) -> String {
        let scene = state.scene();
        let character_list = state
            .characters()
            .iter()
            .map(|a| format!("{} (exactly 1)", a.character().name()))
            .collect::<Vec<_>>()
            .join(", ");
        let elements_text = if scene.elements().is_empty() {
            "No specific elements defined".to_string()
        } else {
            scene
                .elements()
                .iter()
                .map(|e| format!("- {e}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let mut lines = vec![
            format!("1. Scene Description: {}", scene.description()),
            format!("2. Character List: {character_list}"),
            format!("3. Total Characters: {}", state.characters().len()),
            format!("4. Atmosphere: {}", scene.atmosphere()),
            "5. Key Elements:".to_string(),
            elements_text,
            format!("6. Guiding Text Context: \"{text}\""),
        ];

        let overrides = self.config.page_emotion(*state.page());
        let visuals: [(&str, &str, &str); 5] = [
            (
                "Emotion",
                overrides.map(|o| o.emotion().as_str()).unwrap_or_default(),
                scene.emotion(),
            ),
            (
                "Lighting",
                overrides.map(|o| o.lighting().as_str()).unwrap_or_default(),
                scene.lighting(),
            ),
            (
                "Mood",
                overrides.map(|o| o.mood().as_str()).unwrap_or_default(),
                scene.mood(),
            ),
            (
                "Visual Focus",
                overrides
                    .map(|o| o.visual_focus().as_str())
                    .unwrap_or_default(),
                scene.visual_focus(),
            ),
            (
                "Color Palette",
                overrides
                    .map(|o| o.color_palette().as_str())
                    .unwrap_or_default(),
                scene.color_palette(),
            ),
        ];
        let mut index = 7;
        for (label, override_value, scene_value) in visuals {
            let value = if override_value.is_empty() {
                scene_value
            } else {
                override_value
            };
            if !value.is_empty() {
                lines.push(format!("{index}. Visual {label}: {value}"));
                index += 1;
            }
        }

        if *state.environment() != *UNCLASSIFIED {
            lines.push(format!("{index}. Environment Type: {}", state.environment()));
            index += 1;
            if let Some(environment) = self.config.environment(state.environment()) {
                if !environment.characteristics().is_empty() {
                    lines.push(format!(
                        "{index}. Environment Characteristics: {}",
                        environment.characteristics().join(", ")
                    ));
                }
            }
        }

        lines.join("\n")
    }

    fn generation_steps(&self) -> String {
        let mut formatted = "SEQUENTIAL GENERATION PLAN:".to_string();
        for (i, step) in self.config.generation().steps().iter().enumerate() {
            formatted.push_str(&format!("\nStep {}: {step}", i + 1));
        }
        formatted
    }

    fn art_style_guidance(&self) -> Vec<String> {
        let style = self.config.generation().art_style();
        let settings = self.config.image_settings();
        let format = style
            .format()
            .replace("{width}", &settings.width().to_string())
            .replace("{height}", &settings.height().to_string());
        vec![
            format!("- Tone: {}", style.tone()),
            format!("- Quality: {}", style.quality()),
            format!("- Policy: {}", style.text_policy()),
            format!("- Format: {format}"),
        ]
    }
}

fn or_na(value: &str) -> &str {
    if value.is_empty() { "N/A" } else { value }
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "None".to_string()
    } else {
        values.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScenePipeline;

    fn config() -> BookConfig {
        r#"
        [book]
        title = "Luma and the Night Market"
        page_count = 4
        theme = "courage in small things"
        art_style = "soft watercolor"

        [[characters]]
        key = "luma"
        name = "Luma"
        description = "a small hedgehog"
        appearance = "round body, soft brown quills"
        outfit = "green scarf"

        [characters.actions]
        market = "wanders between the stalls"

        [characters.emotional_states]
        2 = "astonished"

        [[story_progression.phases]]
        name = "garden"
        start_page = 1
        end_page = 1

        [[story_progression.phases]]
        name = "market"
        start_page = 2
        end_page = 4

        [scenes.garden]
        description = "a moonlit garden against a hedge"
        elements = ["hedge", "gate"]
        emotion = "quiet wonder"

        [scenes.market]
        description = "a lane of glowing market stalls"
        atmosphere = "bustling and warm"
        elements = ["lanterns", "stalls"]

        [scenes.conclusion]
        description = "the end"

        [[environments]]
        name = "garden"
        indicators = ["hedge", "garden"]

        [[environments]]
        name = "market"
        indicators = ["market", "stalls"]
        characteristics = ["cobblestones"]

        [generation.anti_duplication]
        rules = ["Exactly {num_characters} characters total"]
        verification_rules = ["Count the characters: there must be {num_characters}"]

        [generation.temperature]
        base = 0.2
        phase_increment = 0.3
        max = 0.5

        [cover]
        generate_cover = true
        reference_page_for_style = 2
        cover_prompt_template = "A cover for '{title}' with {characters}, {theme}, in {art_style}, by {author}"

        [metadata]
        author = "R. Fenwick"
        "#
        .parse()
        .unwrap()
    }

    #[test]
    fn image_prompt_orders_sections_by_priority() {
        let config = config();
        let state = ScenePipeline::new(&config).resolve(2, &[1]).unwrap();
        let composer = PromptComposer::new(&config);
        let prompt = composer.image_prompt(&state, "Luma squeezes through the gap.");

        let anti = prompt.find("ANTI-DUPLICATION INSTRUCTIONS").unwrap();
        let characters = prompt.find("CHARACTERS:").unwrap();
        let scene = prompt.find("SCENE ANALYSIS:").unwrap();
        let transition = prompt.find("TRANSITION GUIDANCE").unwrap();
        let art = prompt.find("ART STYLE:").unwrap();
        let reference = prompt.find("REFERENCE IMAGE:").unwrap();
        assert!(anti < characters);
        assert!(characters < scene);
        assert!(scene < transition);
        assert!(transition < art);
        assert!(art < reference);
    }

    #[test]
    fn character_sheet_is_verbatim_and_mandatory() {
        let config = config();
        let state = ScenePipeline::new(&config).resolve(2, &[1]).unwrap();
        let prompt = PromptComposer::new(&config).image_prompt(&state, "text");

        assert!(prompt.contains("- Appearance (ALWAYS): round body, soft brown quills"));
        assert!(prompt.contains("- Outfit (ALWAYS): green scarf"));
        assert!(prompt.contains("| Action: wanders between the stalls"));
        assert!(prompt.contains("| Emotion: astonished"));
        assert!(prompt.contains("- Luma: a small hedgehog - MUST APPEAR EXACTLY ONCE"));
    }

    #[test]
    fn character_count_is_substituted() {
        let config = config();
        let state = ScenePipeline::new(&config).resolve(2, &[1]).unwrap();
        let prompt = PromptComposer::new(&config).image_prompt(&state, "text");

        assert!(prompt.contains("- Exactly 1 characters total"));
        assert!(prompt.contains("- Count the characters: there must be 1"));
    }

    #[test]
    fn forced_elements_appear_in_rendered_guidance() {
        let config: BookConfig = r#"
            [book]
            title = "Bridge"
            page_count = 6

            [[story_progression.phases]]
            name = "meadow"
            start_page = 1
            end_page = 5

            [[story_progression.phases]]
            name = "crossing"
            start_page = 6
            end_page = 6

            [scenes.meadow]
            description = "open grass"

            [scenes.crossing]
            description = "a rushing current"

            [scenes.crossing.reference_override]
            force_elements = ["bridge"]

            [scenes.conclusion]
            description = "the end"

            [[environments]]
            name = "field"
            indicators = ["grass"]

            [[environments]]
            name = "water"
            indicators = ["current"]
            "#
        .parse()
        .unwrap();
        let state = ScenePipeline::new(&config)
            .resolve(6, &[1, 2, 3, 4, 5])
            .unwrap();
        let prompt = PromptComposer::new(&config).image_prompt(&state, "text");

        let introduce_line = prompt
            .lines()
            .find(|l| l.starts_with("- Introduce:"))
            .unwrap();
        assert!(introduce_line.contains("bridge"));
    }

    #[test]
    fn text_prompt_carries_context_and_markers() {
        let config = config();
        let composer = PromptComposer::new(&config);
        let mut previous = BTreeMap::new();
        previous.insert(1, "Luma hears music beyond the hedge.".to_string());

        let prompt = composer.text_prompt(2, &previous);
        assert!(prompt.contains("page 2 of \"Luma and the Night Market\""));
        assert!(prompt.contains("Previous page 1: Luma hears music beyond the hedge."));
        assert!(prompt.contains("TEXT START"));
        assert!(prompt.contains("- **Narrative Flow:**"));
    }

    #[test]
    fn final_page_gets_conclusion_instructions() {
        let config = config();
        let composer = PromptComposer::new(&config);
        let prompt = composer.text_prompt(4, &BTreeMap::new());
        assert!(prompt.contains("FINAL PAGE INSTRUCTIONS:"));

        let earlier = composer.text_prompt(2, &BTreeMap::new());
        assert!(!earlier.contains("FINAL PAGE INSTRUCTIONS:"));
    }

    #[test]
    fn backup_prompt_is_a_minimal_restatement() {
        let config = config();
        let composer = PromptComposer::new(&config);
        let mut previous = BTreeMap::new();
        previous.insert(2, "She finds the market.".to_string());

        let backup = composer.backup_text_prompt(3, &previous);
        assert!(backup.contains("write 2-3 sentences ONLY for page 3"));
        assert!(backup.contains("Previous page: She finds the market."));
        assert!(backup.len() < composer.text_prompt(3, &previous).len());
    }

    #[test]
    fn temperature_follows_phase_schedule() {
        let config = config();
        let composer = PromptComposer::new(&config);
        assert!((composer.temperature_for(0) - 0.2).abs() < f32::EPSILON);
        assert!((composer.temperature_for(1) - 0.5).abs() < f32::EPSILON);
        assert!((composer.temperature_for(5) - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn cover_prompt_substitutes_template_fields() {
        let config = config();
        let cover = PromptComposer::new(&config).cover_prompt();

        assert!(cover.prompt().contains("Luma and the Night Market"));
        assert!(cover.prompt().contains("R. Fenwick"));
        assert!(cover.prompt().contains("soft watercolor"));
        assert!(cover.prompt().contains("CHARACTER DETAILS (MUST FOLLOW):"));
        assert!(cover.prompt().contains("**CONSISTENCY:**"));
        assert_eq!(*cover.reference_page(), 2);
        assert_eq!(cover.overlay_text(), "Luma and the Night Market\nR. Fenwick");
    }

    #[test]
    fn compose_returns_the_full_bundle() {
        let config = config();
        let state = ScenePipeline::new(&config).resolve(2, &[1]).unwrap();
        let composer = PromptComposer::new(&config);
        let bundle = composer.compose(&state, "Luma squeezes through.", &BTreeMap::new());

        assert!(bundle.text_prompt().contains("page 2"));
        assert!(bundle.image_prompt().contains("Luma squeezes through."));
        assert!(bundle.backup_text_prompt().contains("page 2"));
        assert!((*bundle.temperature() - 0.5).abs() < f32::EPSILON);
    }
}
