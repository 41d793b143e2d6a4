//! Continuity instruction derivation between consecutive pages.

use crate::UNCLASSIFIED;
use caldecott_book::{BookConfig, SceneDescriptor};
use std::collections::HashSet;

/// Elements always carried over when falling back to default transition
/// parameters.
const CORE_MAINTAIN: [&str; 3] = ["character_designs", "art_style", "color_harmony"];

const BALANCED_BLEND: &str = "50% previous, 50% current";

/// One page's view of the transition: its number, environment tag, and
/// scene descriptor.
#[derive(Debug, Clone, Copy, derive_new::new, derive_getters::Getters)]
pub struct SceneFrame<'a> {
    /// Page number.
    page: u32,
    /// Classified environment tag.
    tag: &'a str,
    /// Scene descriptor for the page's phase.
    scene: &'a SceneDescriptor,
}

/// Concrete continuity instructions for evolving one page's visual into the
/// next.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct TransitionGuidance {
    /// Directed change label, `"{prev}_to_{cur}"`.
    transition_type: String,
    /// How much of each environment the composition should show.
    composition_ratio: String,
    /// Which environment dominates.
    emphasis: String,
    /// Elements to carry over unchanged.
    maintain: Vec<String>,
    /// Elements entering with this page.
    introduce: Vec<String>,
    /// Elements leaving with the previous page.
    phase_out: Vec<String>,
    /// Emotional progression text.
    emotional_guidance: String,
    /// Lighting progression text.
    lighting_guidance: String,
}

/// Derives transition guidance for consecutive pages.
///
/// Every page with a predecessor gets guidance, whether or not a rule was
/// authored for the environment pair: same-tag pages get trivial
/// continuity, authored rules are used directly (including reversed), and
/// everything else falls back to default parameters. An explicit
/// reference override on the current scene takes precedence over all of it.
#[derive(Debug, Clone, Copy, derive_new::new)]
pub struct TransitionGuideBuilder<'a> {
    config: &'a BookConfig,
}

impl TransitionGuideBuilder<'_> {
    /// Guidance for moving from `previous` to `current`.
    ///
    /// Deterministic: the same frames always yield the same guidance.
    #[tracing::instrument(skip_all, fields(from = previous.tag, to = current.tag))]
    pub fn build(&self, previous: SceneFrame<'_>, current: SceneFrame<'_>) -> TransitionGuidance {
        let (composition_ratio, emphasis, mut maintain, mut introduce, mut phase_out) =
            if previous.tag == current.tag {
                self.same_environment(current.tag)
            } else if let Some(rule) = self.config.transitions().rule_for(previous.tag, current.tag)
            {
                let composition = rule.composition().clone().unwrap_or_else(|| {
                    self.blend_from_characteristics(current.tag, previous.tag)
                });
                let emphasis = rule
                    .emphasis()
                    .clone()
                    .unwrap_or_else(|| current.tag.to_string());
                (
                    composition,
                    emphasis,
                    rule.maintain().clone(),
                    rule.introduce().clone(),
                    rule.phase_out().clone(),
                )
            } else {
                let default = self.config.transitions().default();
                let maintain = if *default.maintain_core_elements() {
                    CORE_MAINTAIN.iter().map(|s| s.to_string()).collect()
                } else {
                    Vec::new()
                };
                (
                    default.blend_ratio().clone(),
                    current.tag.to_string(),
                    maintain,
                    Vec::new(),
                    Vec::new(),
                )
            };

        // An authored override on the current scene outranks everything
        // computed above: forced elements always enter, ignored elements
        // always leave, and neither may appear on the opposing list.
        if let Some(overrides) = current.scene.reference_override() {
            for forced in overrides.force_elements() {
                phase_out.retain(|e| e != forced);
                maintain.retain(|e| e != forced);
                if !introduce.contains(forced) {
                    introduce.push(forced.clone());
                }
            }
            for ignored in overrides.ignore_elements() {
                introduce.retain(|e| e != ignored);
                maintain.retain(|e| e != ignored);
                if !phase_out.contains(ignored) {
                    phase_out.push(ignored.clone());
                }
            }
        }

        TransitionGuidance {
            transition_type: format!("{}_to_{}", previous.tag, current.tag),
            composition_ratio,
            emphasis,
            maintain,
            introduce,
            phase_out,
            emotional_guidance: self.emotional_guidance(&previous, &current),
            lighting_guidance: self.lighting_guidance(&previous, &current),
        }
    }

    fn same_environment(
        &self,
        tag: &str,
    ) -> (String, String, Vec<String>, Vec<String>, Vec<String>) {
        let maintain = self
            .config
            .environment(tag)
            .map(|e| e.characteristics().clone())
            .unwrap_or_default();
        (
            "100% current".to_string(),
            tag.to_string(),
            maintain,
            Vec::new(),
            Vec::new(),
        )
    }

    /// Blend ratio derived from how much the two environments' characteristic
    /// sets differ. More difference, more dramatic transition.
    fn blend_from_characteristics(&self, cur_tag: &str, prev_tag: &str) -> String {
        let cur = self
            .config
            .environment(cur_tag)
            .map(|e| e.characteristics().as_slice())
            .unwrap_or_default();
        let prev = self
            .config
            .environment(prev_tag)
            .map(|e| e.characteristics().as_slice())
            .unwrap_or_default();

        if cur.is_empty() || prev.is_empty() {
            return BALANCED_BLEND.to_string();
        }

        let cur_set: HashSet<&String> = cur.iter().collect();
        let prev_set: HashSet<&String> = prev.iter().collect();
        let overlap = cur_set.intersection(&prev_set).count();
        let total = cur_set.union(&prev_set).count();
        if total == 0 {
            return BALANCED_BLEND.to_string();
        }

        let difference = 1.0 - overlap as f64 / total as f64;
        if difference > 0.7 {
            format!("70% {}, 30% {}", cur[0], prev[0])
        } else if difference > 0.3 {
            format!("60% {}, 40% {}", cur[0], prev[0])
        } else {
            BALANCED_BLEND.to_string()
        }
    }

    /// Current-page emotion, page override first, scene descriptor second.
    fn page_emotion_text(&self, frame: &SceneFrame<'_>) -> String {
        self.config
            .page_emotion(frame.page)
            .map(|pe| pe.emotion().clone())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| frame.scene.emotion().clone())
    }

    fn emotional_guidance(&self, previous: &SceneFrame<'_>, current: &SceneFrame<'_>) -> String {
        let from = self.page_emotion_text(previous);
        let to = self.page_emotion_text(current);

        let mut guidance = if !from.is_empty() && !to.is_empty() && from != to {
            format!("Shift the emotional tone from {from} to {to}")
        } else {
            to
        };

        let note = self
            .config
            .page_emotion(current.page)
            .and_then(|pe| pe.transition_from_previous().clone())
            .or_else(|| current.scene.transition_from_previous().clone());
        if let Some(note) = note {
            if guidance.is_empty() {
                guidance = note;
            } else {
                guidance = format!("{guidance}. {note}");
            }
        }
        guidance
    }

    /// Lighting for a page: page override, then the environment's lighting
    /// defaults, then the scene's own lighting field.
    fn page_lighting_text(&self, frame: &SceneFrame<'_>) -> String {
        if let Some(lighting) = self
            .config
            .page_emotion(frame.page)
            .map(|pe| pe.lighting().clone())
            .filter(|l| !l.is_empty())
        {
            return lighting;
        }
        if frame.tag != UNCLASSIFIED {
            if let Some(environment) = self.config.environment(frame.tag) {
                if !environment.lighting_defaults().is_empty() {
                    return environment.lighting_defaults().join(", ");
                }
            }
        }
        frame.scene.lighting().clone()
    }

    fn lighting_guidance(&self, previous: &SceneFrame<'_>, current: &SceneFrame<'_>) -> String {
        let from = self.page_lighting_text(previous);
        let to = self.page_lighting_text(current);

        if !from.is_empty() && !to.is_empty() && from != to {
            format!("Transition lighting from {from} to {to}")
        } else {
            to
        }
    }
}
