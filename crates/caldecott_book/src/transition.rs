//! Environment transition rules from the `[transitions]` section.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An authored rule for one directed environment change.
///
/// Rules are keyed `"{from}_to_{to}"`. A missing direction may still be
/// served by the reverse key with its introduce and phase-out lists swapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct TransitionRule {
    /// Blend ratio text (e.g., "70% village, 30% forest edge").
    #[serde(default)]
    composition: Option<String>,
    /// Which environment dominates the composition.
    #[serde(default)]
    emphasis: Option<String>,
    /// Elements to carry over unchanged.
    #[serde(default)]
    maintain: Vec<String>,
    /// Elements entering with the new environment.
    #[serde(default)]
    introduce: Vec<String>,
    /// Elements leaving with the old environment.
    #[serde(default)]
    phase_out: Vec<String>,
}

impl TransitionRule {
    /// The same rule viewed in the opposite direction.
    pub fn reversed(&self) -> TransitionRule {
        TransitionRule {
            composition: self.composition.clone(),
            emphasis: self.emphasis.clone(),
            maintain: self.maintain.clone(),
            introduce: self.phase_out.clone(),
            phase_out: self.introduce.clone(),
        }
    }
}

/// Parameters applied when no authored rule covers an environment change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct DefaultTransition {
    /// Blend ratio used when nothing better is known.
    #[serde(default = "default_blend_ratio")]
    blend_ratio: String,
    /// Whether character designs, art style, and color harmony are always
    /// carried over.
    #[serde(default = "default_true")]
    maintain_core_elements: bool,
}

fn default_blend_ratio() -> String {
    "50% previous, 50% current".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DefaultTransition {
    fn default() -> Self {
        Self {
            blend_ratio: default_blend_ratio(),
            maintain_core_elements: default_true(),
        }
    }
}

/// The transition rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, derive_getters::Getters)]
pub struct Transitions {
    /// Authored rules keyed `"{from}_to_{to}"`.
    #[serde(default)]
    rules: HashMap<String, TransitionRule>,
    /// Fallback parameters.
    #[serde(default)]
    default: DefaultTransition,
}

impl Transitions {
    /// Look up the rule for a directed environment change.
    ///
    /// Falls back to the reverse direction with introduce/phase_out swapped.
    /// Returns `None` when neither direction is authored.
    pub fn rule_for(&self, from: &str, to: &str) -> Option<TransitionRule> {
        if let Some(rule) = self.rules.get(&format!("{from}_to_{to}")) {
            return Some(rule.clone());
        }
        self.rules
            .get(&format!("{to}_to_{from}"))
            .map(TransitionRule::reversed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Transitions {
        toml::from_str(
            r#"
            [default]
            blend_ratio = "60% current, 40% previous"

            [rules.forest_to_village]
            composition = "70% village, 30% forest edge"
            emphasis = "village"
            maintain = ["color harmony"]
            introduce = ["cottages", "stone paths"]
            phase_out = ["dense canopy"]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn forward_rule_wins() {
        let t = table();
        let rule = t.rule_for("forest", "village").unwrap();
        assert_eq!(rule.introduce(), &["cottages", "stone paths"]);
        assert_eq!(rule.phase_out(), &["dense canopy"]);
    }

    #[test]
    fn reverse_rule_swaps_introduce_and_phase_out() {
        let t = table();
        let rule = t.rule_for("village", "forest").unwrap();
        assert_eq!(rule.introduce(), &["dense canopy"]);
        assert_eq!(rule.phase_out(), &["cottages", "stone paths"]);
        assert_eq!(rule.maintain(), &["color harmony"]);
    }

    #[test]
    fn unknown_pair_has_no_rule() {
        let t = table();
        assert!(t.rule_for("forest", "cave").is_none());
    }
}
