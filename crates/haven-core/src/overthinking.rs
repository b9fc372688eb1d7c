//! Overthinking detector: rumination and "what if" spirals.

use crate::patterns::{contains_any, HEDGING_CONNECTIVES, RUMINATION_PHRASES, UNCERTAINTY_MODALS, WHAT_IF};
use serde::{Deserialize, Serialize};

const SPIRAL_WHAT_IF_MIN: usize = 2;
const HEDGING_MIN: usize = 3;
const MODAL_MIN: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverthinkingReason {
    SpiralWhatIf,
    RepeatedFearPattern,
    GeneralOverthinking,
}

impl OverthinkingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverthinkingReason::SpiralWhatIf => "spiral_what_if",
            OverthinkingReason::RepeatedFearPattern => "repeated_fear_pattern",
            OverthinkingReason::GeneralOverthinking => "general_overthinking",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverthinkingVerdict {
    pub detected: bool,
    pub reason: Option<OverthinkingReason>,
}

impl OverthinkingVerdict {
    fn because(reason: OverthinkingReason) -> Self {
        Self {
            detected: true,
            reason: Some(reason),
        }
    }
}

/// Signals are checked strongest first: spiral, then fear pattern, then explicit rumination.
pub fn detect_overthinking(normalized: &str) -> OverthinkingVerdict {
    let rules: [(OverthinkingReason, fn(&str) -> bool); 3] = [
        (OverthinkingReason::SpiralWhatIf, is_what_if_spiral),
        (OverthinkingReason::RepeatedFearPattern, is_repeated_fear_pattern),
        (OverthinkingReason::GeneralOverthinking, is_explicit_rumination),
    ];
    rules
        .iter()
        .find(|(_, fires)| fires(normalized))
        .map(|(reason, _)| OverthinkingVerdict::because(*reason))
        .unwrap_or_default()
}

fn is_what_if_spiral(text: &str) -> bool {
    text.matches(WHAT_IF).count() >= SPIRAL_WHAT_IF_MIN
}

fn is_repeated_fear_pattern(text: &str) -> bool {
    HEDGING_CONNECTIVES.find_iter(text).count() >= HEDGING_MIN
        && UNCERTAINTY_MODALS.find_iter(text).count() >= MODAL_MIN
}

fn is_explicit_rumination(text: &str) -> bool {
    contains_any(text, RUMINATION_PHRASES)
}
