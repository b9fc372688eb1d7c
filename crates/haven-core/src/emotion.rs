//! Emotion classifier: one label per message from an ordered cascade.
//!
//! Categories are tried in urgency order (anxiety, sadness, anger, positive)
//! and the first hit wins. Positive triggers are ignored when a negation token
//! sits in the lookback window right before them; explicit negated positives
//! ("not happy") are listed under sadness.

use crate::patterns::{
    ANGER_WORDS, ANXIETY_WORDS, NEGATED_POSITIVE_WORDS, NEGATION_LOOKBACK_CHARS, NEGATION_WORDS, POSITIVE_WORDS,
    SADNESS_WORDS,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    #[default]
    Neutral,
    Anxiety,
    Sadness,
    Anger,
    Positive,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Anxiety => "anxiety",
            Emotion::Sadness => "sadness",
            Emotion::Anger => "anger",
            Emotion::Positive => "positive",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type EmotionRule = (Emotion, fn(&str) -> bool);

/// Cascade order. The first predicate that holds decides the label.
const EMOTION_RULES: &[EmotionRule] = &[
    (Emotion::Anxiety, is_anxious),
    (Emotion::Sadness, is_sad),
    (Emotion::Anger, is_angry),
    (Emotion::Positive, is_positive),
];

/// Classifies lower-cased text. Never fails; defaults to `Neutral`.
pub fn classify_emotion(normalized: &str) -> Emotion {
    EMOTION_RULES
        .iter()
        .find(|(_, matches)| matches(normalized))
        .map(|(emotion, _)| *emotion)
        .unwrap_or_default()
}

fn is_anxious(text: &str) -> bool {
    ANXIETY_WORDS.is_match(text)
}

fn is_sad(text: &str) -> bool {
    SADNESS_WORDS.is_match(text) || NEGATED_POSITIVE_WORDS.is_match(text)
}

fn is_angry(text: &str) -> bool {
    ANGER_WORDS.is_match(text)
}

/// True when at least one positive trigger occurrence is not negated.
fn is_positive(text: &str) -> bool {
    POSITIVE_WORDS
        .find_iter(text)
        .any(|m| !negated_before(text, m.start()))
}

/// Looks for a whole-word negation token starting within the `NEGATION_LOOKBACK_CHARS` characters before `start`.
fn negated_before(text: &str, start: usize) -> bool {
    let window_start = text[..start]
        .char_indices()
        .rev()
        .take(NEGATION_LOOKBACK_CHARS)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    NEGATION_WORDS
        .find_iter(&text[..start])
        .any(|m| m.start() >= window_start)
}
