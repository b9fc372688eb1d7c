//! Overwhelm predicate for the one-sentence rescue rule.

use crate::emotion::Emotion;
use crate::patterns::{contains_any, OVERWHELM_PHRASES};

/// "too much" / "overwhelmed" in the text, or (when enabled) an anxious message.
pub fn detect_overwhelm(normalized: &str, emotion: Emotion, anxiety_counts: bool) -> bool {
    contains_any(normalized, OVERWHELM_PHRASES) || (anxiety_counts && emotion == Emotion::Anxiety)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_triggers_regardless_of_emotion() {
        assert!(detect_overwhelm("this is all too much", Emotion::Neutral, false));
        assert!(detect_overwhelm("i'm overwhelmed", Emotion::Positive, true));
    }

    #[test]
    fn anxiety_counts_only_when_enabled() {
        assert!(detect_overwhelm("i'm nervous", Emotion::Anxiety, true));
        assert!(!detect_overwhelm("i'm nervous", Emotion::Anxiety, false));
    }

    #[test]
    fn calm_message_is_not_overwhelm() {
        assert!(!detect_overwhelm("hello", Emotion::Neutral, true));
    }
}
