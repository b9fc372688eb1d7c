//! Pattern library: every keyword set and regex the detectors match against.
//!
//! All sets are matched against lower-cased text. Keeping them here means a
//! detector's behaviour can be reviewed without reading its control flow.

use once_cell::sync::Lazy;
use regex::Regex;

// ---------------------------------------------------------------------------
// Emotion
// ---------------------------------------------------------------------------

pub const ANXIETY_TRIGGERS: &[&str] = &[
    "anxious", "anxiety", "worried", "worrying", "nervous", "panic", "scared",
    "afraid", "stressed", "stress", "stressful", "terrified", "on edge", "freaking out",
    "panicking", "panicked",
];

pub const SADNESS_TRIGGERS: &[&str] = &[
    "sad", "depressed", "lonely", "hopeless", "crying", "cried", "miserable",
    "heartbroken", "unhappy", "feel empty", "feeling empty", "feel low", "feeling low",
    "grief", "worthless",
];

/// Positive words under an explicit negation. Routed to sadness, which is
/// checked before positive.
pub const NEGATED_POSITIVE_PATTERNS: &[&str] = &[
    "not happy", "not good", "not okay", "not ok", "not fine", "not great",
    "not feeling good", "not feeling well", "don't feel good", "don't feel happy",
    "never happy", "isn't good", "can't be happy", "cannot be happy",
];

pub const ANGER_TRIGGERS: &[&str] = &[
    "angry", "furious", "annoyed", "frustrated", "irritated", "pissed", "mad at",
    "i hate", "so mad", "fed up", "enraged", "frustrating", "annoying",
];

pub const POSITIVE_TRIGGERS: &[&str] = &[
    "happy", "great", "good", "excited", "grateful", "glad", "awesome", "amazing",
    "relieved", "proud", "wonderful", "better",
];

/// Tokens that suppress a positive trigger when they appear shortly before it.
pub const NEGATION_TOKENS: &[&str] = &[
    "not", "don't", "doesn't", "didn't", "never", "can't", "cannot", "isn't",
];

/// Characters scanned before a positive trigger for a negation token.
pub const NEGATION_LOOKBACK_CHARS: usize = 20;

pub static ANXIETY_WORDS: Lazy<Regex> = Lazy::new(|| word_set(ANXIETY_TRIGGERS));
pub static SADNESS_WORDS: Lazy<Regex> = Lazy::new(|| word_set(SADNESS_TRIGGERS));
pub static NEGATED_POSITIVE_WORDS: Lazy<Regex> = Lazy::new(|| word_set(NEGATED_POSITIVE_PATTERNS));
pub static ANGER_WORDS: Lazy<Regex> = Lazy::new(|| word_set(ANGER_TRIGGERS));
pub static POSITIVE_WORDS: Lazy<Regex> = Lazy::new(|| word_set(POSITIVE_TRIGGERS));
pub static NEGATION_WORDS: Lazy<Regex> = Lazy::new(|| word_set(NEGATION_TOKENS));

// ---------------------------------------------------------------------------
// Cognitive distortions
// ---------------------------------------------------------------------------

pub const CATASTROPHIZING_TRIGGERS: &[&str] = &[
    "worst case", "disaster", "end of the world", "everything is ruined",
    "ruin my life", "ruined my life", "never recover", "catastrophe",
    "everything will go wrong", "it's all over", "going to die",
];

pub const MIND_READING_TRIGGERS: &[&str] = &[
    "they think i", "everyone thinks", "they must think", "he thinks i",
    "she thinks i", "people think i", "they probably hate me", "judging me",
    "everyone is judging", "they all think",
];

pub const ALL_OR_NOTHING_TRIGGERS: &[&str] = &[
    "always fail", "never do anything right", "total failure", "complete failure",
    "i'm a failure", "i am a failure", "everything is wrong", "nothing ever works",
    "nothing goes right", "always mess up", "never get anything right",
    "everyone hates me", "nobody cares",
];

// ---------------------------------------------------------------------------
// Overthinking and overwhelm
// ---------------------------------------------------------------------------

pub const WHAT_IF: &str = "what if";

pub const RUMINATION_PHRASES: &[&str] = &[
    "overthinking", "again and again", "can't stop thinking", "i keep thinking",
];

pub static HEDGING_CONNECTIVES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:but|however|still|yet|though)\b").expect("static regex"));

/// `might not` is listed first so the alternation consumes it as one modal.
pub static UNCERTAINTY_MODALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:might not|might|could|won't|can't)\b").expect("static regex"));

pub const OVERWHELM_PHRASES: &[&str] = &["too much", "overwhelmed"];

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub static SAFE_WORD_REGISTRATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:my safe word is|set safe word to)\s+(\w+)").expect("static regex")
});

pub const SILENT_ON_PHRASES: &[&str] = &[
    "silent mode on", "enable silent mode", "turn on silent mode", "just listen",
    "be silent",
];

pub const SILENT_OFF_PHRASES: &[&str] = &[
    "silent mode off", "disable silent mode", "turn off silent mode",
    "exit silent mode", "you can talk now",
];

/// Checked in order; `don't forget ` must precede the removal prefix.
pub const MEMORY_ADD_PREFIXES: &[&str] = &["remember ", "don't forget ", "save this "];

pub const MEMORY_REMOVE_PREFIX: &str = "forget ";

pub const FOCUS_KEYWORDS: &[&str] = &["focus", "concentrate", "pomodoro"];

pub static FOCUS_DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(?:minute|min)").expect("static regex"));

/// Whole-word alternation over a keyword set: `sad` does not fire inside `ambassador`.
fn word_set(words: &[&str]) -> Regex {
    let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"\b(?:{})\b", alternation)).expect("keyword set regex")
}

/// Returns the first pattern of `set` contained in `text`.
pub fn first_match<'a>(text: &str, set: &[&'a str]) -> Option<&'a str> {
    set.iter().copied().find(|p| text.contains(p))
}

pub fn contains_any(text: &str, set: &[&str]) -> bool {
    first_match(text, set).is_some()
}
