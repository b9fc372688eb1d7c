//! Personality: the base voice of the assistant, chosen per request.
//!
//! Each personality carries the base system instruction used when no
//! detector overrides it (see `policy`). Unknown or empty names fall back to
//! the configured default, which itself defaults to `Calm`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    /// Gentle, slow, reassuring. Default.
    #[default]
    Calm,
    /// Clear and structured; short practical answers.
    Professional,
    /// Warm and validating; leads with empathy.
    Supportive,
    /// Minimal; keeps the user on the current task.
    Focus,
}

impl Personality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Calm => "calm",
            Personality::Professional => "professional",
            Personality::Supportive => "supportive",
            Personality::Focus => "focus",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "calm" => Some(Personality::Calm),
            "professional" => Some(Personality::Professional),
            "supportive" => Some(Personality::Supportive),
            "focus" => Some(Personality::Focus),
            _ => None,
        }
    }

    /// Parse an optional request field, falling back to `default`.
    pub fn resolve(requested: Option<&str>, default: Personality) -> Self {
        requested.and_then(Self::from_name).unwrap_or(default)
    }

    pub fn base_instruction(&self) -> &'static str {
        match self {
            Personality::Calm => {
                "You are a calm, grounded companion. Speak slowly and simply. \
                 Keep replies short, warm and unhurried. Never lecture."
            }
            Personality::Professional => {
                "You are a clear, professional assistant. Be concise and structured. \
                 Offer practical next steps without emotional padding."
            }
            Personality::Supportive => {
                "You are a warm, supportive friend. Validate feelings first, then gently \
                 offer perspective. Use kind, encouraging language."
            }
            Personality::Focus => {
                "You are a focus coach. Keep the user on their current task. \
                 Answer in one or two sentences and steer back to the work."
            }
        }
    }
}
