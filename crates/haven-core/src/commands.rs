//! Mode and command interpreter.
//!
//! Runs before any detector. A recognised command ends the turn: its side
//! effect is written through the store and a fixed reply is returned without
//! calling the language model. Recognition order:
//!
//! 1. safe-word registration ("my safe word is X", "set safe word to X")
//! 2. the registered safe word on its own
//! 3. silent mode on / off (exact phrases)
//! 4. memory add ("remember ", "don't forget ", "save this ") / remove ("forget ")
//! 5. focus request ("focus", "concentrate", "pomodoro"), optional "N minutes"

use crate::error::StoreError;
use crate::message::Message;
use crate::patterns::{
    contains_any, FOCUS_DURATION, FOCUS_KEYWORDS, MEMORY_ADD_PREFIXES, MEMORY_REMOVE_PREFIX,
    SAFE_WORD_REGISTRATION, SILENT_OFF_PHRASES, SILENT_ON_PHRASES,
};
use crate::policy::VoiceMode;
use crate::store::CompanionStore;

/// Focus session length when the request names none.
pub const DEFAULT_FOCUS_MINUTES: u32 = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    RegisterSafeWord { word: String },
    SafeWordTriggered,
    SilentMode { enabled: bool },
    Remember { item: String },
    Forget { needle: String },
    Focus { minutes: u32 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::RegisterSafeWord { .. } => "register_safe_word",
            Command::SafeWordTriggered => "safe_word",
            Command::SilentMode { enabled: true } => "silent_mode_on",
            Command::SilentMode { enabled: false } => "silent_mode_off",
            Command::Remember { .. } => "remember",
            Command::Forget { .. } => "forget",
            Command::Focus { .. } => "focus",
        }
    }
}

/// Terminal response for a short-circuited turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: Command,
    pub reply: String,
    pub voice_mode: VoiceMode,
    /// Memory list after the command ran.
    pub memory_count: usize,
    /// Silent-mode flag after the command ran.
    pub silent_mode: bool,
    /// Whether a safe word is registered after the command ran.
    pub safe_word_set: bool,
}

/// Recognise a command. Pure; `safe_word` is the currently registered word, if any.
pub fn interpret(message: &Message, safe_word: Option<&str>, default_focus_minutes: u32) -> Option<Command> {
    let text = message.normalized();
    let exact = text.trim();

    if let Some(caps) = SAFE_WORD_REGISTRATION.captures(text) {
        return Some(Command::RegisterSafeWord {
            word: caps[1].to_string(),
        });
    }

    if let Some(word) = safe_word {
        if !word.is_empty() && exact == word {
            return Some(Command::SafeWordTriggered);
        }
    }

    if SILENT_ON_PHRASES.contains(&exact) {
        return Some(Command::SilentMode { enabled: true });
    }
    if SILENT_OFF_PHRASES.contains(&exact) {
        return Some(Command::SilentMode { enabled: false });
    }

    let lead = text.trim_start();
    if let Some(prefix) = MEMORY_ADD_PREFIXES.iter().find(|p| lead.starts_with(*p)) {
        return Some(Command::Remember {
            item: payload_after(message.raw(), prefix),
        });
    }
    if let Some(rest) = lead.strip_prefix(MEMORY_REMOVE_PREFIX) {
        return Some(Command::Forget {
            needle: rest.trim().to_string(),
        });
    }

    if contains_any(text, FOCUS_KEYWORDS) {
        return Some(Command::Focus {
            minutes: focus_minutes(text, default_focus_minutes),
        });
    }

    None
}

/// The raw text after an ASCII prefix, trimmed. Case is preserved.
fn payload_after(raw: &str, prefix: &str) -> String {
    raw.trim_start()
        .chars()
        .skip(prefix.chars().count())
        .collect::<String>()
        .trim()
        .to_string()
}

/// First integer followed by "min"/"minute"; zero or unparsable falls back to the default.
pub fn focus_minutes(normalized: &str, default_minutes: u32) -> u32 {
    FOCUS_DURATION
        .captures(normalized)
        .and_then(|c| c[1].parse::<u32>().ok())
        .filter(|m| *m > 0)
        .unwrap_or(default_minutes)
}

/// Apply the command's side effect for `scope` and build the terminal reply.
pub fn execute(
    command: Command,
    store: &dyn CompanionStore,
    scope: &str,
) -> Result<CommandOutcome, StoreError> {
    let mut memory = store.load_memory(scope)?;
    let mut silent_mode = store.load_silent_mode(scope)?;
    let mut safe_word_set = store.load_safe_word(scope)?.is_some();
    let mut voice_mode = VoiceMode::Normal;

    let reply = match &command {
        Command::RegisterSafeWord { word } => {
            store.save_safe_word(scope, word)?;
            safe_word_set = true;
            tracing::info!(scope, "[HAVEN] safe word registered");
            format!(
                "Your safe word is set. Whenever you send just \"{}\", I'll stop everything and help you ground yourself.",
                word
            )
        }
        Command::SafeWordTriggered => {
            voice_mode = VoiceMode::Whisper;
            tracing::info!(scope, "[HAVEN] safe word triggered");
            GROUNDING_REPLY.to_string()
        }
        Command::SilentMode { enabled } => {
            store.save_silent_mode(scope, *enabled)?;
            silent_mode = *enabled;
            tracing::info!(scope, enabled = *enabled, "[HAVEN] silent mode toggled");
            if *enabled {
                SILENT_ON_REPLY.to_string()
            } else {
                SILENT_OFF_REPLY.to_string()
            }
        }
        Command::Remember { item } => {
            memory.push(item.clone());
            store.save_memory(scope, &memory)?;
            tracing::info!(scope, count = memory.len(), "[HAVEN] memory added");
            "Got it. I'll remember that.".to_string()
        }
        Command::Forget { needle } => {
            let before = memory.len();
            if !needle.is_empty() {
                memory.retain(|m| !m.to_lowercase().contains(needle.as_str()));
            }
            let removed = before - memory.len();
            if removed > 0 {
                store.save_memory(scope, &memory)?;
            }
            tracing::info!(scope, removed, "[HAVEN] memory forget");
            match removed {
                0 => "I didn't have anything like that saved.".to_string(),
                1 => "Okay, I've forgotten that.".to_string(),
                n => format!("Okay, I've forgotten {} things about that.", n),
            }
        }
        Command::Focus { minutes } => {
            tracing::info!(scope, minutes = *minutes, "[HAVEN] focus mode");
            format!(
                "Focus mode on for {} minutes. Pick one task, silence notifications, and I'll be here when you're done.",
                minutes
            )
        }
    };

    Ok(CommandOutcome {
        command,
        reply,
        voice_mode,
        memory_count: memory.len(),
        silent_mode,
        safe_word_set,
    })
}

pub const GROUNDING_REPLY: &str = "I'm right here. Let's pause together. Breathe in slowly for four counts, \
hold for four, and breathe out for six. Now name five things you can see around you. You are safe in this moment.";

pub const SILENT_ON_REPLY: &str = "Silent mode is on. I'll just listen.";

pub const SILENT_OFF_REPLY: &str = "Silent mode is off. I'm back to talking with you.";
