//! Policy resolver: picks exactly one governing instruction plus flags.
//!
//! Precedence is a single ordered table (`POLICY_RULES`), highest first:
//! distortion, silent mode, overwhelm, overthinking, emotion, personality.
//! The first rule whose predicate holds writes the instruction. Trend notes
//! are appended afterwards and never replace it. Memory is attached only on
//! the personality path.

use crate::distortion::{Distortion, DistortionVerdict};
use crate::emotion::Emotion;
use crate::overthinking::{OverthinkingReason, OverthinkingVerdict};
use crate::persona::Personality;
use crate::trend::Trend;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceMode {
    #[default]
    Normal,
    Whisper,
}

impl VoiceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoiceMode::Normal => "normal",
            VoiceMode::Whisper => "whisper",
        }
    }
}

/// Everything the resolver reads. Built once per turn, never mutated.
#[derive(Debug, Clone, Default)]
pub struct PolicyContext<'a> {
    pub personality: Personality,
    pub memories: &'a [String],
    pub emotion: Emotion,
    pub distortion: DistortionVerdict,
    pub overthinking: OverthinkingVerdict,
    pub overwhelmed: bool,
    pub silent_mode: bool,
    pub trend: Trend,
}

/// Resolved response policy for one turn. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Policy {
    pub instruction: String,
    /// Name of the rule in `POLICY_RULES` that produced the instruction.
    pub rule: &'static str,
    pub voice_mode: VoiceMode,
    pub emotion: Emotion,
    pub trend: Trend,
    pub distortion: DistortionVerdict,
    pub overthinking: OverthinkingVerdict,
    pub overwhelmed: bool,
    pub silent_mode: bool,
}

struct PolicyRule {
    name: &'static str,
    applies: fn(&PolicyContext<'_>) -> bool,
    instruction: fn(&PolicyContext<'_>) -> String,
}

const POLICY_RULES: &[PolicyRule] = &[
    PolicyRule {
        name: "distortion",
        applies: has_distortion,
        instruction: distortion_rule,
    },
    PolicyRule {
        name: "silent_mode",
        applies: is_silent,
        instruction: silent_rule,
    },
    PolicyRule {
        name: "overwhelm",
        applies: is_overwhelmed,
        instruction: overwhelm_rule,
    },
    PolicyRule {
        name: "overthinking",
        applies: is_overthinking,
        instruction: overthinking_rule,
    },
    PolicyRule {
        name: "emotion",
        applies: has_emotion_template,
        instruction: emotion_rule,
    },
    PolicyRule {
        name: "personality",
        applies: always,
        instruction: personality_instruction,
    },
];

fn has_distortion(ctx: &PolicyContext<'_>) -> bool {
    ctx.distortion.kind.is_some()
}

fn is_silent(ctx: &PolicyContext<'_>) -> bool {
    ctx.silent_mode
}

fn is_overwhelmed(ctx: &PolicyContext<'_>) -> bool {
    ctx.overwhelmed
}

fn is_overthinking(ctx: &PolicyContext<'_>) -> bool {
    ctx.overthinking.reason.is_some()
}

fn has_emotion_template(ctx: &PolicyContext<'_>) -> bool {
    emotion_instruction(ctx.emotion).is_some()
}

fn always(_: &PolicyContext<'_>) -> bool {
    true
}

fn distortion_rule(ctx: &PolicyContext<'_>) -> String {
    ctx.distortion.kind.map(distortion_instruction).unwrap_or_default().to_string()
}

fn silent_rule(_: &PolicyContext<'_>) -> String {
    SILENT_COMPANION_INSTRUCTION.to_string()
}

fn overwhelm_rule(_: &PolicyContext<'_>) -> String {
    OVERWHELM_RESCUE_INSTRUCTION.to_string()
}

fn overthinking_rule(ctx: &PolicyContext<'_>) -> String {
    ctx.overthinking.reason.map(overthinking_instruction).unwrap_or_default().to_string()
}

fn emotion_rule(ctx: &PolicyContext<'_>) -> String {
    emotion_instruction(ctx.emotion).unwrap_or_default().to_string()
}

/// Resolve the governing instruction and flags for one turn.
pub fn resolve_policy(ctx: &PolicyContext<'_>) -> Policy {
    let (rule, mut instruction) = POLICY_RULES
        .iter()
        .find(|r| (r.applies)(ctx))
        .map(|r| (r.name, (r.instruction)(ctx)))
        .unwrap_or_else(|| ("personality", personality_instruction(ctx)));

    if let Some(note) = trend_note(ctx.trend, ctx.overthinking.detected) {
        instruction.push_str("\n\n");
        instruction.push_str(note);
    }

    tracing::debug!(
        rule,
        emotion = ctx.emotion.as_str(),
        trend = ctx.trend.as_str(),
        "[HAVEN] policy resolved"
    );

    Policy {
        instruction,
        rule,
        voice_mode: voice_mode(ctx),
        emotion: ctx.emotion,
        trend: ctx.trend,
        distortion: ctx.distortion,
        overthinking: ctx.overthinking,
        overwhelmed: ctx.overwhelmed,
        silent_mode: ctx.silent_mode,
    }
}

/// Whisper for overthinking or low, anxious moods. Independent of the winning rule.
pub fn voice_mode(ctx: &PolicyContext<'_>) -> VoiceMode {
    if ctx.overthinking.detected || matches!(ctx.emotion, Emotion::Anxiety | Emotion::Sadness) {
        VoiceMode::Whisper
    } else {
        VoiceMode::Normal
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

pub const SILENT_COMPANION_INSTRUCTION: &str = "Silent companion mode is on. Do not give advice and do not ask \
questions. Reply with one brief, gentle acknowledgement that you are here and listening.";

pub const OVERWHELM_RESCUE_INSTRUCTION: &str = "The user is overwhelmed. Reply with exactly one short, calming \
sentence that names a single small next step. No lists, no questions, no extra detail.";

fn distortion_instruction(kind: Distortion) -> &'static str {
    match kind {
        Distortion::Catastrophizing => {
            "The user is catastrophizing. Gently acknowledge the fear, then help them separate the worst case \
             from the most likely outcome. Ask what evidence they have for each. Keep it short and kind."
        }
        Distortion::MindReading => {
            "The user is assuming what others think. Kindly point out that we cannot know others' thoughts, \
             and invite them to consider other explanations. Keep it short and kind."
        }
        Distortion::AllOrNothing => {
            "The user is using all-or-nothing thinking. Reflect back the words like 'always' or 'never', \
             and help them find the middle ground or one exception. Keep it short and kind."
        }
    }
}

fn overthinking_instruction(reason: OverthinkingReason) -> &'static str {
    match reason {
        OverthinkingReason::SpiralWhatIf => {
            "The user is caught in a 'what if' spiral. Slow things down: pick only the first 'what if', \
             answer it plainly, and bring them back to what is true right now."
        }
        OverthinkingReason::RepeatedFearPattern => {
            "The user keeps circling the same fear with 'but' and 'might'. Name the loop softly, \
             then help them choose one thing they can decide or let go of today."
        }
        OverthinkingReason::GeneralOverthinking => {
            "The user is overthinking. Help them step out of their head: suggest a short pause, \
             one slow breath, and a single concrete next action."
        }
    }
}

fn emotion_instruction(emotion: Emotion) -> Option<&'static str> {
    match emotion {
        Emotion::Anxiety => Some(
            "The user feels anxious. Use a slow, soft tone. Offer one grounding technique \
             (such as breathing in for four and out for six) and reassure them they are safe right now.",
        ),
        Emotion::Sadness => Some(
            "The user feels sad. Respond with warmth and validation. Do not rush to fix anything; \
             let them know their feelings make sense and that you are here.",
        ),
        Emotion::Anger => Some(
            "The user feels angry. Stay calm and non-judgmental. Acknowledge the frustration, \
             and help them put words to what felt unfair before suggesting anything.",
        ),
        Emotion::Positive => Some(
            "The user is in a good mood. Match their energy with warmth, celebrate with them, \
             and keep the reply light.",
        ),
        Emotion::Neutral => None,
    }
}

fn personality_instruction(ctx: &PolicyContext<'_>) -> String {
    let mut out = ctx.personality.base_instruction().to_string();
    if !ctx.memories.is_empty() {
        out.push_str("\n\nThings the user asked you to remember:");
        for m in ctx.memories {
            out.push_str("\n- ");
            out.push_str(m);
        }
    }
    out
}

fn trend_note(trend: Trend, overthinking: bool) -> Option<&'static str> {
    match trend {
        Trend::AnxiousStreak if !overthinking => Some(
            "Note: the user has felt anxious several times recently. Gently check in on how they are doing overall.",
        ),
        Trend::LowMoodStreak => Some(
            "Note: the user's mood has been low for a while. Be extra gentle and remind them support is available.",
        ),
        Trend::EmotionalShift => Some(
            "Note: the user's mood just shifted toward anxiety. Acknowledge the change softly.",
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PolicyContext<'static> {
        PolicyContext::default()
    }

    fn with_distortion(kind: Distortion) -> DistortionVerdict {
        DistortionVerdict {
            detected: true,
            kind: Some(kind),
        }
    }

    fn with_overthinking(reason: OverthinkingReason) -> OverthinkingVerdict {
        OverthinkingVerdict {
            detected: true,
            reason: Some(reason),
        }
    }

    #[test]
    fn neutral_default_uses_personality_base() {
        let p = resolve_policy(&ctx());
        assert_eq!(p.rule, "personality");
        assert_eq!(p.instruction, Personality::Calm.base_instruction());
        assert_eq!(p.voice_mode, VoiceMode::Normal);
    }

    #[test]
    fn distortion_beats_everything() {
        let c = PolicyContext {
            distortion: with_distortion(Distortion::Catastrophizing),
            silent_mode: true,
            overwhelmed: true,
            emotion: Emotion::Anxiety,
            overthinking: with_overthinking(OverthinkingReason::SpiralWhatIf),
            ..ctx()
        };
        let p = resolve_policy(&c);
        assert_eq!(p.rule, "distortion");
        assert!(p.instruction.starts_with(distortion_instruction(Distortion::Catastrophizing)));
    }

    #[test]
    fn silent_mode_beats_overwhelm_and_emotion() {
        let c = PolicyContext {
            silent_mode: true,
            overwhelmed: true,
            emotion: Emotion::Anger,
            ..ctx()
        };
        let p = resolve_policy(&c);
        assert_eq!(p.rule, "silent_mode");
        assert_eq!(p.instruction, SILENT_COMPANION_INSTRUCTION);
    }

    #[test]
    fn overwhelm_beats_overthinking() {
        let c = PolicyContext {
            overwhelmed: true,
            overthinking: with_overthinking(OverthinkingReason::GeneralOverthinking),
            ..ctx()
        };
        let p = resolve_policy(&c);
        assert_eq!(p.rule, "overwhelm");
        assert_eq!(p.instruction, OVERWHELM_RESCUE_INSTRUCTION);
        assert_eq!(p.voice_mode, VoiceMode::Whisper);
    }

    #[test]
    fn overthinking_overrides_emotion() {
        let c = PolicyContext {
            emotion: Emotion::Positive,
            overthinking: with_overthinking(OverthinkingReason::RepeatedFearPattern),
            ..ctx()
        };
        let p = resolve_policy(&c);
        assert_eq!(p.rule, "overthinking");
        assert_eq!(p.instruction, overthinking_instruction(OverthinkingReason::RepeatedFearPattern));
        assert_eq!(p.voice_mode, VoiceMode::Whisper);
    }

    #[test]
    fn anxiety_without_overwhelm_uses_anxiety_template_and_whispers() {
        let c = PolicyContext {
            emotion: Emotion::Anxiety,
            ..ctx()
        };
        let p = resolve_policy(&c);
        assert_eq!(p.rule, "emotion");
        assert_eq!(Some(p.instruction.as_str()), emotion_instruction(Emotion::Anxiety));
        assert_eq!(p.voice_mode, VoiceMode::Whisper);
    }

    #[test]
    fn anger_and_positive_speak_normally() {
        for e in [Emotion::Anger, Emotion::Positive] {
            let p = resolve_policy(&PolicyContext { emotion: e, ..ctx() });
            assert_eq!(p.voice_mode, VoiceMode::Normal);
            assert_eq!(p.rule, "emotion");
        }
    }

    #[test]
    fn memory_attaches_only_to_personality_path() {
        let memories = vec!["I like tea".to_string()];
        let plain = resolve_policy(&PolicyContext {
            memories: &memories,
            ..ctx()
        });
        assert!(plain.instruction.contains("- I like tea"));

        let sad = resolve_policy(&PolicyContext {
            memories: &memories,
            emotion: Emotion::Sadness,
            ..ctx()
        });
        assert!(!sad.instruction.contains("I like tea"));
    }

    #[test]
    fn personality_changes_the_base() {
        let p = resolve_policy(&PolicyContext {
            personality: Personality::Focus,
            ..ctx()
        });
        assert_eq!(p.instruction, Personality::Focus.base_instruction());
    }

    #[test]
    fn trend_notes_append_without_replacing() {
        let p = resolve_policy(&PolicyContext {
            emotion: Emotion::Sadness,
            trend: Trend::LowMoodStreak,
            ..ctx()
        });
        let base = emotion_instruction(Emotion::Sadness).unwrap();
        assert!(p.instruction.starts_with(base));
        assert!(p.instruction.len() > base.len());
        assert!(p.instruction.contains("mood has been low"));
    }

    #[test]
    fn anxious_streak_note_skipped_while_overthinking() {
        let with = resolve_policy(&PolicyContext {
            trend: Trend::AnxiousStreak,
            ..ctx()
        });
        assert!(with.instruction.contains("anxious several times"));

        let without = resolve_policy(&PolicyContext {
            trend: Trend::AnxiousStreak,
            overthinking: with_overthinking(OverthinkingReason::SpiralWhatIf),
            ..ctx()
        });
        assert!(!without.instruction.contains("anxious several times"));
    }

    #[test]
    fn stable_and_improving_add_no_note() {
        for t in [Trend::Stable, Trend::Improving] {
            let p = resolve_policy(&PolicyContext { trend: t, ..ctx() });
            assert_eq!(p.instruction, Personality::Calm.base_instruction());
        }
    }

    #[test]
    fn instruction_is_never_empty() {
        let emotions = [Emotion::Neutral, Emotion::Anxiety, Emotion::Sadness, Emotion::Anger, Emotion::Positive];
        for e in emotions {
            for silent in [false, true] {
                for overwhelmed in [false, true] {
                    let p = resolve_policy(&PolicyContext {
                        emotion: e,
                        silent_mode: silent,
                        overwhelmed,
                        ..ctx()
                    });
                    assert!(!p.instruction.trim().is_empty());
                }
            }
        }
    }
}
