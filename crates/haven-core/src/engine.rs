//! Per-turn pipeline.
//!
//! message -> command interpreter (may end the turn) -> emotion, distortion,
//! overthinking and overwhelm detectors -> trend tracker -> policy resolver ->
//! language model. State is read at the start of the turn and each store
//! field is written at most once. The model call is the only await point and
//! is bounded by `HavenConfig::llm_timeout`.

use crate::commands::{execute, interpret, Command, CommandOutcome};
use crate::config::HavenConfig;
use crate::distortion::{detect_distortion, Distortion};
use crate::emotion::{classify_emotion, Emotion};
use crate::error::HavenResult;
use crate::llm::{LanguageModel, LlmError};
use crate::message::Message;
use crate::overthinking::{detect_overthinking, OverthinkingReason};
use crate::overwhelm::detect_overwhelm;
use crate::persona::Personality;
use crate::policy::{resolve_policy, Policy, PolicyContext, VoiceMode};
use crate::store::{CompanionStore, DEFAULT_SCOPE};
use crate::trend::{EmotionLogEntry, Trend, TrendTracker};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body at the HTTP boundary. A missing message is an empty message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub personality: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn with_personality(mut self, personality: &str) -> Self {
        self.personality = Some(personality.to_string());
        self
    }

    pub fn for_user(mut self, user_id: &str) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn scope(&self) -> &str {
        scope_or_default(self.user_id.as_deref())
    }
}

/// Normalises an optional user id into a store scope.
pub fn scope_or_default(user_id: Option<&str>) -> &str {
    user_id.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(DEFAULT_SCOPE)
}

/// Response body for one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    pub emotion: Emotion,
    pub emotion_trend: Trend,
    pub overthinking: bool,
    pub overthinking_reason: Option<OverthinkingReason>,
    pub voice_mode: VoiceMode,
    pub memory_count: usize,
    pub personality: Personality,
    pub distortion_detected: bool,
    pub distortion_type: Option<Distortion>,
    pub distortion_label: Option<&'static str>,
    pub is_overwhelmed: bool,
    pub silent_mode: bool,
    pub safe_word_set: bool,
    pub safe_word_triggered: bool,
    pub focus_mode: bool,
    pub focus_minutes: Option<u32>,
    /// Command that ended the turn early, if any.
    pub command: Option<&'static str>,
    /// Resolver rule that produced the instruction; `None` for commands.
    pub policy_rule: Option<&'static str>,
}

impl ChatReply {
    fn from_command(outcome: CommandOutcome, personality: Personality) -> Self {
        let focus_minutes = match outcome.command {
            Command::Focus { minutes } => Some(minutes),
            _ => None,
        };
        Self {
            reply: outcome.reply,
            emotion: Emotion::Neutral,
            emotion_trend: Trend::Stable,
            overthinking: false,
            overthinking_reason: None,
            voice_mode: outcome.voice_mode,
            memory_count: outcome.memory_count,
            personality,
            distortion_detected: false,
            distortion_type: None,
            distortion_label: None,
            is_overwhelmed: false,
            silent_mode: outcome.silent_mode,
            safe_word_set: outcome.safe_word_set,
            safe_word_triggered: outcome.command == Command::SafeWordTriggered,
            focus_mode: focus_minutes.is_some(),
            focus_minutes,
            command: Some(outcome.command.name()),
            policy_rule: None,
        }
    }

    fn from_policy(reply: String, policy: &Policy, personality: Personality, memory_count: usize, safe_word_set: bool) -> Self {
        Self {
            reply,
            emotion: policy.emotion,
            emotion_trend: policy.trend,
            overthinking: policy.overthinking.detected,
            overthinking_reason: policy.overthinking.reason,
            voice_mode: policy.voice_mode,
            memory_count,
            personality,
            distortion_detected: policy.distortion.detected,
            distortion_type: policy.distortion.kind,
            distortion_label: policy.distortion.label(),
            is_overwhelmed: policy.overwhelmed,
            silent_mode: policy.silent_mode,
            safe_word_set,
            safe_word_triggered: false,
            focus_mode: false,
            focus_minutes: None,
            command: None,
            policy_rule: Some(policy.rule),
        }
    }
}

/// Triage engine with injected store and model.
pub struct CompanionEngine {
    store: Arc<dyn CompanionStore>,
    model: Arc<dyn LanguageModel>,
    config: HavenConfig,
}

impl CompanionEngine {
    pub fn new(store: Arc<dyn CompanionStore>, model: Arc<dyn LanguageModel>, config: HavenConfig) -> Self {
        Self { store, model, config }
    }

    pub fn config(&self) -> &HavenConfig {
        &self.config
    }

    /// Process one message to completion. Store failures are fatal for the
    /// turn; model failures become a fallback reply.
    pub async fn handle_turn(&self, request: ChatRequest) -> HavenResult<ChatReply> {
        let scope = request.scope().to_string();
        let personality = Personality::resolve(request.personality.as_deref(), self.config.default_personality);
        let message = Message::new(request.message.unwrap_or_default());
        let store = self.store.as_ref();

        let safe_word = store.load_safe_word(&scope)?;
        if let Some(command) = interpret(&message, safe_word.as_deref(), self.config.default_focus_minutes) {
            tracing::debug!(scope = %scope, command = command.name(), "[HAVEN] command short-circuit");
            let outcome = execute(command, store, &scope)?;
            return Ok(ChatReply::from_command(outcome, personality));
        }

        let memories = store.load_memory(&scope)?;
        let silent_mode = store.load_silent_mode(&scope)?;

        let text = message.normalized();
        let emotion = classify_emotion(text);
        let distortion = detect_distortion(message.raw());
        let overthinking = detect_overthinking(text);
        let overwhelmed = detect_overwhelm(text, emotion, self.config.anxiety_counts_as_overwhelm);

        let mut tracker = TrendTracker::with_cap(store.load_emotion_log(&scope)?, self.config.emotion_log_cap);
        let trend = tracker.record(EmotionLogEntry::now(emotion));
        store.save_emotion_log(&scope, tracker.entries())?;

        tracing::debug!(
            scope = %scope,
            emotion = emotion.as_str(),
            distortion = distortion.kind.map(|d| d.as_str()),
            overthinking = overthinking.reason.map(|r| r.as_str()),
            overwhelmed,
            trend = trend.as_str(),
            "[HAVEN] detectors"
        );

        let policy = resolve_policy(&PolicyContext {
            personality,
            memories: &memories,
            emotion,
            distortion,
            overthinking,
            overwhelmed,
            silent_mode,
            trend,
        });

        let reply = self.complete(&policy.instruction, message.raw()).await;
        Ok(ChatReply::from_policy(
            reply,
            &policy,
            personality,
            memories.len(),
            safe_word.is_some(),
        ))
    }

    async fn complete(&self, instruction: &str, user_message: &str) -> String {
        let timeout = self.config.llm_timeout();
        let result = match tokio::time::timeout(timeout, self.model.complete(instruction, user_message)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(timeout)),
        };
        match result {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "[HAVEN] language model call failed; using fallback reply");
                e.fallback_reply().to_string()
            }
        }
    }

    /// Stored memory items for `scope`.
    pub fn memories(&self, scope: &str) -> HavenResult<Vec<String>> {
        Ok(self.store.load_memory(scope)?)
    }

    /// Stored emotion log for `scope` and the trend it currently yields.
    pub fn emotion_history(&self, scope: &str) -> HavenResult<(Vec<EmotionLogEntry>, Trend)> {
        let tracker = TrendTracker::with_cap(self.store.load_emotion_log(scope)?, self.config.emotion_log_cap);
        let trend = tracker.trend();
        Ok((tracker.into_entries(), trend))
    }
}
