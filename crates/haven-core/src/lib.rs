//! Haven core library.
//! Message triage, response policy, and persistence for the Haven companion.

pub mod commands;
pub mod config;
pub mod distortion;
pub mod emotion;
pub mod engine;
pub mod error;
pub mod llm;
pub mod message;
pub mod overthinking;
pub mod overwhelm;
pub mod patterns;
pub mod persona;
pub mod policy;
pub mod store;
pub mod trend;

pub use commands::{execute, interpret, Command, CommandOutcome};
pub use config::{HavenConfig, StorageKind};
pub use distortion::{detect_distortion, Distortion, DistortionVerdict};
pub use emotion::{classify_emotion, Emotion};
pub use engine::{scope_or_default, ChatReply, ChatRequest, CompanionEngine};
pub use error::{HavenError, HavenResult, StoreError};
pub use llm::{EchoModel, LanguageModel, LlmError, OpenRouterModel};
pub use message::Message;
pub use overthinking::{detect_overthinking, OverthinkingReason, OverthinkingVerdict};
pub use overwhelm::detect_overwhelm;
pub use persona::Personality;
pub use policy::{resolve_policy, Policy, PolicyContext, VoiceMode};
pub use store::{CompanionStore, InMemoryStore, SledStore, DEFAULT_SCOPE};
pub use trend::{EmotionLogEntry, Trend, TrendTracker};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
