//! Shared fixtures: a scripted language model and engine builders.

#![allow(dead_code)]

use haven_core::{CompanionEngine, CompanionStore, HavenConfig, InMemoryStore, LanguageModel, LlmError, StorageKind};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the scripted model does on every call.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    Echo,
    Busy,
    RateLimited,
    Broken,
    Hang,
}

/// Records every (instruction, message) pair it is asked to complete.
pub struct ScriptedModel {
    script: Script,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedModel {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_instruction(&self) -> String {
        self.calls().last().map(|(i, _)| i.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, system_instruction: &str, user_message: &str) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_instruction.to_string(), user_message.to_string()));
        match self.script {
            Script::Echo => Ok(format!("echo: {}", user_message)),
            Script::Busy => Err(LlmError::from_status(503, "overloaded".into())),
            Script::RateLimited => Err(LlmError::from_status(429, String::new())),
            Script::Broken => Err(LlmError::Parse("garbage".into())),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok("too late".into())
            }
        }
    }
}

pub fn memory_config() -> HavenConfig {
    HavenConfig {
        storage: StorageKind::Memory,
        ..HavenConfig::default()
    }
}

pub struct Harness {
    pub engine: CompanionEngine,
    pub store: Arc<InMemoryStore>,
    pub model: Arc<ScriptedModel>,
}

pub fn harness_with(script: Script, config: HavenConfig) -> Harness {
    let store = Arc::new(InMemoryStore::new());
    let model = Arc::new(ScriptedModel::new(script));
    let engine = CompanionEngine::new(
        store.clone() as Arc<dyn CompanionStore>,
        model.clone() as Arc<dyn LanguageModel>,
        config,
    );
    Harness { engine, store, model }
}

pub fn harness() -> Harness {
    harness_with(Script::Echo, memory_config())
}
