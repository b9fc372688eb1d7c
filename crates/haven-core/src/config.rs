//! Haven configuration.
//!
//! Precedence: environment (`HAVEN_<KEY>`, e.g. `HAVEN_STORAGE=memory`) > TOML file at
//! `$HAVEN_CONFIG` or `config/haven.toml` > built-in defaults.
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | bind_addr | 127.0.0.1:5000 | Gateway listen address. |
//! | data_path | ./data/haven | Sled directory. |
//! | storage | sled | `sled` or `memory`. |
//! | openrouter_api_key | (none) | Falls back to `OPENROUTER_API_KEY`. Without a key the echo model is used. |
//! | model | meta-llama/llama-3.3-70b-instruct | Provider model id. |
//! | llm_timeout_secs | 30 | Upper bound on one language-model call. |
//! | default_personality | calm | Used when a request names none or an unknown one. |
//! | anxiety_counts_as_overwhelm | true | Treat any anxious message as overwhelm. |
//! | emotion_log_cap | 30 | Entries kept in the emotion log. |
//! | default_focus_minutes | 25 | Focus length when none is given. |

use crate::commands::DEFAULT_FOCUS_MINUTES;
use crate::llm::DEFAULT_MODEL;
use crate::persona::Personality;
use crate::trend::EMOTION_LOG_CAP;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "config/haven.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HavenConfig {
    pub bind_addr: String,
    pub data_path: PathBuf,
    pub storage: StorageKind,
    pub openrouter_api_key: Option<String>,
    pub model: String,
    pub llm_timeout_secs: u64,
    pub default_personality: Personality,
    pub anxiety_counts_as_overwhelm: bool,
    pub emotion_log_cap: usize,
    pub default_focus_minutes: u32,
}

impl Default for HavenConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5000".to_string(),
            data_path: PathBuf::from("./data/haven"),
            storage: StorageKind::Sled,
            openrouter_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            llm_timeout_secs: 30,
            default_personality: Personality::Calm,
            anxiety_counts_as_overwhelm: true,
            emotion_log_cap: EMOTION_LOG_CAP,
            default_focus_minutes: DEFAULT_FOCUS_MINUTES,
        }
    }
}

impl HavenConfig {
    /// Load from `$HAVEN_CONFIG` (or `config/haven.toml`) and the environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var("HAVEN_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load from a specific file (skipped when absent) and the environment.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder();
        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };
        let built = builder
            .add_source(
                config::Environment::with_prefix("HAVEN")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut cfg: HavenConfig = built.try_deserialize()?;
        if cfg.openrouter_api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            cfg.openrouter_api_key = std::env::var("OPENROUTER_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        Ok(cfg)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs.max(1))
    }
}
