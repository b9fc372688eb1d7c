//! Error types for the Haven core.

use thiserror::Error;

/// Result type alias for turn processing.
pub type HavenResult<T> = Result<T, HavenError>;

/// Failures of the persistence collaborator. Fatal for the current turn.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sled: {0}")]
    Sled(#[from] sled::Error),

    #[error("stored value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that escape `CompanionEngine::handle_turn`.
///
/// Language-model failures are not in here: they are folded into a fallback
/// reply (see `LlmError::fallback_reply`).
#[derive(Error, Debug)]
pub enum HavenError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
