//! Language-model collaborator: one system instruction plus the raw user
//! message in, one reply string out.
//!
//! `OpenRouterModel` talks to the OpenRouter chat-completions API with reqwest.
//! `EchoModel` is used when no API key is configured. Failures are classified
//! so the engine can pick a fallback reply; nothing here retries.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("provider busy ({0})")]
    Busy(u16),

    #[error("rate limited")]
    RateLimited,

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response parse failed: {0}")]
    Parse(String),
}

pub const BUSY_FALLBACK_REPLY: &str = "I'm still here with you. Things are a little busy on my side right now, \
so give me a moment and send that again.";

pub const RATE_LIMITED_FALLBACK_REPLY: &str = "We're going a little fast for me. Let's slow down together; \
take a breath and try again in a minute.";

pub const GENERIC_FALLBACK_REPLY: &str = "Something went wrong on my side and I couldn't answer. \
Please try sending that again.";

impl LlmError {
    /// Map an HTTP status from the provider to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => LlmError::RateLimited,
            502 | 503 | 504 | 529 => LlmError::Busy(status),
            _ => LlmError::Api { status, body },
        }
    }

    /// User-visible reply standing in for the model's answer.
    pub fn fallback_reply(&self) -> &'static str {
        match self {
            LlmError::Busy(_) | LlmError::Timeout(_) => BUSY_FALLBACK_REPLY,
            LlmError::RateLimited => RATE_LIMITED_FALLBACK_REPLY,
            LlmError::Request(e) if e.is_timeout() => BUSY_FALLBACK_REPLY,
            _ => GENERIC_FALLBACK_REPLY,
        }
    }
}

#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system_instruction: &str, user_message: &str) -> Result<String, LlmError>;
}

/// Replies with the user's own words. Offline stand-in for a real provider.
#[derive(Debug, Clone, Default)]
pub struct EchoModel;

#[async_trait::async_trait]
impl LanguageModel for EchoModel {
    async fn complete(&self, _system_instruction: &str, user_message: &str) -> Result<String, LlmError> {
        Ok(format!("You said: {}", user_message))
    }
}

// OpenAI-compatible request/response for OpenRouter
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// OpenRouter chat-completions client.
pub struct OpenRouterModel {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenRouterModel {
    /// Returns `None` for an empty key.
    pub fn new(api_key: &str, timeout: Duration) -> Option<Self> {
        let key = api_key.trim();
        if key.is_empty() {
            return None;
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Some(Self {
            api_key: key.to_string(),
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENROUTER_API_BASE.to_string(),
            client,
        })
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Point at another OpenAI-compatible endpoint (e.g. a local proxy).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LanguageModel for OpenRouterModel {
    async fn complete(&self, system_instruction: &str, user_message: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_instruction,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            temperature: Some(0.7),
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("X-Title", "Haven")
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| LlmError::Parse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::Parse("response had no message content".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_classified() {
        assert!(matches!(LlmError::from_status(429, String::new()), LlmError::RateLimited));
        assert!(matches!(LlmError::from_status(503, String::new()), LlmError::Busy(503)));
        assert!(matches!(LlmError::from_status(529, String::new()), LlmError::Busy(529)));
        assert!(matches!(LlmError::from_status(401, String::new()), LlmError::Api { status: 401, .. }));
    }

    #[test]
    fn fallback_replies_are_distinct() {
        assert_eq!(LlmError::Busy(503).fallback_reply(), BUSY_FALLBACK_REPLY);
        assert_eq!(LlmError::Timeout(Duration::from_secs(1)).fallback_reply(), BUSY_FALLBACK_REPLY);
        assert_eq!(LlmError::RateLimited.fallback_reply(), RATE_LIMITED_FALLBACK_REPLY);
        assert_eq!(LlmError::Parse("bad".into()).fallback_reply(), GENERIC_FALLBACK_REPLY);
        assert_ne!(BUSY_FALLBACK_REPLY, RATE_LIMITED_FALLBACK_REPLY);
    }

    #[test]
    fn empty_key_builds_no_client() {
        assert!(OpenRouterModel::new("  ", Duration::from_secs(5)).is_none());
        let m = OpenRouterModel::new("sk-test", Duration::from_secs(5)).unwrap().with_model("x/y");
        assert_eq!(m.model(), "x/y");
    }

    #[tokio::test]
    async fn echo_model_repeats_the_message() {
        let reply = EchoModel.complete("ignored", "hello").await.unwrap();
        assert_eq!(reply, "You said: hello");
    }
}
