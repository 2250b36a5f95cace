//! Chat-completions client for the external translation capability.
//!
//! The client is an explicit handle built from an [`LlmConfig`] and passed
//! by reference into the orchestrator. Rebuilding it is the only way to pick
//! up changed settings, so a run can never observe a half-updated
//! configuration.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::config::{ConfigError, LlmConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("translation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("translation request rejected ({status}): {message}")]
    Api { status: StatusCode, message: String },
}

/// One chat request: a fixed system role plus the constructed user prompt.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

pub struct LlmClient {
    http: Client,
    config: LlmConfig,
}

impl LlmClient {
    /// Validates the configuration before anything touches the network.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        config.validate()?;
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends one request and returns the trimmed completion text.
    ///
    /// A reply without a usable completion yields an empty string; callers
    /// fall back to their source text rather than treating it as an error.
    pub async fn complete(&self, request: ChatRequest<'_>) -> Result<String, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.config.api_base_url.trim_end_matches('/')
        );
        let body = json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.user },
            ],
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status, message });
        }

        let completion = response.json::<ChatCompletion>().await?;
        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: ChatMessage,
}

#[derive(Debug, Default, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
