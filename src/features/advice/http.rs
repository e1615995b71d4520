//! OpenAI-compatible chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::Advisor;
use crate::config::AssistantConfig;
use crate::error::FocusError;

const MAX_TOKENS: u32 = 300;

const SYSTEM_PROMPT: &str = "You are a concise productivity coach. Answer in at most three sentences.";

/// Advisor backed by a remote chat completions endpoint.
pub struct HttpAdvisor {
    http: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HttpAdvisor {
    /// Create a client from configuration.
    ///
    /// Reads the API key from the environment variable named in config.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the key is missing or the HTTP client cannot be built.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, FocusError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| FocusError::Config(format!("{} is not set", config.api_key_env)))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FocusError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn build_request_body(&self, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt},
            ],
        })
    }
}

fn extract_answer(response: ChatResponse) -> Result<String, FocusError> {
    response
        .choices
        .into_iter()
        .find_map(|c| c.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| FocusError::Advice("empty answer".to_string()))
}

#[async_trait]
impl Advisor for HttpAdvisor {
    async fn advise(&self, prompt: &str) -> Result<String, FocusError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "advise: sending request");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&self.build_request_body(prompt))
            .send()
            .await
            .map_err(|e| FocusError::Advice(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FocusError::Advice(format!("assistant returned HTTP {status}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| FocusError::Advice(format!("unreadable response: {e}")))?;

        extract_answer(parsed)
    }
}
