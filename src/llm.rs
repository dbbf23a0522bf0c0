//! Chat-model capability and its OpenAI-backed implementation.
//!
//! The composer only depends on [`ChatModel`]: given a prompt, return
//! generated text. [`OpenAiChat`] calls an OpenAI-compatible
//! `/chat/completions` endpoint. Generation is not retried here — a
//! transient failure surfaces to the user, whose question stays in the
//! session history so they can ask again.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::ChatConfig;
use crate::error::{NormaError, Result};

/// The language-model capability: prompt in, generated text out.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Generate a completion for the prompt.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Chat client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub fn new(config: &ChatConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NormaError::ModelInvocation(format!("client setup failed: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| NormaError::ModelInvocation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(NormaError::ModelInvocation(format!(
                "API error {}: {}",
                status, body_text
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| NormaError::ModelInvocation(format!("invalid response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| NormaError::ModelInvocation("empty completion response".to_string()))
    }
}
