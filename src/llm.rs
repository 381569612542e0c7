//! Text-generation client.
//!
//! [`ChatModel`] is the seam the Summarizer and the Query Pipeline call
//! through; [`OpenAiChat`] implements it against an OpenAI-compatible
//! `POST {base_url}/chat/completions` endpoint. One request per call, no
//! retries.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::OpenAiConfig;
use crate::error::ApiError;

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A text-generation backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-3.5-turbo-1106"`).
    fn model_name(&self) -> &str;

    /// Send `messages` and return the assistant text, untrimmed.
    async fn complete(&self, messages: &[ChatMessage], max_tokens: u32)
        -> Result<String, ApiError>;
}

/// OpenAI chat completions client.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl std::fmt::Debug for OpenAiChat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChat")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiChat {
    pub fn new(api_key: &str, config: &OpenAiConfig) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build OpenAI HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.chat_model.clone(),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        max_tokens: u32,
    ) -> Result<String, ApiError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response("OpenAI chat", response).await);
        }

        let text = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&text)?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ApiError::EmptyResponse {
                service: "OpenAI chat",
            })
    }
}
