//! Embedding client and the Embedder component.
//!
//! Defines the [`EmbeddingModel`] trait and its OpenAI implementation,
//! plus [`Embedder`], which applies the input length cap before every
//! call.
//!
//! # Failure handling
//!
//! [`Embedder::embed`] returns a typed `Result`. [`Embedder::embed_or_empty`]
//! logs the error and returns an empty vector instead, for callers that
//! must never see an embedding failure.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use repo_scribe_core::embedding::truncate_chars;

use crate::config::{EmbeddingConfig, OpenAiConfig};
use crate::error::ApiError;

/// Trait for embedding backends.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Returns the model identifier (e.g. `"text-embedding-ada-002"`).
    fn model_name(&self) -> &str;

    /// Embed one input string as-is.
    async fn embed(&self, input: &str) -> Result<Vec<f32>, ApiError>;
}

/// Embedding provider using the OpenAI API.
///
/// Calls `POST {base_url}/embeddings` with a single input per request.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl std::fmt::Debug for OpenAiEmbeddings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddings")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiEmbeddings {
    pub fn new(api_key: &str, config: &OpenAiConfig) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build OpenAI HTTP client")?;
        Ok(Self {
            client,
            api_key: api_key.trim().to_string(),
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.embedding_model.clone(),
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[async_trait]
impl EmbeddingModel for OpenAiEmbeddings {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, input: &str) -> Result<Vec<f32>, ApiError> {
        let body = EmbeddingRequest {
            model: &self.model,
            input,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response("OpenAI embeddings", response).await);
        }

        let json: serde_json::Value = response.json().await?;
        parse_openai_response(&json)
    }
}

/// Extract `data[0].embedding` from an embeddings response.
fn parse_openai_response(json: &serde_json::Value) -> Result<Vec<f32>, ApiError> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or(ApiError::EmptyResponse {
            service: "OpenAI embeddings",
        })?;

    Ok(embedding
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0) as f32)
        .collect())
}

/// The Embedder: truncation plus an embedding call.
pub struct Embedder<'a> {
    model: &'a dyn EmbeddingModel,
    max_input_chars: usize,
}

impl<'a> Embedder<'a> {
    pub fn new(model: &'a dyn EmbeddingModel, config: &EmbeddingConfig) -> Self {
        Self {
            model,
            max_input_chars: config.max_input_chars,
        }
    }

    /// Embed the first `max_input_chars` characters of `text`.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        self.model
            .embed(truncate_chars(text, self.max_input_chars))
            .await
    }

    /// Like [`embed`](Self::embed), but logs failures and returns an empty
    /// vector.
    pub async fn embed_or_empty(&self, text: &str) -> Vec<f32> {
        match self.embed(text).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::error!(model = self.model.model_name(), "embedding failed: {}", e);
                Vec::new()
            }
        }
    }
}
