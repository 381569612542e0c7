//! Summarizer: one natural-language explanation per file.

use crate::config::SummarizeConfig;
use crate::llm::{ChatMessage, ChatModel};

pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant who explains code and summarises documentation.";

/// Outcome of a summarize call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Explanation {
    /// Trimmed model output.
    Generated(String),
    /// Content exceeded the size threshold; the model was not called.
    Placeholder(String),
    /// The model call failed (already logged).
    Failed,
}

impl Explanation {
    /// Text to persist. Empty for [`Explanation::Failed`].
    pub fn text(&self) -> &str {
        match self {
            Explanation::Generated(text) | Explanation::Placeholder(text) => text,
            Explanation::Failed => "",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Explanation::Failed)
    }
}

pub struct Summarizer<'a> {
    model: &'a dyn ChatModel,
    config: &'a SummarizeConfig,
}

impl<'a> Summarizer<'a> {
    pub fn new(model: &'a dyn ChatModel, config: &'a SummarizeConfig) -> Self {
        Self { model, config }
    }

    /// Explain `content`, which was read from `path`.
    pub async fn summarize(&self, content: &str, path: &str) -> Explanation {
        if content.chars().count() > self.config.max_content_chars {
            return Explanation::Placeholder(self.config.placeholder.clone());
        }

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "What does this code do or documentation describe? For context, its path is {}\nThe contents are:\n{}\n",
                path, content
            )),
        ];

        match self.model.complete(&messages, self.config.max_tokens).await {
            Ok(text) => Explanation::Generated(text.trim().to_string()),
            Err(e) => {
                tracing::error!(path, "failed to generate explanation: {}", e);
                Explanation::Failed
            }
        }
    }
}
