//! Explicitly constructed service clients.
//!
//! Commands receive a [`Services`] bundle instead of reaching for global
//! clients. [`Clients`] owns the production implementations built from
//! configuration and credentials; tests build a [`Services`] over their
//! own doubles.

use anyhow::{Context, Result};

use repo_scribe_core::store::CatalogStore;

use crate::config::{Config, Credentials};
use crate::embedding::{Embedder, EmbeddingModel, OpenAiEmbeddings};
use crate::llm::{ChatModel, OpenAiChat};
use crate::summarize::Summarizer;
use crate::supabase_store::SupabaseStore;

/// Borrowed handles to everything a pipeline talks to.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub store: &'a dyn CatalogStore,
    pub chat: &'a dyn ChatModel,
    pub embeddings: &'a dyn EmbeddingModel,
    pub config: &'a Config,
}

impl<'a> Services<'a> {
    pub fn summarizer(&self) -> Summarizer<'a> {
        Summarizer::new(self.chat, &self.config.summarize)
    }

    pub fn embedder(&self) -> Embedder<'a> {
        Embedder::new(self.embeddings, &self.config.embedding)
    }
}

/// Production clients: Supabase catalog plus OpenAI chat and embeddings.
pub struct Clients {
    pub store: SupabaseStore,
    pub chat: OpenAiChat,
    pub embeddings: OpenAiEmbeddings,
}

impl Clients {
    pub fn connect(config: &Config, credentials: &Credentials) -> Result<Self> {
        Ok(Self {
            store: store_client(config, credentials)?,
            chat: OpenAiChat::new(credentials.openai_key()?, &config.openai)
                .context("Failed to create text-generation client")?,
            embeddings: OpenAiEmbeddings::new(credentials.openai_key()?, &config.openai)
                .context("Failed to create embedding client")?,
        })
    }

    pub fn services<'a>(&'a self, config: &'a Config) -> Services<'a> {
        Services {
            store: &self.store,
            chat: &self.chat,
            embeddings: &self.embeddings,
            config,
        }
    }
}

/// Catalog client alone, for commands that never call a model.
pub fn store_client(config: &Config, credentials: &Credentials) -> Result<SupabaseStore> {
    let url = credentials.store_url(&config.store)?;
    SupabaseStore::new(&url, credentials.store_key()?, &config.store)
        .context("Failed to create catalog store client")
}
