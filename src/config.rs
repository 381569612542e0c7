//! Configuration: an optional TOML file plus environment-sourced secrets.
//!
//! Every TOML field has a default, so `scribe` runs without a config file.
//! Credentials never come from the file; they are read from the process
//! environment after an optional `.env` file has been loaded.

use anyhow::{bail, Context, Result};
use globset::Glob;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub summarize: SummarizeConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub clone: CloneConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`. `SUPABASE_URL` wins.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_match_function")]
    pub match_function: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            table: default_table(),
            match_function: default_match_function(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_table() -> String {
    "code_vectors".to_string()
}
fn default_match_function() -> String {
    "match_code_vectors".to_string()
}
fn default_page_size() -> usize {
    1000
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_chat_model() -> String {
    "gpt-3.5-turbo-1106".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct SummarizeConfig {
    /// Content longer than this many characters gets the placeholder.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    #[serde(default = "default_summary_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            max_content_chars: default_max_content_chars(),
            max_tokens: default_summary_max_tokens(),
            placeholder: default_placeholder(),
        }
    }
}

fn default_max_content_chars() -> usize {
    40_000
}
fn default_summary_max_tokens() -> u32 {
    300
}
fn default_placeholder() -> String {
    "This file is too large to explain.".to_string()
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
        }
    }
}

fn default_max_input_chars() -> usize {
    8191
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RetrievalConfig {
    #[serde(default = "default_match_count")]
    pub match_count: usize,
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    #[serde(default = "default_token_cutoff")]
    pub token_cutoff: usize,
    #[serde(default = "default_context_multiplier")]
    pub context_multiplier: usize,
    #[serde(default = "default_answer_max_tokens")]
    pub max_tokens: u32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            match_count: default_match_count(),
            match_threshold: default_match_threshold(),
            token_cutoff: default_token_cutoff(),
            context_multiplier: default_context_multiplier(),
            max_tokens: default_answer_max_tokens(),
        }
    }
}

impl RetrievalConfig {
    /// Cumulative character budget for file contents in one answer request.
    pub fn context_budget(&self) -> usize {
        self.token_cutoff * self.context_multiplier
    }
}

fn default_match_count() -> usize {
    10
}
fn default_match_threshold() -> f64 {
    0.5
}
fn default_token_cutoff() -> usize {
    10_000
}
fn default_context_multiplier() -> usize {
    3
}
fn default_answer_max_tokens() -> u32 {
    2000
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct IngestConfig {
    #[serde(default = "default_repos_dir")]
    pub root: PathBuf,
    /// Extra exclusions on top of `.git` and `node_modules`.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    /// Write back failed explanations/embeddings (marks the record processed).
    #[serde(default = "default_persist_failures")]
    pub persist_failures: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            root: default_repos_dir(),
            exclude_globs: Vec::new(),
            persist_failures: default_persist_failures(),
        }
    }
}

fn default_repos_dir() -> PathBuf {
    PathBuf::from("./repos")
}
fn default_persist_failures() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct CloneConfig {
    #[serde(default = "default_repos_dir")]
    pub target: PathBuf,
    #[serde(default = "default_repos")]
    pub repos: Vec<String>,
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            target: default_repos_dir(),
            repos: default_repos(),
        }
    }
}

fn default_repos() -> Vec<String> {
    [
        "https://github.com/NOAA-OWP/ngen",
        "https://github.com/NOAA-OWP/t-route",
        "https://github.com/NOAA-OWP/hydrofabric",
        "https://github.com/NOAA-OWP/ngen-forcing",
        "https://github.com/NOAA-OWP/DMOD",
        "https://github.com/CUAHSI/domain-subsetter",
        "https://github.com/CUAHSI/metadata-extractor",
        "https://github.com/CUAHSI/notebooks",
        "https://github.com/NOAA-OWP/ngen-cal.git",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Load and validate configuration.
///
/// `None` yields the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            parse_config(&content)?
        }
        None => Config::default(),
    };

    validate(&config)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

fn validate(config: &Config) -> Result<()> {
    if config.store.table.trim().is_empty() {
        bail!("store.table must not be empty");
    }
    if config.store.page_size == 0 {
        bail!("store.page_size must be > 0");
    }
    if config.summarize.max_content_chars == 0 {
        bail!("summarize.max_content_chars must be > 0");
    }
    if config.embedding.max_input_chars == 0 {
        bail!("embedding.max_input_chars must be > 0");
    }
    if config.retrieval.match_count == 0 {
        bail!("retrieval.match_count must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.retrieval.match_threshold) {
        bail!("retrieval.match_threshold must be in [0.0, 1.0]");
    }
    for pattern in &config.ingest.exclude_globs {
        Glob::new(pattern)
            .with_context(|| format!("ingest.exclude_globs: invalid pattern '{}'", pattern))?;
    }
    Ok(())
}

/// Secrets and endpoints sourced from the environment.
#[derive(Clone, Default)]
pub struct Credentials {
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub supabase_org_id: Option<String>,
    pub openai_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("supabase_url", &self.supabase_url)
            .field("supabase_key", &self.supabase_key.as_ref().map(|_| "<redacted>"))
            .field("supabase_org_id", &self.supabase_org_id)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Credentials {
    /// Read `SUPABASE_URL`, `SUPABASE_KEY`, `SUPABASE_ORG_ID` and
    /// `OPENAI_API_KEY`. Empty values count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            supabase_url: get("SUPABASE_URL"),
            supabase_key: get("SUPABASE_KEY"),
            supabase_org_id: get("SUPABASE_ORG_ID"),
            openai_api_key: get("OPENAI_API_KEY"),
        }
    }

    /// Resolve the store URL: `SUPABASE_URL`, then `[store].url`, then
    /// `https://{SUPABASE_ORG_ID}.supabase.co`.
    pub fn store_url(&self, config: &StoreConfig) -> Result<String> {
        if let Some(url) = self.supabase_url.as_ref().or(config.url.as_ref()) {
            return Ok(url.trim_end_matches('/').to_string());
        }
        match &self.supabase_org_id {
            Some(org) => Ok(format!("https://{}.supabase.co", org.trim())),
            None => bail!("store URL not configured: set SUPABASE_URL, SUPABASE_ORG_ID or [store].url"),
        }
    }

    pub fn store_key(&self) -> Result<&str> {
        self.supabase_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("SUPABASE_KEY environment variable not set"))
    }

    pub fn openai_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))
    }
}
