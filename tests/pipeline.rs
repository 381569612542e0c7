//! Pipeline behavior against the in-memory catalog and scripted models.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::TempDir;

use repo_scribe::backfill::backfill;
use repo_scribe::config::Config;
use repo_scribe::embedding::EmbeddingModel;
use repo_scribe::error::ApiError;
use repo_scribe::ingest::register;
use repo_scribe::llm::{ChatMessage, ChatModel, Role};
use repo_scribe::search::answer;
use repo_scribe::services::Services;
use repo_scribe_core::models::{CatalogRecord, MatchedRecord, NewRecord, RecordId};
use repo_scribe_core::store::memory::InMemoryStore;
use repo_scribe_core::store::CatalogStore;

// ============ Doubles ============

/// Wraps [`InMemoryStore`] and records which write/match calls were made.
struct CountingStore {
    inner: InMemoryStore,
    insert_batches: Mutex<Vec<Vec<String>>>,
    updated_ids: Mutex<Vec<RecordId>>,
    match_calls: Mutex<usize>,
}

impl CountingStore {
    fn new(records: Vec<CatalogRecord>) -> Self {
        Self {
            inner: InMemoryStore::with_records(records),
            insert_batches: Mutex::new(Vec::new()),
            updated_ids: Mutex::new(Vec::new()),
            match_calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl CatalogStore for CountingStore {
    async fn existing_paths(&self) -> anyhow::Result<std::collections::HashSet<String>> {
        self.inner.existing_paths().await
    }

    async fn insert_records(&self, records: &[NewRecord]) -> anyhow::Result<()> {
        self.insert_batches
            .lock()
            .unwrap()
            .push(records.iter().map(|r| r.file_path.clone()).collect());
        self.inner.insert_records(records).await
    }

    async fn unexplained_records(&self) -> anyhow::Result<Vec<CatalogRecord>> {
        self.inner.unexplained_records().await
    }

    async fn set_explanation(
        &self,
        id: &RecordId,
        explanation: &str,
        embedding: &[f32],
    ) -> anyhow::Result<bool> {
        self.updated_ids.lock().unwrap().push(id.clone());
        self.inner.set_explanation(id, explanation, embedding).await
    }

    async fn match_records(
        &self,
        query_embedding: &[f32],
        match_threshold: f64,
        match_count: usize,
    ) -> anyhow::Result<Vec<MatchedRecord>> {
        *self.match_calls.lock().unwrap() += 1;
        self.inner
            .match_records(query_embedding, match_threshold, match_count)
            .await
    }
}

struct ScriptedChat {
    reply: Option<String>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedChat {
    fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            reply: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    fn model_name(&self) -> &str {
        "scripted-chat"
    }

    async fn complete(&self, messages: &[ChatMessage], _max_tokens: u32) -> Result<String, ApiError> {
        self.calls.lock().unwrap().push(messages.to_vec());
        self.reply.clone().ok_or(ApiError::EmptyResponse {
            service: "scripted-chat",
        })
    }
}

struct FixedEmbeddings {
    vector: Option<Vec<f32>>,
    inputs: Mutex<Vec<String>>,
}

impl FixedEmbeddings {
    fn returning(vector: Vec<f32>) -> Self {
        Self {
            vector: Some(vector),
            inputs: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            vector: None,
            inputs: Mutex::new(Vec::new()),
        }
    }

    fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingModel for FixedEmbeddings {
    fn model_name(&self) -> &str {
        "fixed-embeddings"
    }

    async fn embed(&self, input: &str) -> Result<Vec<f32>, ApiError> {
        self.inputs.lock().unwrap().push(input.to_string());
        self.vector.clone().ok_or(ApiError::EmptyResponse {
            service: "fixed-embeddings",
        })
    }
}

// ============ Helpers ============

fn write(root: &Path, rel: &str, contents: &str) -> String {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

fn pending(id: i64, path: &str) -> CatalogRecord {
    CatalogRecord {
        id: RecordId::Int(id),
        file_path: path.to_string(),
        file_name: None,
        explanation: None,
        embedding: None,
    }
}

fn explained(id: i64, path: &str, explanation: &str, embedding: Vec<f32>) -> CatalogRecord {
    CatalogRecord {
        id: RecordId::Int(id),
        file_path: path.to_string(),
        file_name: None,
        explanation: Some(explanation.to_string()),
        embedding: Some(embedding),
    }
}

fn services<'a>(
    store: &'a CountingStore,
    chat: &'a ScriptedChat,
    embeddings: &'a FixedEmbeddings,
    config: &'a Config,
) -> Services<'a> {
    Services {
        store,
        chat,
        embeddings,
        config,
    }
}

// ============ Registration ============

#[tokio::test]
async fn test_register_inserts_only_new_paths_in_one_batch() {
    let tmp = TempDir::new().unwrap();
    let a = write(tmp.path(), "ngen/a.cpp", "int a;");
    let b = write(tmp.path(), "ngen/b.cpp", "int b;");
    let c = write(tmp.path(), "ngen/c.cpp", "int c;");

    let store = CountingStore::new(vec![pending(1, &a), pending(2, &b)]);
    let report = register(&store, tmp.path(), &[]).await.unwrap();

    assert_eq!(report.discovered, 3);
    assert_eq!(report.already_present, 2);
    assert_eq!(report.inserted, 1);
    assert_eq!(*store.insert_batches.lock().unwrap(), vec![vec![c.clone()]]);

    let inserted = store.inner.get_by_path(&c).unwrap();
    assert_eq!(inserted.file_name.as_deref(), Some("c.cpp"));
    assert!(inserted.explanation.is_none());
    assert!(inserted.embedding.is_none());
}

#[tokio::test]
async fn test_register_with_nothing_new_makes_no_insert_call() {
    let tmp = TempDir::new().unwrap();
    let a = write(tmp.path(), "repo/a.py", "a = 1");
    let b = write(tmp.path(), "repo/b.py", "b = 2");

    let store = CountingStore::new(vec![pending(1, &a), pending(2, &b)]);
    let report = register(&store, tmp.path(), &[]).await.unwrap();

    assert_eq!(report.inserted, 0);
    assert!(store.insert_batches.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_skips_vcs_and_dependency_dirs() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "repo/.git/config", "[core]");
    write(tmp.path(), "repo/web/node_modules/x/index.js", "");
    let kept = write(tmp.path(), "repo/web/app.js", "");

    let store = CountingStore::new(Vec::new());
    register(&store, tmp.path(), &[]).await.unwrap();

    assert_eq!(*store.insert_batches.lock().unwrap(), vec![vec![kept]]);
}

// ============ Backfill ============

#[tokio::test]
async fn test_backfill_sets_explanation_and_embedding() {
    let tmp = TempDir::new().unwrap();
    let fresh = write(tmp.path(), "t-route/route.py", "def route(): pass");
    let done = write(tmp.path(), "t-route/done.py", "x = 1");

    let store = CountingStore::new(vec![
        pending(1, &fresh),
        explained(2, &done, "Already explained.", vec![0.5, 0.5]),
    ]);
    let chat = ScriptedChat::replying("  Routes water.  ");
    let embeddings = FixedEmbeddings::returning(vec![0.1, 0.2, 0.3]);
    let config = Config::default();

    let report = backfill(services(&store, &chat, &embeddings, &config), None)
        .await
        .unwrap();

    assert_eq!(report.selected, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(*store.updated_ids.lock().unwrap(), vec![RecordId::Int(1)]);

    let record = store.inner.get_by_path(&fresh).unwrap();
    assert_eq!(record.explanation.as_deref(), Some("Routes water."));
    assert_eq!(record.embedding, Some(vec![0.1, 0.2, 0.3]));
    assert_eq!(embeddings.inputs(), vec!["Routes water.".to_string()]);

    let untouched = store.inner.get_by_path(&done).unwrap();
    assert_eq!(untouched.explanation.as_deref(), Some("Already explained."));

    let calls = chat.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0][1].content.contains(&fresh));
}

#[tokio::test]
async fn test_backfill_never_summarizes_denylisted_files() {
    let tmp = TempDir::new().unwrap();
    let logo = write(tmp.path(), "docs/logo.PNG", "not really a png");
    let readme = write(tmp.path(), "README.md", "# Readme");

    let store = CountingStore::new(vec![pending(1, &logo), pending(2, &readme)]);
    let chat = ScriptedChat::replying("unused");
    let embeddings = FixedEmbeddings::returning(vec![1.0]);
    let config = Config::default();

    let report = backfill(services(&store, &chat, &embeddings, &config), None)
        .await
        .unwrap();

    assert_eq!(report.ignored, 2);
    assert!(chat.calls().is_empty());
    assert!(store.updated_ids.lock().unwrap().is_empty());
    assert!(store.inner.get_by_path(&logo).unwrap().explanation.is_none());
}

#[tokio::test]
async fn test_backfill_unreadable_file_is_left_pending() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("gone.py").to_string_lossy().to_string();
    let present = write(tmp.path(), "here.py", "print('hi')");

    let store = CountingStore::new(vec![pending(1, &missing), pending(2, &present)]);
    let chat = ScriptedChat::replying("Prints a greeting.");
    let embeddings = FixedEmbeddings::returning(vec![1.0]);
    let config = Config::default();

    let report = backfill(services(&store, &chat, &embeddings, &config), None)
        .await
        .unwrap();

    assert_eq!(report.read_failures, 1);
    assert_eq!(report.updated, 1);
    assert!(store.inner.get_by_path(&missing).unwrap().explanation.is_none());
    assert!(store.inner.get_by_path(&present).unwrap().is_explained());
}

#[tokio::test]
async fn test_backfill_oversized_file_gets_placeholder_without_model_call() {
    let tmp = TempDir::new().unwrap();
    let big = write(tmp.path(), "data/big.csv", &"1,".repeat(20_001));

    let store = CountingStore::new(vec![pending(1, &big)]);
    let chat = ScriptedChat::replying("unused");
    let embeddings = FixedEmbeddings::returning(vec![0.9]);
    let config = Config::default();

    backfill(services(&store, &chat, &embeddings, &config), None)
        .await
        .unwrap();

    assert!(chat.calls().is_empty());
    let record = store.inner.get_by_path(&big).unwrap();
    assert_eq!(
        record.explanation.as_deref(),
        Some("This file is too large to explain.")
    );
    assert_eq!(record.embedding, Some(vec![0.9]));
}

#[tokio::test]
async fn test_backfill_failed_explanation_is_persisted_by_default() {
    let tmp = TempDir::new().unwrap();
    let path = write(tmp.path(), "a.py", "a = 1");

    let store = CountingStore::new(vec![pending(1, &path)]);
    let chat = ScriptedChat::failing();
    let embeddings = FixedEmbeddings::returning(vec![1.0]);
    let config = Config::default();

    let report = backfill(services(&store, &chat, &embeddings, &config), None)
        .await
        .unwrap();

    assert_eq!(report.explain_failures, 1);
    assert_eq!(report.updated, 1);
    assert!(embeddings.inputs().is_empty());
    let record = store.inner.get_by_path(&path).unwrap();
    assert_eq!(record.explanation.as_deref(), Some(""));
    assert_eq!(record.embedding, Some(Vec::new()));
}

#[tokio::test]
async fn test_backfill_failures_left_pending_when_not_persisted() {
    let tmp = TempDir::new().unwrap();
    let a = write(tmp.path(), "a.py", "a = 1");
    let b = write(tmp.path(), "b.py", "b = 2");

    let mut config = Config::default();
    config.ingest.persist_failures = false;

    // Explanation fails.
    let store = CountingStore::new(vec![pending(1, &a)]);
    let chat = ScriptedChat::failing();
    let embeddings = FixedEmbeddings::returning(vec![1.0]);
    let report = backfill(services(&store, &chat, &embeddings, &config), None)
        .await
        .unwrap();
    assert_eq!(report.left_pending, 1);
    assert!(store.updated_ids.lock().unwrap().is_empty());

    // Embedding fails.
    let store = CountingStore::new(vec![pending(2, &b)]);
    let chat = ScriptedChat::replying("Assigns b.");
    let embeddings = FixedEmbeddings::failing();
    let report = backfill(services(&store, &chat, &embeddings, &config), None)
        .await
        .unwrap();
    assert_eq!(report.embed_failures, 1);
    assert_eq!(report.left_pending, 1);
    assert!(store.inner.get_by_path(&b).unwrap().explanation.is_none());
}

#[tokio::test]
async fn test_backfill_limit_keeps_store_order() {
    let tmp = TempDir::new().unwrap();
    let paths: Vec<String> = (1..=3)
        .map(|i| write(tmp.path(), &format!("f{}.py", i), "pass"))
        .collect();

    let store = CountingStore::new(
        paths
            .iter()
            .enumerate()
            .map(|(i, p)| pending(i as i64 + 1, p))
            .collect(),
    );
    let chat = ScriptedChat::replying("Does nothing.");
    let embeddings = FixedEmbeddings::returning(vec![1.0]);
    let config = Config::default();

    let report = backfill(services(&store, &chat, &embeddings, &config), Some(2))
        .await
        .unwrap();

    assert_eq!(report.selected, 2);
    assert_eq!(
        *store.updated_ids.lock().unwrap(),
        vec![RecordId::Int(1), RecordId::Int(2)]
    );
}

// ============ Query Pipeline ============

#[tokio::test]
async fn test_query_without_matches_sends_no_file_messages() {
    let tmp = TempDir::new().unwrap();
    let path = write(tmp.path(), "ngen/a.cpp", "int a;");

    // Orthogonal to the query vector: similarity 0, below the threshold.
    let store = CountingStore::new(vec![explained(1, &path, "Declares a.", vec![0.0, 1.0])]);
    let chat = ScriptedChat::replying("\nNo idea.\n");
    let embeddings = FixedEmbeddings::returning(vec![1.0, 0.0]);
    let config = Config::default();

    let text = answer(services(&store, &chat, &embeddings, &config), "what is ngen?")
        .await
        .unwrap();
    assert_eq!(text, "No idea.");

    let calls = chat.calls();
    assert_eq!(calls.len(), 1);
    let messages = &calls[0];
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[1].content, "what is ngen?");
    assert!(messages.iter().all(|m| !m.content.starts_with("File: ")));
}

#[tokio::test]
async fn test_query_includes_matched_file_contents() {
    let tmp = TempDir::new().unwrap();
    let hit = write(tmp.path(), "ngen/forcing.py", "def regrid(): ...");
    let image = write(tmp.path(), "ngen/diagram.svg", "<svg/>");

    let store = CountingStore::new(vec![
        explained(1, &hit, "Regrids forcing.", vec![1.0, 0.0]),
        explained(2, &image, "A diagram.", vec![0.9, 0.1]),
    ]);
    let chat = ScriptedChat::replying("See forcing.py.");
    let embeddings = FixedEmbeddings::returning(vec![1.0, 0.0]);
    let config = Config::default();

    let text = answer(services(&store, &chat, &embeddings, &config), "regridding?")
        .await
        .unwrap();
    assert_eq!(text, "See forcing.py.");
    assert_eq!(embeddings.inputs(), vec!["regridding?".to_string()]);

    let messages = &chat.calls()[0];
    assert_eq!(messages.len(), 4);
    assert_eq!(
        messages[3].content,
        format!("File: {}\nContents: def regrid(): ...\n", hit)
    );
}

#[tokio::test]
async fn test_query_embedding_failure_skips_match_but_still_answers() {
    let store = CountingStore::new(Vec::new());
    let chat = ScriptedChat::replying("General answer.");
    let embeddings = FixedEmbeddings::failing();
    let config = Config::default();

    let text = answer(services(&store, &chat, &embeddings, &config), "anything")
        .await
        .unwrap();

    assert_eq!(text, "General answer.");
    assert_eq!(*store.match_calls.lock().unwrap(), 0);
    assert_eq!(chat.calls()[0].len(), 3);
}

#[tokio::test]
async fn test_query_generation_failure_returns_empty_string() {
    let store = CountingStore::new(Vec::new());
    let chat = ScriptedChat::failing();
    let embeddings = FixedEmbeddings::returning(vec![1.0]);
    let config = Config::default();

    let text = answer(services(&store, &chat, &embeddings, &config), "anything")
        .await
        .unwrap();
    assert_eq!(text, "");
}
