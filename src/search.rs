//! Query Pipeline: answer a natural-language question about the cloned
//! code.
//!
//! # Flow
//!
//! 1. Embed the query (an empty vector on failure means "no matches").
//! 2. Ask the catalog for the nearest records above the threshold.
//! 3. Read each matched file, skipping denylisted or unreadable paths.
//! 4. Build one chat request: system prompt, the query, a citation
//!    instruction, then file contents until the character budget is spent.
//! 5. Return the trimmed answer, or an empty string if generation failed.
//!
//! `scribe search` stops after step 2 and prints the matches.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

use repo_scribe_core::models::MatchedRecord;

use crate::llm::ChatMessage;
use crate::reader::{read_content, Content};
use crate::services::Services;
use crate::summarize::SYSTEM_PROMPT;

pub const CITATION_INSTRUCTION: &str = "Here are some reference files that might help. When giving your answer please refer to the file path. So I know where you are getting your answer from.";

/// A matched file's content, ready to be placed in the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFile {
    pub path: String,
    pub contents: String,
}

/// Embed `query` and fetch the best-matching catalog records.
pub async fn find_matches(services: Services<'_>, query: &str) -> Result<Vec<MatchedRecord>> {
    let embedding = services.embedder().embed_or_empty(query).await;
    if embedding.is_empty() {
        tracing::warn!("query embedding unavailable, continuing without reference files");
        return Ok(Vec::new());
    }

    let retrieval = &services.config.retrieval;
    services
        .store
        .match_records(&embedding, retrieval.match_threshold, retrieval.match_count)
        .await
        .context("Failed to match records")
}

/// Read the files behind `matches`, in match order, once per path.
pub fn load_reference_files(matches: &[MatchedRecord]) -> Vec<ReferenceFile> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for record in matches {
        let path = record.file_path.as_str();
        if !seen.insert(path) {
            continue;
        }
        match read_content(Path::new(path)) {
            Ok(Content::Ignored) => tracing::info!(path, "ignoring file"),
            Ok(Content::Text(contents)) => {
                tracing::info!(path, chars = contents.chars().count(), "loaded reference file");
                files.push(ReferenceFile {
                    path: path.to_string(),
                    contents,
                });
            }
            Err(e) => tracing::warn!("{}", e),
        }
    }

    tracing::info!(count = files.len(), "reference files loaded");
    files
}

/// Assemble the answer request.
///
/// Files are added in order while the running total of their content
/// lengths stays within `budget` characters; the first file that would
/// exceed it ends the list.
pub fn build_answer_messages(
    query: &str,
    files: &[ReferenceFile],
    budget: usize,
) -> Vec<ChatMessage> {
    let mut messages = vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(query),
        ChatMessage::user(CITATION_INSTRUCTION),
    ];

    let mut total = 0usize;
    for file in files {
        total += file.contents.chars().count();
        if total > budget {
            break;
        }
        messages.push(ChatMessage::user(format!(
            "File: {}\nContents: {}\n",
            file.path, file.contents
        )));
    }

    messages
}

/// Answer `query` from the catalog and the cloned files.
///
/// Catalog errors propagate; a failed generation call yields `""`.
pub async fn answer(services: Services<'_>, query: &str) -> Result<String> {
    let matches = find_matches(services, query).await?;
    let files = load_reference_files(&matches);

    let retrieval = &services.config.retrieval;
    let messages = build_answer_messages(query, &files, retrieval.context_budget());

    match services.chat.complete(&messages, retrieval.max_tokens).await {
        Ok(text) => Ok(text.trim().to_string()),
        Err(e) => {
            tracing::error!(model = services.chat.model_name(), "failed to generate answer: {}", e);
            Ok(String::new())
        }
    }
}

/// Run the `ask` command: print the answer on stdout.
pub async fn run_ask(services: Services<'_>, query: &str) -> Result<()> {
    let text = answer(services, query).await?;
    println!("{}", text);
    Ok(())
}

/// Run the `search` command: print matches without generating an answer.
pub async fn run_search(services: Services<'_>, query: &str) -> Result<()> {
    let matches = find_matches(services, query).await?;

    if matches.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, record) in matches.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, record.similarity, record.file_path);
        if let Some(explanation) = record.explanation.as_deref() {
            let first_line = explanation.lines().next().unwrap_or("");
            if !first_line.is_empty() {
                println!("    {}", first_line);
            }
        }
    }

    Ok(())
}
