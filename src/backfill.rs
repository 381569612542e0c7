//! Backfill pass: explain and embed every record whose explanation is null.
//!
//! Records are processed one at a time in the order the catalog returns
//! them, with one update per record. A record whose file cannot be read
//! is left untouched and picked up again on the next run.
//!
//! When the Summarizer or the Embedder fails, `[ingest].persist_failures`
//! decides the outcome: `true` writes the empty result back (the record
//! counts as processed and is never selected again), `false` leaves the
//! record null so a later run retries it.

use anyhow::{Context, Result};
use std::path::Path;

use repo_scribe_core::models::CatalogRecord;

use crate::reader::{read_content, Content};
use crate::services::Services;

/// Counts from one backfill pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    /// Null-explanation records considered (after `limit`).
    pub selected: usize,
    pub updated: usize,
    /// Denylisted files, never read.
    pub ignored: usize,
    pub read_failures: usize,
    pub explain_failures: usize,
    pub embed_failures: usize,
    /// Failed records left null because `persist_failures` is off.
    pub left_pending: usize,
    /// Records explained by someone else between select and update.
    pub already_explained: usize,
}

enum Step {
    Updated,
    AlreadyExplained,
    Ignored,
    ReadFailed,
    LeftPending,
}

/// Backfill up to `limit` null-explanation records.
pub async fn backfill(services: Services<'_>, limit: Option<usize>) -> Result<BackfillReport> {
    let mut records = services
        .store
        .unexplained_records()
        .await
        .context("Failed to read records awaiting explanation")?;
    if let Some(limit) = limit {
        records.truncate(limit);
    }

    let mut report = BackfillReport {
        selected: records.len(),
        ..Default::default()
    };
    tracing::info!(pending = records.len(), "starting backfill");

    for record in &records {
        match process_record(services, record, &mut report).await? {
            Step::Updated => report.updated += 1,
            Step::AlreadyExplained => report.already_explained += 1,
            Step::Ignored => report.ignored += 1,
            Step::ReadFailed => report.read_failures += 1,
            Step::LeftPending => report.left_pending += 1,
        }
    }

    Ok(report)
}

async fn process_record(
    services: Services<'_>,
    record: &CatalogRecord,
    report: &mut BackfillReport,
) -> Result<Step> {
    let path = record.file_path.as_str();

    let content = match read_content(Path::new(path)) {
        Ok(Content::Text(text)) => text,
        Ok(Content::Ignored) => {
            tracing::debug!(path, "ignored file type, not explaining");
            return Ok(Step::Ignored);
        }
        Err(e) => {
            tracing::warn!("{}", e);
            return Ok(Step::ReadFailed);
        }
    };

    let persist_failures = services.config.ingest.persist_failures;

    let explanation = services.summarizer().summarize(&content, path).await;
    if explanation.is_failed() {
        report.explain_failures += 1;
        if !persist_failures {
            return Ok(Step::LeftPending);
        }
    }

    // A failed explanation is written back without asking for an embedding.
    let embedding = if explanation.is_failed() {
        Vec::new()
    } else {
        match services.embedder().embed(explanation.text()).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::error!(path, "failed to embed explanation: {}", e);
                report.embed_failures += 1;
                if !persist_failures {
                    return Ok(Step::LeftPending);
                }
                Vec::new()
            }
        }
    };

    let updated = services
        .store
        .set_explanation(&record.id, explanation.text(), &embedding)
        .await
        .with_context(|| format!("Failed to update record {} ({})", record.id, path))?;

    if updated {
        tracing::debug!(path, "explained");
        Ok(Step::Updated)
    } else {
        tracing::info!(path, "record already explained, skipping");
        Ok(Step::AlreadyExplained)
    }
}

/// Run the `backfill` command and print a summary.
pub async fn run_backfill(services: Services<'_>, limit: Option<usize>) -> Result<()> {
    let report = backfill(services, limit).await?;

    println!("backfill");
    if report.selected == 0 {
        println!("  all records explained");
        return Ok(());
    }
    println!("  selected: {}", report.selected);
    println!("  updated: {}", report.updated);
    println!("  ignored file types: {}", report.ignored);
    println!("  read failures: {}", report.read_failures);
    println!("  explanation failures: {}", report.explain_failures);
    println!("  embedding failures: {}", report.embed_failures);
    if report.left_pending > 0 {
        println!("  left pending: {}", report.left_pending);
    }
    if report.already_explained > 0 {
        println!("  already explained: {}", report.already_explained);
    }
    Ok(())
}
