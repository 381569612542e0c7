//! Catalog storage abstraction.
//!
//! The [`CatalogStore`] trait covers every operation the ingestion and
//! query pipelines need from the catalog: a bulk path read, a batch
//! insert, the null-explanation read, the per-record update and the
//! server-side similarity match.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CatalogRecord, MatchedRecord, NewRecord, RecordId};

/// Abstract catalog backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`existing_paths`](CatalogStore::existing_paths) | Every registered `file_path` |
/// | [`insert_records`](CatalogStore::insert_records) | Batch insert of pending records |
/// | [`unexplained_records`](CatalogStore::unexplained_records) | Records whose explanation is null |
/// | [`unexplained_paths`](CatalogStore::unexplained_paths) | Paths of those records only |
/// | [`set_explanation`](CatalogStore::set_explanation) | Write explanation and embedding for one record |
/// | [`match_records`](CatalogStore::match_records) | Nearest records above a similarity threshold |
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch the set of every registered `file_path`.
    async fn existing_paths(&self) -> Result<HashSet<String>>;

    /// Insert all `records` in one batch write.
    async fn insert_records(&self, records: &[NewRecord]) -> Result<()>;

    /// Fetch all records whose `explanation` is null, in store order.
    async fn unexplained_records(&self) -> Result<Vec<CatalogRecord>>;

    /// `file_path` of every record whose `explanation` is null.
    ///
    /// Backends should override this to avoid transferring full rows.
    async fn unexplained_paths(&self) -> Result<Vec<String>> {
        Ok(self
            .unexplained_records()
            .await?
            .into_iter()
            .map(|r| r.file_path)
            .collect())
    }

    /// Write `explanation` and `embedding` to the record with `id`.
    ///
    /// Only applies while the record's explanation is still null. Returns
    /// `false` when nothing was updated.
    async fn set_explanation(
        &self,
        id: &RecordId,
        explanation: &str,
        embedding: &[f32],
    ) -> Result<bool>;

    /// Return up to `match_count` records whose similarity to
    /// `query_embedding` exceeds `match_threshold`, best first.
    async fn match_records(
        &self,
        query_embedding: &[f32],
        match_threshold: f64,
        match_count: usize,
    ) -> Result<Vec<MatchedRecord>>;
}
