//! In-memory [`CatalogStore`] implementation for tests and dry runs.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`, so insertion order
//! is the order returned by reads. Matching is brute-force cosine
//! similarity over every stored embedding.

use std::collections::HashSet;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use crate::embedding::cosine_similarity;
use crate::models::{CatalogRecord, MatchedRecord, NewRecord, RecordId};

use super::CatalogStore;

/// In-memory catalog.
pub struct InMemoryStore {
    records: RwLock<Vec<CatalogRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Seed the store with fully formed records (ids included).
    pub fn with_records(records: Vec<CatalogRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }

    /// Snapshot of every record, in insertion order.
    pub fn records(&self) -> Vec<CatalogRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    /// Look up a record by path.
    pub fn get_by_path(&self, file_path: &str) -> Option<CatalogRecord> {
        self.records
            .read()
            .ok()?
            .iter()
            .find(|r| r.file_path == file_path)
            .cloned()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory store lock poisoned")
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn existing_paths(&self) -> Result<HashSet<String>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.iter().map(|r| r.file_path.clone()).collect())
    }

    async fn insert_records(&self, records: &[NewRecord]) -> Result<()> {
        let mut stored = self.records.write().map_err(poisoned)?;
        for rec in records {
            stored.push(CatalogRecord {
                id: RecordId::Text(Uuid::new_v4().to_string()),
                file_path: rec.file_path.clone(),
                file_name: Some(rec.file_name.clone()),
                explanation: rec.explanation.clone(),
                embedding: rec.explanation_embedding.clone(),
            });
        }
        Ok(())
    }

    async fn unexplained_records(&self) -> Result<Vec<CatalogRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .iter()
            .filter(|r| r.explanation.is_none())
            .cloned()
            .collect())
    }

    async fn set_explanation(
        &self,
        id: &RecordId,
        explanation: &str,
        embedding: &[f32],
    ) -> Result<bool> {
        let mut records = self.records.write().map_err(poisoned)?;
        match records
            .iter_mut()
            .find(|r| &r.id == id && r.explanation.is_none())
        {
            Some(rec) => {
                rec.explanation = Some(explanation.to_string());
                rec.embedding = Some(embedding.to_vec());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn match_records(
        &self,
        query_embedding: &[f32],
        match_threshold: f64,
        match_count: usize,
    ) -> Result<Vec<MatchedRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        let mut matches: Vec<MatchedRecord> = records
            .iter()
            .filter_map(|r| {
                let embedding = r.embedding.as_ref()?;
                let similarity = cosine_similarity(query_embedding, embedding) as f64;
                (similarity > match_threshold).then(|| MatchedRecord {
                    id: Some(r.id.clone()),
                    file_path: r.file_path.clone(),
                    file_name: r.file_name.clone(),
                    explanation: r.explanation.clone(),
                    similarity,
                })
            })
            .collect();
        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(match_count);
        Ok(matches)
    }
}
