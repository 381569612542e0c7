//! [`CatalogStore`] backed by a hosted Supabase (PostgREST) table.
//!
//! Every request carries the project key in both the `apikey` and
//! `Authorization: Bearer` headers. Bulk reads are paged with
//! `order=id.asc` plus `limit`/`offset` until an empty page comes back.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use repo_scribe_core::models::{CatalogRecord, MatchedRecord, NewRecord, RecordId};
use repo_scribe_core::store::CatalogStore;

use crate::config::StoreConfig;
use crate::error::ApiError;

const SERVICE: &str = "Supabase";

pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    table: String,
    match_function: String,
    page_size: usize,
}

impl std::fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("base_url", &self.base_url)
            .field("table", &self.table)
            .field("match_function", &self.match_function)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[derive(Deserialize)]
struct PathRow {
    file_path: String,
}

#[derive(Serialize)]
struct ExplanationUpdate<'a> {
    explanation: &'a str,
    explanation_embedding: &'a [f32],
}

#[derive(Serialize)]
struct MatchRequest<'a> {
    match_count: usize,
    match_threshold: f64,
    query_embedding: &'a [f32],
}

impl SupabaseStore {
    /// Build a client for `{url}/rest/v1`.
    pub fn new(url: &str, key: &str, config: &StoreConfig) -> Result<Self> {
        anyhow::ensure!(!key.trim().is_empty(), "missing Supabase key");
        anyhow::ensure!(
            url.starts_with("http://") || url.starts_with("https://"),
            "Supabase URL must be an http(s) URL"
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(key.trim()).context("invalid Supabase key")?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key.trim()))
                .context("invalid Supabase key")?,
        );

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build Supabase HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("{}/rest/v1", url.trim_end_matches('/')),
            table: config.table.clone(),
            match_function: config.match_function.clone(),
            page_size: config.page_size,
        })
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.base_url, self.table)
    }

    /// Read every row matching `filters`, one page at a time.
    ///
    /// Pages are ordered by `id` so offsets are stable between requests.
    /// The server may cap a page below `page_size` (PostgREST `max-rows`),
    /// so the offset advances by the rows actually received and only an
    /// empty page ends the read.
    async fn fetch_all<T: DeserializeOwned>(&self, filters: &[(&str, &str)]) -> Result<Vec<T>> {
        let mut rows: Vec<T> = Vec::new();
        let limit = self.page_size.to_string();
        loop {
            let offset = rows.len().to_string();
            let mut query: Vec<(&str, &str)> = filters.to_vec();
            query.push(("order", "id.asc"));
            query.push(("limit", &limit));
            query.push(("offset", &offset));

            let response = self
                .client
                .get(self.table_url())
                .query(&query)
                .send()
                .await
                .map_err(ApiError::from)?;
            if !response.status().is_success() {
                return Err(ApiError::from_response(SERVICE, response).await.into());
            }
            let page: Vec<T> = response.json().await.map_err(ApiError::from)?;
            if page.is_empty() {
                return Ok(rows);
            }
            rows.extend(page);
        }
    }
}

#[async_trait]
impl CatalogStore for SupabaseStore {
    async fn existing_paths(&self) -> Result<HashSet<String>> {
        let rows: Vec<PathRow> = self
            .fetch_all(&[("select", "file_path")])
            .await
            .context("failed to read existing file paths")?;
        Ok(rows.into_iter().map(|r| r.file_path).collect())
    }

    async fn insert_records(&self, records: &[NewRecord]) -> Result<()> {
        let response = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=minimal")
            .json(records)
            .send()
            .await
            .map_err(ApiError::from)?;
        if !response.status().is_success() {
            return Err(anyhow::Error::from(
                ApiError::from_response(SERVICE, response).await,
            ))
            .with_context(|| format!("failed to insert {} records", records.len()));
        }
        Ok(())
    }

    async fn unexplained_records(&self) -> Result<Vec<CatalogRecord>> {
        self.fetch_all(&[("select", "*"), ("explanation", "is.null")])
            .await
            .context("failed to read unexplained records")
    }

    async fn unexplained_paths(&self) -> Result<Vec<String>> {
        let rows: Vec<PathRow> = self
            .fetch_all(&[("select", "file_path"), ("explanation", "is.null")])
            .await
            .context("failed to read unexplained file paths")?;
        Ok(rows.into_iter().map(|r| r.file_path).collect())
    }

    async fn set_explanation(
        &self,
        id: &RecordId,
        explanation: &str,
        embedding: &[f32],
    ) -> Result<bool> {
        let id_filter = format!("eq.{}", id);
        let response = self
            .client
            .patch(self.table_url())
            .query(&[("id", id_filter.as_str()), ("explanation", "is.null")])
            .header("Prefer", "return=representation")
            .json(&ExplanationUpdate {
                explanation,
                explanation_embedding: embedding,
            })
            .send()
            .await
            .map_err(ApiError::from)?;
        if !response.status().is_success() {
            return Err(anyhow::Error::from(
                ApiError::from_response(SERVICE, response).await,
            ))
            .with_context(|| format!("failed to update record {}", id));
        }
        let updated: Vec<serde_json::Value> = response.json().await.map_err(ApiError::from)?;
        Ok(!updated.is_empty())
    }

    async fn match_records(
        &self,
        query_embedding: &[f32],
        match_threshold: f64,
        match_count: usize,
    ) -> Result<Vec<MatchedRecord>> {
        let response = self
            .client
            .post(format!("{}/rpc/{}", self.base_url, self.match_function))
            .json(&MatchRequest {
                match_count,
                match_threshold,
                query_embedding,
            })
            .send()
            .await
            .map_err(ApiError::from)?;
        if !response.status().is_success() {
            return Err(anyhow::Error::from(
                ApiError::from_response(SERVICE, response).await,
            ))
            .context("similarity match failed");
        }
        let rows: Vec<MatchedRecord> = response.json().await.map_err(ApiError::from)?;
        Ok(rows)
    }
}
