//! Catalog data types shared by the ingestion and query pipelines.
//!
//! One [`CatalogRecord`] exists per distinct file path ever registered.
//! Records are created with no explanation, filled in exactly once by the
//! backfill pass, and never deleted.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

/// Store-assigned record identifier.
///
/// Hosted catalogs use either integer or UUID primary keys, so both shapes
/// are accepted and rendered back verbatim in filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// A catalog row as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: RecordId,
    pub file_path: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(
        default,
        rename = "explanation_embedding",
        deserialize_with = "deserialize_vector"
    )]
    pub embedding: Option<Vec<f32>>,
}

impl CatalogRecord {
    /// `true` once the backfill pass has written an explanation.
    pub fn is_explained(&self) -> bool {
        self.explanation.is_some()
    }
}

/// A pending row produced by the registration pass.
///
/// Serializes with explicit nulls for `explanation` and
/// `explanation_embedding` so batch inserts carry a uniform shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRecord {
    pub file_path: String,
    pub file_name: String,
    pub explanation: Option<String>,
    pub explanation_embedding: Option<Vec<f32>>,
}

impl NewRecord {
    /// Build a pending record for `file_path`, deriving the basename.
    pub fn pending(file_path: impl Into<String>) -> Self {
        let file_path = file_path.into();
        let file_name = Path::new(&file_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.clone());
        Self {
            file_path,
            file_name,
            explanation: None,
            explanation_embedding: None,
        }
    }
}

/// A row returned by the similarity match, best match first.
///
/// Only `file_path` is required; match functions are free to omit the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    pub file_path: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub similarity: f64,
}

/// Decode an embedding column.
///
/// pgvector columns come back over PostgREST as the text form
/// `"[0.1,0.2]"`; other stores return a plain JSON array. `null` maps to
/// `None`.
pub fn deserialize_vector<'de, D>(deserializer: D) -> Result<Option<Vec<f32>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<f32>),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::List(v)) => Ok(Some(v)),
        Some(Raw::Text(s)) => parse_vector_text(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn parse_vector_text(s: &str) -> Result<Vec<f32>, String> {
    let inner = s
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| format!("invalid vector literal: {}", s))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| format!("invalid vector component '{}': {}", part.trim(), e))
        })
        .collect()
}
