//! Content Reader: turn a catalog path into text.
//!
//! Files whose extension is on [`IGNORED_EXTENSIONS`] are skipped without
//! being opened. Everything else is decoded as UTF-8, falling back to
//! Latin-1; notebooks (`.ipynb`) are reduced to their cell sources.

use std::path::Path;

use repo_scribe_core::notebook::notebook_text;

/// Extensions that are never read: images, PDFs, markdown, backups,
/// NetCDF data, and page markup/styling.
pub const IGNORED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "pdf", "md", "bak", "nc", "html", "css",
];

/// Read error. The caller skips the file for this run.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse notebook {path}: {message}")]
    Notebook { path: String, message: String },
}

/// Result of a successful read attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Denylisted extension; the file was not opened.
    Ignored,
}

/// `true` if `path` has a denylisted extension (case-insensitive).
pub fn is_ignored(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            IGNORED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

fn is_notebook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("ipynb"))
        .unwrap_or(false)
}

/// Read `path` as text.
pub fn read_content(path: &Path) -> Result<Content, ReadError> {
    if is_ignored(path) {
        return Ok(Content::Ignored);
    }

    let display = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|source| ReadError::Io {
        path: display.clone(),
        source,
    })?;

    let text = decode(&bytes);

    if is_notebook(path) {
        let text = notebook_text(&text).map_err(|e| ReadError::Notebook {
            path: display,
            message: format!("{:#}", e),
        })?;
        return Ok(Content::Text(text));
    }

    Ok(Content::Text(text))
}

/// UTF-8 first, then Latin-1.
///
/// Latin-1 maps every byte to the code point of the same value, so the
/// fallback cannot fail.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
