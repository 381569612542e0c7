//! Text reconstruction for notebook documents (`.ipynb`).
//!
//! Only the `source` of markdown and code cells is kept; outputs, execution
//! counts and metadata are discarded. Cell sources are joined with `"\n"`
//! in document order.

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Notebook {
    cells: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    cell_type: String,
    #[serde(default)]
    source: CellSource,
}

/// nbformat allows `source` as either a list of lines or a single string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CellSource {
    Lines(Vec<String>),
    Text(String),
}

impl Default for CellSource {
    fn default() -> Self {
        CellSource::Lines(Vec::new())
    }
}

impl CellSource {
    fn concat(&self) -> String {
        match self {
            CellSource::Lines(lines) => lines.concat(),
            CellSource::Text(text) => text.clone(),
        }
    }
}

/// Reconstruct the readable text of a notebook from its JSON source.
///
/// # Errors
///
/// Returns an error if `raw` is not valid JSON or lacks a `cells` list.
pub fn notebook_text(raw: &str) -> Result<String> {
    let notebook: Notebook =
        serde_json::from_str(raw).context("invalid notebook: expected a JSON object with cells")?;

    let parts: Vec<String> = notebook
        .cells
        .iter()
        .filter(|cell| matches!(cell.cell_type.as_str(), "markdown" | "code"))
        .map(|cell| cell.source.concat())
        .collect();

    Ok(parts.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cells_joined_in_order() {
        let nb = json!({
            "cells": [
                {"cell_type": "code", "source": ["a=1"], "outputs": [{"text": "ignored"}]},
                {"cell_type": "code", "source": ["b=2"], "execution_count": 3},
                {"cell_type": "markdown", "source": ["hello"], "metadata": {}}
            ],
            "metadata": {"kernelspec": {}},
            "nbformat": 4
        });
        assert_eq!(notebook_text(&nb.to_string()).unwrap(), "a=1\nb=2\nhello");
    }

    #[test]
    fn test_multiline_source_concatenated_verbatim() {
        let nb = json!({
            "cells": [
                {"cell_type": "code", "source": ["import os\n", "print(os.getcwd())"]}
            ]
        });
        assert_eq!(
            notebook_text(&nb.to_string()).unwrap(),
            "import os\nprint(os.getcwd())"
        );
    }

    #[test]
    fn test_raw_cells_dropped_and_string_source_accepted() {
        let nb = json!({
            "cells": [
                {"cell_type": "raw", "source": ["skip me"]},
                {"cell_type": "markdown", "source": "# Title"}
            ]
        });
        assert_eq!(notebook_text(&nb.to_string()).unwrap(), "# Title");
    }

    #[test]
    fn test_invalid_notebook_is_error() {
        assert!(notebook_text("not json").is_err());
        assert!(notebook_text("{\"nbformat\": 4}").is_err());
    }
}
