//! Catalog progress overview for `scribe stats`.
//!
//! Records whose file type is never read stay unexplained; they are counted
//! as ignored rather than pending.

use anyhow::{Context, Result};
use std::path::Path;

use repo_scribe_core::store::CatalogStore;

use crate::reader::is_ignored;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogStats {
    pub total: usize,
    pub explained: usize,
    pub pending: usize,
    pub ignored: usize,
}

pub async fn collect_stats(store: &dyn CatalogStore) -> Result<CatalogStats> {
    let total = store
        .existing_paths()
        .await
        .context("Failed to read registered paths")?
        .len();
    let unexplained = store
        .unexplained_paths()
        .await
        .context("Failed to read records awaiting explanation")?;

    let ignored = unexplained
        .iter()
        .filter(|path| is_ignored(Path::new(path.as_str())))
        .count();

    Ok(CatalogStats {
        total,
        explained: total.saturating_sub(unexplained.len()),
        pending: unexplained.len() - ignored,
        ignored,
    })
}

/// Run the stats command: query the catalog and print a summary.
pub async fn run_stats(store: &dyn CatalogStore) -> Result<()> {
    let stats = collect_stats(store).await?;

    println!("Catalog");
    println!("  Registered:  {}", stats.total);
    println!(
        "  Explained:   {} / {} ({}%)",
        stats.explained,
        stats.total,
        if stats.total > 0 {
            stats.explained * 100 / stats.total
        } else {
            0
        }
    );
    println!("  Pending:     {}", stats.pending);
    println!("  Ignored:     {}", stats.ignored);

    Ok(())
}
