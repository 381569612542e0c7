//! Registration pass and the `sync` orchestration.
//!
//! Registration compares the files under a root directory against the
//! catalog and inserts one pending record per new path. The catalog is
//! read once and written once, regardless of how many files are found.
//!
//! ```text
//! existing_paths() ─┐
//!                   ├─ new paths ─▶ insert_records() (single batch, skipped if empty)
//! scan_files(root) ─┘
//! ```

use anyhow::{Context, Result};
use std::path::Path;

use repo_scribe_core::models::NewRecord;
use repo_scribe_core::store::CatalogStore;

use crate::backfill;
use crate::connector_fs::scan_files;
use crate::services::Services;

/// Counts from one registration pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RegisterReport {
    pub discovered: usize,
    pub already_present: usize,
    pub inserted: usize,
}

/// Register every file under `root` that the catalog does not know yet.
pub async fn register(
    store: &dyn CatalogStore,
    root: &Path,
    extra_excludes: &[String],
) -> Result<RegisterReport> {
    let existing = store
        .existing_paths()
        .await
        .context("Failed to read registered paths")?;
    tracing::debug!(count = existing.len(), "registered paths loaded");

    let files = scan_files(root, extra_excludes)?;
    let discovered = files.len();

    let pending: Vec<NewRecord> = files
        .into_iter()
        .filter(|path| !existing.contains(path))
        .map(NewRecord::pending)
        .collect();

    let report = RegisterReport {
        discovered,
        already_present: discovered - pending.len(),
        inserted: pending.len(),
    };

    if pending.is_empty() {
        tracing::info!("no new files to register");
        return Ok(report);
    }

    store
        .insert_records(&pending)
        .await
        .with_context(|| format!("Failed to insert {} new records", pending.len()))?;
    tracing::info!(inserted = report.inserted, "registered new files");

    Ok(report)
}

fn print_register(root: &Path, report: &RegisterReport) {
    println!("register {}", root.display());
    println!("  files found: {}", report.discovered);
    println!("  already registered: {}", report.already_present);
    println!("  inserted: {}", report.inserted);
}

/// Run the `register` command.
pub async fn run_register(
    store: &dyn CatalogStore,
    root: &Path,
    extra_excludes: &[String],
) -> Result<()> {
    let report = register(store, root, extra_excludes).await?;
    print_register(root, &report);
    Ok(())
}

/// Run the `sync` command: registration, then backfill of everything pending.
pub async fn run_sync(services: Services<'_>, root: &Path) -> Result<()> {
    run_register(services.store, root, &services.config.ingest.exclude_globs).await?;
    backfill::run_backfill(services, None).await?;
    println!("ok");
    Ok(())
}
