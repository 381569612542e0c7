//! Filesystem walk used by the registration pass.
//!
//! Yields every regular file under a root, as root-prefixed paths, with
//! version-control metadata and dependency directories excluded.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use walkdir::WalkDir;

/// Always excluded: `.git` directories, `.git` files (submodule
/// checkouts) and `node_modules` trees.
pub const DEFAULT_EXCLUDES: &[&str] = &["**/.git/**", "**/.git", "**/node_modules/**"];

/// List files under `root`, sorted, skipping excluded paths.
///
/// `extra_excludes` are matched against the path relative to `root`.
/// Entries that cannot be read are logged and skipped.
/// The returned strings keep the `root` prefix so they can be opened later
/// from the same working directory.
pub fn scan_files(root: &Path, extra_excludes: &[String]) -> Result<Vec<String>> {
    if !root.exists() {
        bail!("Scan root does not exist: {}", root.display());
    }

    let mut patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
    patterns.extend(extra_excludes.iter().cloned());
    let exclude_set = build_globset(&patterns)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        // Prune excluded directories instead of walking into them.
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        !(entry.file_type().is_dir() && is_excluded_dir(&exclude_set, relative))
    });

    for entry in walker {
        // Unreadable entries are skipped; the rest of the tree is still registered.
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable path: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclude_set.is_match(relative) {
            continue;
        }

        files.push(path.to_string_lossy().to_string());
    }

    files.sort();
    Ok(files)
}

/// A directory is excluded when any file directly inside it would be.
fn is_excluded_dir(set: &GlobSet, relative: &Path) -> bool {
    !relative.as_os_str().is_empty() && set.is_match(relative.join("_"))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
