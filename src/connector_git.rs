//! Repository cloning.
//!
//! Each configured URL is cloned with `git clone --recurse-submodules`
//! into `<target>/<last URL segment>`. Existing checkouts are left alone;
//! a failed clone is logged and the run moves on to the next URL.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::CloneConfig;

/// What happened to one repository during [`clone_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneStatus {
    Cloned,
    AlreadyPresent,
    Failed(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CloneReport {
    pub cloned: usize,
    pub present: usize,
    pub failed: usize,
}

/// Directory name for a clone URL: its final path segment, verbatim.
///
/// ```rust
/// use repo_scribe::connector_git::repo_dir_name;
///
/// assert_eq!(repo_dir_name("https://github.com/NOAA-OWP/ngen").as_deref(), Some("ngen"));
/// assert_eq!(repo_dir_name("https://github.com/NOAA-OWP/ngen-cal.git").as_deref(), Some("ngen-cal.git"));
/// ```
pub fn repo_dir_name(url: &str) -> Option<String> {
    url.trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Where `url` is (or would be) checked out under `target`.
pub fn checkout_dir(target: &Path, url: &str) -> Result<PathBuf> {
    let name = repo_dir_name(url)
        .ok_or_else(|| anyhow::anyhow!("cannot derive a directory name from URL '{}'", url))?;
    Ok(target.join(name))
}

/// `true` if `dir` already holds a git checkout.
pub fn is_cloned(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Clone every configured repository into `config.target`.
pub fn clone_all(config: &CloneConfig) -> Result<CloneReport> {
    std::fs::create_dir_all(&config.target).with_context(|| {
        format!(
            "Failed to create clone target directory: {}",
            config.target.display()
        )
    })?;

    let mut report = CloneReport::default();
    for url in &config.repos {
        match clone_one(&config.target, url) {
            CloneStatus::Cloned => {
                tracing::info!(url = url.as_str(), "cloned");
                report.cloned += 1;
            }
            CloneStatus::AlreadyPresent => {
                tracing::info!(url = url.as_str(), "already cloned, skipping");
                report.present += 1;
            }
            CloneStatus::Failed(reason) => {
                tracing::warn!(url = url.as_str(), "clone failed: {}", reason);
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

fn clone_one(target: &Path, url: &str) -> CloneStatus {
    let dest = match checkout_dir(target, url) {
        Ok(dest) => dest,
        Err(e) => return CloneStatus::Failed(e.to_string()),
    };
    if is_cloned(&dest) {
        return CloneStatus::AlreadyPresent;
    }
    match git_clone(url, &dest) {
        Ok(()) => CloneStatus::Cloned,
        Err(e) => CloneStatus::Failed(format!("{:#}", e)),
    }
}

fn git_clone(url: &str, dest: &Path) -> Result<()> {
    let output = Command::new("git")
        .args(["clone", "--recurse-submodules"])
        .arg(url)
        .arg(dest)
        .output()
        .with_context(|| "Failed to execute 'git clone'. Is git installed?")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git clone failed: {}", stderr.trim());
    }

    Ok(())
}

/// Run the `clone` command and print a summary.
pub fn run_clone(config: &CloneConfig) -> Result<()> {
    let report = clone_all(config)?;
    println!("clone {}", config.target.display());
    println!("  cloned: {}", report.cloned);
    println!("  already present: {}", report.present);
    println!("  failed: {}", report.failed);
    Ok(())
}
