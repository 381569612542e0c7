//! Configured repository listing for `scribe sources`.

use anyhow::Result;

use crate::config::CloneConfig;
use crate::connector_git::{checkout_dir, is_cloned};

/// One configured repository and where it lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub url: String,
    pub dir: Option<String>,
    pub present: bool,
}

/// Status of every configured repository, in configuration order.
pub fn get_sources(config: &CloneConfig) -> Vec<SourceStatus> {
    config
        .repos
        .iter()
        .map(|url| match checkout_dir(&config.target, url) {
            Ok(dir) => SourceStatus {
                url: url.clone(),
                present: is_cloned(&dir),
                dir: Some(dir.display().to_string()),
            },
            Err(_) => SourceStatus {
                url: url.clone(),
                dir: None,
                present: false,
            },
        })
        .collect()
}

pub fn list_sources(config: &CloneConfig) -> Result<()> {
    let sources = get_sources(config);

    println!("{:<50} {:<9} DIRECTORY", "REPOSITORY", "STATUS");
    for source in &sources {
        let status = if source.present { "present" } else { "missing" };
        println!(
            "{:<50} {:<9} {}",
            source.url,
            status,
            source.dir.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
