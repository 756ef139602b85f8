use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use indicatif::ProgressBar;
use tokio::time::Duration;
use tracing::{info, warn};

use crate::error::{HarvestError, Result};
use crate::models::{BlobContent, CodeSearchResults, FileMatch, Repository};
use crate::rate_limit::sleep_in_increments;

/// Log a progress line this often.
const PROGRESS_EVERY: usize = 20;

/// Content-search seam: filename matches within one repository, and the
/// blobs they point at.
#[async_trait]
pub trait ContentSearch {
    async fn search_code(&mut self, repository: &str, filename: &str)
        -> Result<CodeSearchResults>;
    async fn fetch_blob(&mut self, location: &str) -> Result<BlobContent>;
}

/// Scheduled abuse-avoidance pause: proactive and time-based, separate from
/// the reactive quota gate in the rate-limited caller.
#[derive(Debug, Clone, Copy)]
pub struct PausePolicy {
    pub every: usize,
    pub duration: Duration,
}

/// Find which repositories contain `filename` and download every matched
/// file. Returns the matched repositories and the id → decoded-contents
/// mapping, files in the order the content search returned them.
pub async fn collect_config_files<A: ContentSearch>(
    api: &mut A,
    repos: &[Repository],
    filename: &str,
    pause: PausePolicy,
    progress: &ProgressBar,
) -> Result<(Vec<Repository>, Vec<FileMatch>)> {
    let mut matched = Vec::new();
    let mut mappings = Vec::new();

    for (index, repo) in repos.iter().enumerate() {
        let results = api.search_code(&repo.full_name, filename).await?;

        if results.total_count > 0 {
            let mut files = Vec::new();
            for item in &results.items {
                let blob = api.fetch_blob(&item.git_url).await?;
                match decode_blob(&blob) {
                    Ok(text) => files.push(text),
                    Err(err) => warn!("skipping blob from {}: {err}", repo.full_name),
                }
            }
            matched.push(repo.clone());
            mappings.push(FileMatch {
                id: repo.id,
                files,
            });
        }

        let done = index + 1;
        progress.inc(1);
        if done % PROGRESS_EVERY == 0 {
            info!(
                "processed {done}/{} repositories, {} contain {filename}",
                repos.len(),
                matched.len()
            );
        }
        if pause.every > 0 && done % pause.every == 0 && done < repos.len() {
            info!(
                "taking a break for {}s to stay clear of abuse detection",
                pause.duration.as_secs()
            );
            sleep_in_increments(pause.duration).await;
        }
    }

    info!(
        "{} of {} repositories contain {filename}",
        matched.len(),
        repos.len()
    );
    Ok((matched, mappings))
}

/// Decode a blob from its transport encoding into text.
pub fn decode_blob(blob: &BlobContent) -> Result<String> {
    match blob.encoding.as_str() {
        "base64" => {
            // The API wraps base64 payloads with newlines.
            let compact: String = blob.content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = BASE64
                .decode(compact)
                .map_err(|err| HarvestError::Decode(err.to_string()))?;
            String::from_utf8(bytes).map_err(|err| HarvestError::Decode(err.to_string()))
        }
        "utf-8" => Ok(blob.content.clone()),
        other => Err(HarvestError::Decode(format!("unknown encoding '{other}'"))),
    }
}
