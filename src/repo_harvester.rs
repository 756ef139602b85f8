use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::env;
use std::path::PathBuf;
use tokio::time::Duration;
use tracing::{error, info};

use crate::args::Args;
use crate::collector;
use crate::content::{self, PausePolicy};
use crate::error::{HarvestError, Result};
use crate::github::GitHubClient;
use crate::models::Repository;
use crate::partition;
use crate::query::SearchQuery;
use crate::snapshot;

/// What a completed run produced.
#[derive(Debug, Clone, Copy)]
pub struct HarvestSummary {
    pub total_repositories: usize,
    pub matched_repositories: usize,
    pub files: usize,
}

/// Top-level run controller: wires the CLI arguments to the GitHub client
/// and drives the phases in order — bounds, partitioning, collection,
/// content filtering — persisting a snapshot after each collecting phase.
pub struct RepoHarvester {
    api: GitHubClient,
    query: SearchQuery,
    filename: String,
    output: PathBuf,
    pause: PausePolicy,
    repos_file: Option<PathBuf>,
    progress: MultiProgress,
}

impl RepoHarvester {
    pub fn new(args: &Args) -> Result<Self> {
        // Get GitHub API token from arguments or environment
        let token = match &args.token {
            Some(t) if !t.trim().is_empty() => t.clone(),
            _ => match env::var("GITHUB_TOKEN") {
                Ok(token) if !token.trim().is_empty() => token,
                _ => {
                    error!("GitHub token not provided or found in environment");
                    return Err(HarvestError::MissingToken);
                }
            },
        };

        Ok(RepoHarvester {
            api: GitHubClient::new(token)?,
            query: SearchQuery::new(&args.topic, &args.language),
            filename: args.filename.clone(),
            output: args.output.clone(),
            pause: PausePolicy {
                every: args.pause_every,
                duration: Duration::from_secs(args.pause_secs),
            },
            repos_file: args.repos_file.clone(),
            progress: MultiProgress::new(),
        })
    }

    pub async fn run(&mut self) -> Result<HarvestSummary> {
        let repos = match self.repos_file.clone() {
            Some(path) => {
                info!("re-entering at the content phase from {}", path.display());
                snapshot::read_repositories(&path).await?
            }
            None => self.enumerate().await?,
        };

        let bar = self.phase_bar(repos.len() as u64, "filtering for configuration files");
        let (matched, mappings) = content::collect_config_files(
            &mut self.api,
            &repos,
            &self.filename,
            self.pause,
            &bar,
        )
        .await?;
        bar.finish_with_message(format!("{} repositories matched", matched.len()));

        snapshot::write_snapshot(&self.output, "matched-repos", &matched).await?;
        snapshot::write_snapshot(&self.output, "config-file-mapping", &mappings).await?;

        Ok(HarvestSummary {
            total_repositories: repos.len(),
            matched_repositories: matched.len(),
            files: mappings.iter().map(|m| m.files.len()).sum(),
        })
    }

    /// Phases 1–3: exploratory bounds, delimiter search, bucket collection.
    async fn enumerate(&mut self) -> Result<Vec<Repository>> {
        let bounds = self.api.search_bounds(&self.query).await?;
        let delimiters =
            partition::compute_delimiters(&mut self.api, &bounds, &self.query).await?;

        let bar = self.phase_bar((delimiters.len() - 1) as u64, "collecting buckets");
        let repos = collector::collect_repositories(
            &mut self.api,
            &self.query,
            &delimiters,
            &bounds,
            &bar,
        )
        .await?;
        bar.finish_with_message(format!("{} unique repositories", repos.len()));

        snapshot::write_snapshot(&self.output, "all-repos", &repos).await?;
        Ok(repos)
    }

    fn phase_bar(&self, len: u64, message: &str) -> ProgressBar {
        let bar = self.progress.add(ProgressBar::new(len));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {wide_msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        bar.set_message(message.to_string());
        bar
    }
}
