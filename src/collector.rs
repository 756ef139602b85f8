use async_trait::async_trait;
use indicatif::ProgressBar;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{Repository, SearchPage};
use crate::partition::{SearchBounds, RESULT_CAP};
use crate::query::{SearchQuery, StarRange};

/// Repository-search seam: a bounded query plus its opaque continuation.
#[async_trait]
pub trait RepoSearch {
    async fn search_repositories(&mut self, query: &SearchQuery) -> Result<SearchPage>;
    async fn fetch_page(&mut self, url: &str) -> Result<SearchPage>;
}

/// Exhaustively collect every repository in every delimiter range,
/// deduplicated by id. Ranges whose reported total exceeds the per-query
/// result cap are drained in rounds, each round cursoring strictly before
/// the least-recently-pushed repository fetched so far.
pub async fn collect_repositories<A: RepoSearch>(
    api: &mut A,
    base: &SearchQuery,
    delimiters: &[u64],
    bounds: &SearchBounds,
    progress: &ProgressBar,
) -> Result<Vec<Repository>> {
    let mut seen: HashMap<u64, Repository> = HashMap::new();

    for window in delimiters.windows(2) {
        let range = StarRange::new(window[0], window[1] - 1);
        collect_bucket(api, &base.with_stars(range), &mut seen).await?;
        progress.inc(1);
        progress.set_message(format!("{} repositories collected", seen.len()));
        info!("collected {} repositories so far", seen.len());
    }

    info!(
        "finished collecting: {} unique repositories, out of an expected {}",
        seen.len(),
        bounds.total_results
    );

    let mut repos: Vec<Repository> = seen.into_values().collect();
    repos.sort_by(|a, b| {
        b.stargazers_count
            .cmp(&a.stargazers_count)
            .then(a.id.cmp(&b.id))
    });
    Ok(repos)
}

async fn collect_bucket<A: RepoSearch>(
    api: &mut A,
    query: &SearchQuery,
    seen: &mut HashMap<u64, Repository>,
) -> Result<()> {
    let mut query = query.clone();

    loop {
        let mut page = api.search_repositories(&query).await?;
        let total = page.total_count;
        info!(
            "ran request for '{}': {total} results",
            query.to_query_string()
        );

        let mut fetched = std::mem::take(&mut page.items);
        while let Some(next) = page.next.take() {
            page = api.fetch_page(&next).await?;
            fetched.append(&mut page.items);
        }

        // Known limitation: repositories sharing the cursor's exact push
        // instant are excluded by the strict inequality and may be missed.
        let oldest = fetched.iter().filter_map(|r| r.pushed_at).min();
        for repo in fetched {
            seen.insert(repo.id, repo);
        }

        if total <= RESULT_CAP {
            return Ok(());
        }
        match oldest {
            Some(cursor) => {
                warn!(
                    "bucket exceeds the {RESULT_CAP}-result cap ({total} reported), \
                     re-querying pushed before {cursor}"
                );
                query.pushed_before = Some(cursor);
            }
            None => {
                warn!("bucket overflows the result cap but carries no push timestamps, stopping");
                return Ok(());
            }
        }
    }
}

/// Extract the `rel="next"` target from a `Link` header value.
pub fn parse_next_link(link_header: &str) -> Option<String> {
    for part in link_header.split(',') {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|s| s.trim() == r#"rel="next""#);
        if is_next && target.starts_with('<') && target.ends_with('>') {
            return Some(target[1..target.len() - 1].to_string());
        }
    }
    None
}
