//! End-to-end engine scenarios against an in-memory GitHub stand-in that
//! reproduces the platform's search behavior: 1000-result cap, 100-item
//! pages with opaque continuations, pushed-time filtering, and base64 blob
//! transport.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use indicatif::ProgressBar;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use github_repo_harvesting_lib::collector::{collect_repositories, RepoSearch};
use github_repo_harvesting_lib::content::{collect_config_files, ContentSearch, PausePolicy};
use github_repo_harvesting_lib::error::Result;
use github_repo_harvesting_lib::models::{
    BlobContent, CodeMatch, CodeSearchResults, Repository, SearchPage,
};
use github_repo_harvesting_lib::partition::{
    compute_delimiters, RepoCounter, SearchBounds, RESULT_CAP,
};
use github_repo_harvesting_lib::query::SearchQuery;

const PAGE_SIZE: usize = 100;

fn repo(id: u64, stars: u64, seq: i64) -> Repository {
    Repository {
        id,
        name: format!("repo-{id}"),
        full_name: format!("acme/repo-{id}"),
        html_url: format!("https://github.com/acme/repo-{id}"),
        stargazers_count: stars,
        pushed_at: Some(
            Utc.with_ymd_and_hms(2019, 11, 1, 0, 0, 0).unwrap() + ChronoDuration::seconds(seq),
        ),
    }
}

struct FakeGitHub {
    repos: Vec<Repository>,
    pending: Vec<Vec<Repository>>,
    current_total: u64,
    files: HashMap<u64, Vec<&'static str>>,
    /// When set, the second page re-emits an already served repository, the
    /// way overlapping cursor rounds can.
    duplicate_glitch: bool,
}

impl FakeGitHub {
    fn new(repos: Vec<Repository>) -> Self {
        FakeGitHub {
            repos,
            pending: Vec::new(),
            current_total: 0,
            files: HashMap::new(),
            duplicate_glitch: false,
        }
    }

    fn matching(&self, query: &SearchQuery) -> Vec<Repository> {
        let mut matches: Vec<Repository> = self
            .repos
            .iter()
            .filter(|r| match query.stars {
                Some(range) => {
                    r.stargazers_count >= range.from && r.stargazers_count <= range.to
                }
                None => true,
            })
            .filter(|r| match query.pushed_before {
                Some(cursor) => r.pushed_at.is_some_and(|t| t < cursor),
                None => true,
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.pushed_at.cmp(&a.pushed_at));
        matches
    }

    fn next_token(&self) -> Option<String> {
        if self.pending.is_empty() {
            None
        } else {
            Some(format!("fake://page/{}", self.pending.len()))
        }
    }
}

#[async_trait]
impl RepoCounter for FakeGitHub {
    async fn count(&mut self, query: &SearchQuery) -> Result<u64> {
        Ok(self.matching(query).len() as u64)
    }
}

#[async_trait]
impl RepoSearch for FakeGitHub {
    async fn search_repositories(&mut self, query: &SearchQuery) -> Result<SearchPage> {
        let matches = self.matching(query);
        self.current_total = matches.len() as u64;

        let mut served: Vec<Repository> =
            matches.into_iter().take(RESULT_CAP as usize).collect();
        if self.duplicate_glitch && served.len() > PAGE_SIZE {
            let dup = served[0].clone();
            served.insert(PAGE_SIZE, dup);
        }

        let mut pages: Vec<Vec<Repository>> =
            served.chunks(PAGE_SIZE).map(|c| c.to_vec()).collect();
        let first = if pages.is_empty() {
            Vec::new()
        } else {
            pages.remove(0)
        };
        self.pending = pages;

        Ok(SearchPage {
            total_count: self.current_total,
            items: first,
            next: self.next_token(),
        })
    }

    async fn fetch_page(&mut self, _url: &str) -> Result<SearchPage> {
        let items = if self.pending.is_empty() {
            Vec::new()
        } else {
            self.pending.remove(0)
        };
        Ok(SearchPage {
            total_count: self.current_total,
            items,
            next: self.next_token(),
        })
    }
}

#[async_trait]
impl ContentSearch for FakeGitHub {
    async fn search_code(
        &mut self,
        repository: &str,
        _filename: &str,
    ) -> Result<CodeSearchResults> {
        let repo = self
            .repos
            .iter()
            .find(|r| r.full_name == repository)
            .expect("content search against unknown repository");
        let files = self.files.get(&repo.id).cloned().unwrap_or_default();
        Ok(CodeSearchResults {
            total_count: files.len() as u64,
            items: (0..files.len())
                .map(|i| CodeMatch {
                    git_url: format!("fake://blob/{}/{}", repo.id, i),
                })
                .collect(),
        })
    }

    async fn fetch_blob(&mut self, location: &str) -> Result<BlobContent> {
        let rest = location.strip_prefix("fake://blob/").expect("fake blob url");
        let (id, index) = rest.split_once('/').expect("fake blob url shape");
        let id: u64 = id.parse().unwrap();
        let index: usize = index.parse().unwrap();
        let text = self.files[&id][index];

        let mut encoded = BASE64.encode(text.as_bytes());
        if encoded.len() > 4 {
            encoded.insert(4, '\n');
        }
        Ok(BlobContent {
            content: encoded,
            encoding: "base64".to_string(),
        })
    }
}

#[tokio::test]
async fn uniform_corpus_is_enumerated_exhaustively() {
    // 25 repositories on every star value 1..=100.
    let repos: Vec<Repository> = (1..=2500u64)
        .map(|id| repo(id, (id - 1) % 100 + 1, id as i64))
        .collect();
    let mut fake = FakeGitHub::new(repos);
    let bounds = SearchBounds::derive(2500, 100, RESULT_CAP);
    let base = SearchQuery::new("serverless", "js");

    let delimiters = compute_delimiters(&mut fake, &bounds, &base).await.unwrap();
    assert_eq!(*delimiters.first().unwrap(), 0);
    assert_eq!(*delimiters.last().unwrap(), 101);
    assert!(delimiters.windows(2).all(|w| w[0] < w[1]));

    let collected =
        collect_repositories(&mut fake, &base, &delimiters, &bounds, &ProgressBar::hidden())
            .await
            .unwrap();

    assert_eq!(collected.len(), 2500);
    let ids: HashSet<u64> = collected.iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), 2500);
}

#[tokio::test]
async fn overflow_bucket_is_drained_without_loss_or_duplication() {
    // 1500 repositories share exactly 42 stars: no star-only split can break
    // that bucket under the cap, so collection must drain it with the
    // pushed-time cursor. Every pushed_at is unique.
    let mut repos = Vec::new();
    for id in 1..=900u64 {
        repos.push(repo(id, 10, id as i64));
    }
    for id in 901..=2400u64 {
        repos.push(repo(id, 42, id as i64));
    }
    let mut fake = FakeGitHub::new(repos);
    let bounds = SearchBounds::derive(2400, 42, RESULT_CAP);
    let base = SearchQuery::new("serverless", "js");

    let delimiters = compute_delimiters(&mut fake, &bounds, &base).await.unwrap();
    let collected =
        collect_repositories(&mut fake, &base, &delimiters, &bounds, &ProgressBar::hidden())
            .await
            .unwrap();

    assert_eq!(collected.len(), 2400);
    let ids: HashSet<u64> = collected.iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), 2400);
    assert_eq!(
        collected
            .iter()
            .filter(|r| r.stargazers_count == 42)
            .count(),
        1500
    );
}

#[tokio::test]
async fn repeated_identifiers_are_collected_once() {
    let repos: Vec<Repository> = (1..=150u64).map(|id| repo(id, 5, id as i64)).collect();
    let mut fake = FakeGitHub::new(repos);
    fake.duplicate_glitch = true;
    let bounds = SearchBounds::derive(150, 5, RESULT_CAP);
    let base = SearchQuery::new("serverless", "js");
    let delimiters = vec![0, 6];

    let collected =
        collect_repositories(&mut fake, &base, &delimiters, &bounds, &ProgressBar::hidden())
            .await
            .unwrap();

    assert_eq!(collected.len(), 150);
    let ids: HashSet<u64> = collected.iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), 150);
}

#[tokio::test]
async fn content_phase_keeps_only_matching_repositories_in_order() {
    let repos = vec![repo(1, 5, 1), repo(2, 6, 2), repo(3, 7, 3)];
    let mut fake = FakeGitHub::new(repos.clone());
    fake.files
        .insert(1, vec!["service: one\nprovider:\n  name: aws", "service: one-nested"]);
    fake.files.insert(3, vec!["service: three"]);

    let pause = PausePolicy {
        every: 0,
        duration: Duration::ZERO,
    };
    let (matched, mappings) =
        collect_config_files(&mut fake, &repos, "serverless.yml", pause, &ProgressBar::hidden())
            .await
            .unwrap();

    // Zero-match repository 2 is absent; both of repository 1's files come
    // back decoded, in the order the content search returned them.
    let matched_ids: Vec<u64> = matched.iter().map(|r| r.id).collect();
    assert_eq!(matched_ids, vec![1, 3]);
    assert_eq!(mappings.len(), 2);
    assert_eq!(mappings[0].id, 1);
    assert_eq!(
        mappings[0].files,
        vec!["service: one\nprovider:\n  name: aws", "service: one-nested"]
    );
    assert_eq!(mappings[1].id, 3);
    assert_eq!(mappings[1].files, vec!["service: three"]);
}
