use async_trait::async_trait;
use reqwest::header::LINK;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use tracing::info;

use crate::collector::{parse_next_link, RepoSearch};
use crate::content::ContentSearch;
use crate::error::{HarvestError, Result};
use crate::models::{BlobContent, CodeSearchResults, Repository, SearchPage};
use crate::partition::{RepoCounter, SearchBounds, RESULT_CAP};
use crate::query::SearchQuery;
use crate::rate_limit::{RateLimitedClient, BLOB_THRESHOLD, SEARCH_THRESHOLD};

const API_ROOT: &str = "https://api.github.com";
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "github-repo-harvesting";
const PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: u64,
    items: Vec<Repository>,
}

/// Live adapter for the GitHub API. Search-class and blob-class calls run
/// through separate rate-limited callers because the platform accounts them
/// against separate quotas.
pub struct GitHubClient {
    token: String,
    search: RateLimitedClient,
    blob: RateLimitedClient,
}

impl GitHubClient {
    pub fn new(token: String) -> Result<Self> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(GitHubClient {
            token,
            search: RateLimitedClient::new(http.clone(), SEARCH_THRESHOLD),
            blob: RateLimitedClient::new(http, BLOB_THRESHOLD),
        })
    }

    fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Accept", ACCEPT)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// One exploratory query, sorted by stars, to size the result space.
    pub async fn search_bounds(&mut self, query: &SearchQuery) -> Result<SearchBounds> {
        let request = self
            .decorate(self.search.get(&format!("{API_ROOT}/search/repositories")))
            .query(&[
                ("q", query.to_query_string()),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", "1".to_string()),
            ]);
        let response = self.search.call(request).await?;
        let body: SearchResponse = response.json().await?;

        let most_starred = body
            .items
            .first()
            .ok_or_else(|| HarvestError::EmptySearch(query.to_query_string()))?;
        let bounds = SearchBounds::derive(
            body.total_count,
            most_starred.stargazers_count,
            RESULT_CAP,
        );
        info!(
            "initial search: {} results, splitting into {} buckets sized [{}..{}], \
             most starred has {} stars",
            bounds.total_results,
            bounds.buckets,
            bounds.min_bucket_size,
            bounds.max_bucket_size,
            bounds.max_stars
        );
        Ok(bounds)
    }

    async fn search_call(&mut self, request: RequestBuilder) -> Result<SearchPage> {
        let response = self.search.call(request).await?;
        let next = next_page(&response);
        let body: SearchResponse = response.json().await?;
        Ok(SearchPage {
            total_count: body.total_count,
            items: body.items,
            next,
        })
    }
}

fn next_page(response: &Response) -> Option<String> {
    response
        .headers()
        .get(LINK)?
        .to_str()
        .ok()
        .and_then(parse_next_link)
}

#[async_trait]
impl RepoCounter for GitHubClient {
    async fn count(&mut self, query: &SearchQuery) -> Result<u64> {
        let request = self
            .decorate(self.search.get(&format!("{API_ROOT}/search/repositories")))
            .query(&[
                ("q", query.to_query_string()),
                ("per_page", "1".to_string()),
            ]);
        let response = self.search.call(request).await?;
        let body: SearchResponse = response.json().await?;
        Ok(body.total_count)
    }
}

#[async_trait]
impl RepoSearch for GitHubClient {
    async fn search_repositories(&mut self, query: &SearchQuery) -> Result<SearchPage> {
        let request = self
            .decorate(self.search.get(&format!("{API_ROOT}/search/repositories")))
            .query(&[
                ("q", query.to_query_string()),
                ("sort", "updated".to_string()),
                ("order", "desc".to_string()),
                ("per_page", PER_PAGE.to_string()),
            ]);
        self.search_call(request).await
    }

    async fn fetch_page(&mut self, url: &str) -> Result<SearchPage> {
        let request = self.decorate(self.search.get(url));
        self.search_call(request).await
    }
}

#[async_trait]
impl ContentSearch for GitHubClient {
    async fn search_code(
        &mut self,
        repository: &str,
        filename: &str,
    ) -> Result<CodeSearchResults> {
        let request = self
            .decorate(self.search.get(&format!("{API_ROOT}/search/code")))
            .query(&[
                ("q", format!("filename:{filename} repo:{repository}")),
                ("per_page", PER_PAGE.to_string()),
            ]);
        let response = self.search.call(request).await?;
        Ok(response.json().await?)
    }

    async fn fetch_blob(&mut self, location: &str) -> Result<BlobContent> {
        let request = self.decorate(self.blob.get(location));
        let response = self.blob.call(request).await?;
        Ok(response.json().await?)
    }
}
