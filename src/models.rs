use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A repository as returned by the search API. Only the fields the pipeline
/// reads are kept; everything else in the response is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub stargazers_count: u64,
    /// Last push time. Absent for repositories that were created but never
    /// pushed to, which the overflow cursor has to tolerate.
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

/// One page of repository search results, with the opaque continuation the
/// platform hands back for the next page (already extracted from the `Link`
/// header by the boundary adapter).
#[derive(Debug, Clone)]
pub struct SearchPage {
    pub total_count: u64,
    pub items: Vec<Repository>,
    pub next: Option<String>,
}

/// A single code-search hit: the opaque location of the matched blob.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeMatch {
    pub git_url: String,
}

/// Result of a code search scoped to one repository.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeSearchResults {
    pub total_count: u64,
    pub items: Vec<CodeMatch>,
}

/// Raw blob payload in its transport encoding.
#[derive(Debug, Clone, Deserialize)]
pub struct BlobContent {
    pub content: String,
    pub encoding: String,
}

/// The decoded configuration files found in one repository, in the order the
/// content search returned them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMatch {
    pub id: u64,
    pub files: Vec<String>,
}
