use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("GitHub token is required (pass --token or set GITHUB_TOKEN)")]
    MissingToken,

    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("giving up after {attempts} failed attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("search returned no repositories for query '{0}'")]
    EmptySearch(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("cannot decode blob content: {0}")]
    Decode(String),

    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
