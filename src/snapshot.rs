use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::models::Repository;

/// Write one timestamp-named JSON snapshot, returning its path.
pub async fn write_snapshot<T: Serialize>(dir: &Path, prefix: &str, payload: &T) -> Result<PathBuf> {
    let stamp = Utc::now().format("%Y%m%d-%H%M%S");
    let path = dir.join(format!("{prefix}-{stamp}.json"));
    let bytes = serde_json::to_vec_pretty(payload)?;
    tokio::fs::write(&path, bytes).await?;
    info!("wrote snapshot {}", path.display());
    Ok(path)
}

/// Load a previously written `all-repos` snapshot to re-enter the pipeline
/// at the content phase.
pub async fn read_repositories(path: &Path) -> Result<Vec<Repository>> {
    let bytes = tokio::fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
