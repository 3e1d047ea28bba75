
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

use crate::VectorPipeError;

/// Snapshot of one vector as written to the index, persisted locally for
/// offline recovery and auditing independent of the remote index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedVector {
    pub vector_db_id: String,
    pub values: Vec<f32>,
    pub metadata: serde_json::Value,
}

/// Write a document's vector snapshot under `cache_dir/filename`,
/// overwriting any previous snapshot for the same document.
#[inline]
pub async fn store_vector_cache(
    cache_dir: &Path,
    filename: &str,
    entries: &[CachedVector],
) -> Result<PathBuf, VectorPipeError> {
    fs::create_dir_all(cache_dir).await.map_err(|e| {
        VectorPipeError::Storage(format!(
            "Failed to create cache directory {}: {}",
            cache_dir.display(),
            e
        ))
    })?;

    let path = cache_dir.join(filename);
    let content = serde_json::to_vec_pretty(entries)
        .map_err(|e| VectorPipeError::Storage(format!("Failed to serialize cache entries: {}", e)))?;

    fs::write(&path, content).await.map_err(|e| {
        VectorPipeError::Storage(format!("Failed to write cache file {}: {}", path.display(), e))
    })?;

    info!("Cached {} vectors to {}", entries.len(), path.display());
    Ok(path)
}

/// Read a previously stored snapshot back.
#[inline]
pub async fn load_vector_cache(
    cache_dir: &Path,
    filename: &str,
) -> Result<Vec<CachedVector>, VectorPipeError> {
    let path = cache_dir.join(filename);

    let content = fs::read(&path).await.map_err(|e| {
        VectorPipeError::Storage(format!("Failed to read cache file {}: {}", path.display(), e))
    })?;

    let entries: Vec<CachedVector> = serde_json::from_slice(&content).map_err(|e| {
        VectorPipeError::Storage(format!("Failed to parse cache file {}: {}", path.display(), e))
    })?;

    debug!("Loaded {} cached vectors from {}", entries.len(), path.display());
    Ok(entries)
}
