//! Artifact cache
//!
//! Guarantees that the wasm artifact for an algorithm exists on disk before
//! the compute binary is pointed at it. Presence on disk is sufficient:
//! artifacts are keyed by algorithm id and never change, so there is no
//! checksum and no invalidation within a run.

use anyhow::{Context, Result};
use quarry_client::CoordinatorClient;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Downloads artifacts at most once per algorithm id
///
/// Concurrent batches routinely reference the same algorithm; a per-key
/// async mutex makes the first caller download while the rest wait and then
/// hit the existence check.
pub struct ArtifactCache {
    dir: PathBuf,
    client: Arc<CoordinatorClient>,

    /// One lock per algorithm id, created on first reference
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ArtifactCache {
    /// Creates a cache rooted at `dir`
    ///
    /// The directory itself is created once at startup by the caller.
    pub fn new(dir: PathBuf, client: Arc<CoordinatorClient>) -> Self {
        Self {
            dir,
            client,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Local path an algorithm's artifact is cached at
    pub fn path_for(&self, algorithm_id: &str) -> PathBuf {
        self.dir.join(format!("{}.wasm", algorithm_id))
    }

    /// Ensures the artifact for `algorithm_id` exists locally
    ///
    /// Returns the cached path. If the file is already present no network
    /// access occurs; otherwise the bytes are fetched from `download_url`
    /// and written as a whole file.
    pub async fn ensure(&self, algorithm_id: &str, download_url: &str) -> Result<PathBuf> {
        let path = self.path_for(algorithm_id);

        if path.exists() {
            debug!("artifact path: {}", path.display());
            return Ok(path);
        }

        let lock = self.lock_for(algorithm_id).await;
        let _guard = lock.lock().await;

        // Another batch may have finished the download while we waited
        if path.exists() {
            debug!("artifact path: {}", path.display());
            return Ok(path);
        }

        let start = Instant::now();
        info!("downloading artifact from {}", download_url);

        let bytes = self
            .client
            .download_artifact(download_url)
            .await
            .with_context(|| format!("failed to download artifact for {}", algorithm_id))?;

        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write artifact to {}", path.display()))?;

        debug!(
            "downloading artifact took {}ms ({} bytes)",
            start.elapsed().as_millis(),
            bytes.len()
        );
        debug!("artifact path: {}", path.display());

        Ok(path)
    }

    async fn lock_for(&self, algorithm_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(
            locks
                .entry(algorithm_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }
}

/// Startup helper: creates the cache directory if it does not exist
pub fn prepare_cache_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create download directory {}", dir.display()))
}
