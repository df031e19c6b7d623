//! Batch processor
//!
//! Drives one batch through its whole life: resolve the artifact, run the
//! compute binary, submit the result. Any failure is logged with the batch
//! id and swallowed so sibling batches and the next poll cycle are never
//! affected.

use anyhow::{Context, Result};
use quarry_client::CoordinatorClient;
use quarry_core::Batch;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::cache::ArtifactCache;
use crate::invoker::ComputeInvoker;

/// Processes independent batches against a shared client and cache
pub struct BatchProcessor {
    client: Arc<CoordinatorClient>,
    cache: Arc<ArtifactCache>,
    invoker: ComputeInvoker,
}

impl BatchProcessor {
    pub fn new(
        client: Arc<CoordinatorClient>,
        cache: Arc<ArtifactCache>,
        invoker: ComputeInvoker,
    ) -> Self {
        Self {
            client,
            cache,
            invoker,
        }
    }

    /// Processes one batch, isolating its failures
    ///
    /// `port` is whichever coordinator port served this cycle's batches;
    /// the result goes back to the same instance. A failed batch is only
    /// logged: it is never retried and never reported to the coordinator.
    pub async fn process(&self, batch: Batch, port: u16) {
        let batch_id = batch.id();

        if let Err(e) = self.try_process(&batch, port).await {
            error!("error processing batch {}: {:#}", batch_id, e);
        }
    }

    async fn try_process(&self, batch: &Batch, port: u16) -> Result<()> {
        let batch_id = batch.id();
        info!("processing batch {}", batch_id);

        let artifact_path = self
            .cache
            .ensure(&batch.settings.algorithm_id, &batch.download_url)
            .await
            .context("failed to resolve artifact")?;

        let result = self.invoker.run(batch, &artifact_path).await?;

        let start = Instant::now();
        self.client
            .submit_result(port, &batch_id, &result)
            .await
            .context("failed to submit result")?;
        debug!("posting result took {}ms", start.elapsed().as_millis());

        info!("batch {} submitted", batch_id);
        Ok(())
    }
}
