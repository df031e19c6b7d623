//! Batch-related API endpoints

use crate::CoordinatorClient;
use crate::error::{ClientError, Result};
use quarry_core::Batch;
use reqwest::header::USER_AGENT;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

/// Exact body the coordinator sends with its empty-queue 404
const NO_BATCHES_SENTINEL: &str = "No batches available";

impl CoordinatorClient {
    /// Fetch the batches currently assigned to this worker
    ///
    /// # Arguments
    /// * `port` - Coordinator port to query (primary or fallback)
    /// * `timeout` - Per-request deadline; an elapsed deadline surfaces as a
    ///   `RequestFailed` whose `is_timeout()` is true
    ///
    /// # Returns
    /// The batch descriptors assigned to this worker, possibly empty.
    /// A 404 whose body is exactly the "No batches available" sentinel maps
    /// to [`ClientError::NoBatches`] so the caller can distinguish "try the
    /// fallback port" from a real failure.
    pub async fn fetch_batches(&self, port: u16, timeout: Duration) -> Result<Vec<Batch>> {
        let url = self.url(port, "/get-batches");
        debug!("fetching batches from {}", url);

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, &self.name)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            let text = response.text().await.unwrap_or_default();
            if text.trim() == NO_BATCHES_SENTINEL {
                return Err(ClientError::NoBatches);
            }
            return Err(ClientError::api_error(status.as_u16(), text));
        }

        self.handle_response(response).await
    }

    /// Submit a compute result for one batch
    ///
    /// The result is posted verbatim; this client never inspects it.
    ///
    /// # Arguments
    /// * `port` - The port that served this cycle's batches
    /// * `batch_id` - Composite batch identifier (`benchmark_id_start_nonce`)
    /// * `result` - JSON result emitted by the compute binary
    pub async fn submit_result(
        &self,
        port: u16,
        batch_id: &str,
        result: &JsonValue,
    ) -> Result<()> {
        let url = self.url(port, &format!("/submit-batch-result/{}", batch_id));
        debug!("posting result to {}", url);

        let response = self
            .client
            .post(&url)
            .header(USER_AGENT, &self.name)
            .json(result)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}
