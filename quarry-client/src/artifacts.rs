//! Artifact download endpoint

use crate::CoordinatorClient;
use crate::error::{ClientError, Result};
use tracing::debug;

impl CoordinatorClient {
    /// Download an algorithm artifact from its per-batch URL
    ///
    /// The URL is opaque and supplied by the coordinator inside each batch
    /// descriptor; it usually points at a separate artifact repository, so
    /// no worker identification is attached.
    ///
    /// # Returns
    /// The raw artifact bytes. A non-200 response is an `ApiError` carrying
    /// the status and body text.
    pub async fn download_artifact(&self, url: &str) -> Result<Vec<u8>> {
        debug!("downloading artifact from {}", url);

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
