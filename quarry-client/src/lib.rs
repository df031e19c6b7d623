//! Quarry HTTP Client
//!
//! A small, type-safe HTTP client for communicating with the batch
//! coordinator.
//!
//! All coordinator calls carry the worker's self-chosen name as the
//! `User-Agent` header so the coordinator can attribute work. The client
//! wraps one long-lived `reqwest::Client`, which is cheap to clone and safe
//! to share across concurrently processed batches.
//!
//! # Example
//!
//! ```no_run
//! use quarry_client::CoordinatorClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), quarry_client::ClientError> {
//!     let client = CoordinatorClient::new("192.168.1.10", "eager-otter");
//!
//!     let batches = client.fetch_batches(5115, Duration::from_secs(5)).await?;
//!     println!("got {} batches", batches.len());
//!     Ok(())
//! }
//! ```

mod artifacts;
mod batches;
pub mod error;

pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the batch coordinator API
///
/// Ports are passed per call rather than baked into a base URL: the poll
/// loop may fall back to a secondary coordinator instance on another port
/// mid-cycle, and result submissions must follow whichever port served the
/// batches.
#[derive(Debug, Clone)]
pub struct CoordinatorClient {
    /// Coordinator host (IP or hostname, no scheme, no port)
    host: String,
    /// Worker's self-identifying name, sent as `User-Agent`
    name: String,
    /// HTTP client instance
    client: Client,
}

impl CoordinatorClient {
    /// Create a new coordinator client
    ///
    /// # Arguments
    /// * `host` - Coordinator host, e.g. "192.168.1.10"
    /// * `name` - Worker name attached to every coordinator call
    pub fn new(host: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
            client: Client::new(),
        }
    }

    /// Create a coordinator client with a custom HTTP client
    ///
    /// This allows configuring proxies, TLS settings, connection pools, etc.
    pub fn with_client(
        host: impl Into<String>,
        name: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
            client,
        }
    }

    /// The coordinator host this client talks to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The worker name sent with every coordinator call
    pub fn name(&self) -> &str {
        &self.name
    }

    fn url(&self, port: u16, path: &str) -> String {
        format!("http://{}:{}{}", self.host, port, path)
    }

    // =============================================================================
    // Response handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("failed to parse JSON response: {}", e)))
    }

    /// Check the status code of a response whose body we do not consume
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
