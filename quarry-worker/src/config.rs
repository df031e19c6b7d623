//! Worker configuration
//!
//! Defines all configurable parameters for the worker: coordinator
//! address and ports, compute binary location, artifact cache directory,
//! and concurrency settings.

use std::path::PathBuf;
use std::time::Duration;

/// Worker configuration
///
/// The fallback port is explicit rather than derived at the call site: the
/// stock deployment runs a second coordinator instance on `port - 1`, but
/// other deployments can point it anywhere.
#[derive(Debug, Clone)]
pub struct Config {
    /// Coordinator host (IP or hostname, no scheme)
    pub coordinator_host: String,

    /// Primary coordinator port
    pub port: u16,

    /// Port tried when the primary reports no batches available
    pub fallback_port: u16,

    /// Path to the compute binary invoked per batch
    pub worker_path: PathBuf,

    /// Directory artifacts are downloaded into
    pub download_dir: PathBuf,

    /// Worker-count hint passed to the compute binary (`--workers`)
    pub num_workers: u32,

    /// Self-identifying name sent as `User-Agent` on coordinator calls
    pub name: String,

    /// Max batches processed concurrently in one poll cycle
    pub max_parallel_batches: usize,

    /// Deadline for the primary batch-fetch call
    pub fetch_timeout: Duration,

    /// Deadline for the fallback batch-fetch call
    pub fallback_fetch_timeout: Duration,

    /// Sleep applied after a non-timeout fetch failure
    pub retry_delay: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(coordinator_host: String, worker_path: PathBuf) -> Self {
        let port = 5115;
        Self {
            coordinator_host,
            port,
            fallback_port: port - 1,
            worker_path,
            download_dir: PathBuf::from("wasms"),
            num_workers: 8,
            name: default_name(),
            max_parallel_batches: 8,
            fetch_timeout: Duration::from_secs(5),
            fallback_fetch_timeout: Duration::from_secs(10),
            retry_delay: Duration::from_secs(2),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.coordinator_host.is_empty() {
            anyhow::bail!("coordinator_host cannot be empty");
        }

        if self.coordinator_host.contains("://") {
            anyhow::bail!("coordinator_host must be a bare host, without a scheme");
        }

        if self.port == 0 || self.fallback_port == 0 {
            anyhow::bail!("coordinator ports must be nonzero");
        }

        if self.name.is_empty() {
            anyhow::bail!("worker name cannot be empty");
        }

        if self.num_workers == 0 {
            anyhow::bail!("num_workers must be greater than 0");
        }

        if self.max_parallel_batches == 0 {
            anyhow::bail!("max_parallel_batches must be greater than 0");
        }

        if self.fetch_timeout.is_zero() || self.fallback_fetch_timeout.is_zero() {
            anyhow::bail!("fetch timeouts must be greater than 0");
        }

        Ok(())
    }
}

/// Generated name used when the operator does not pick one
pub fn default_name() -> String {
    format!("worker-{}", uuid::Uuid::new_v4())
}
