//! Quarry Worker
//!
//! A thin worker client for a batch-computation coordinator.
//!
//! Architecture:
//! - Configuration: CLI arguments with environment-variable overrides
//! - Client: HTTP communication with the coordinator (quarry-client)
//! - Cache: at-most-once artifact downloads keyed by algorithm id
//! - Invoker: runs the external compute binary per batch
//! - Poller: fetch/dispatch loop with fallback-port handling
//!
//! The worker polls the coordinator for assigned batches, shells out to the
//! compute binary for the heavy work, and posts each JSON result back.

mod cache;
mod config;
mod invoker;
mod poller;
mod processor;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cache::{ArtifactCache, prepare_cache_dir};
use crate::config::Config;
use crate::invoker::ComputeInvoker;
use crate::poller::BatchPoller;
use crate::processor::BatchProcessor;
use quarry_client::CoordinatorClient;

#[derive(Parser)]
#[command(name = "quarry-worker")]
#[command(about = "Batch worker for a Quarry coordinator", long_about = None)]
struct Cli {
    /// Coordinator host (IP or hostname)
    coordinator_host: String,

    /// Path to the compute binary
    worker_path: PathBuf,

    /// Primary coordinator port
    #[arg(long, env = "QUARRY_PORT", default_value_t = 5115)]
    port: u16,

    /// Port tried when the primary has no batches (default: port - 1)
    #[arg(long, env = "QUARRY_FALLBACK_PORT")]
    fallback_port: Option<u16>,

    /// Folder to download artifacts to
    #[arg(long, default_value = "wasms")]
    download: PathBuf,

    /// Worker-count hint passed to the compute binary
    #[arg(long, default_value_t = 8)]
    workers: u32,

    /// Self-identifying worker name (default: generated)
    #[arg(long)]
    name: Option<String>,

    /// Max concurrently processed batches
    #[arg(long, default_value_t = 8)]
    max_parallel: usize,

    /// Print debug logs
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::new(self.coordinator_host, self.worker_path);
        config.port = self.port;
        config.fallback_port = self.fallback_port.unwrap_or(self.port.saturating_sub(1));
        config.download_dir = self.download;
        config.num_workers = self.workers;
        config.max_parallel_batches = self.max_parallel;
        if let Some(name) = self.name {
            config.name = name;
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "quarry_worker=debug,quarry_client=debug"
    } else {
        "quarry_worker=info,quarry_client=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Quarry Worker");

    let config = cli.into_config();
    config.validate()?;
    info!(
        "Loaded configuration: name={}, coordinator={}:{} (fallback {})",
        config.name, config.coordinator_host, config.port, config.fallback_port
    );

    // Startup-fatal: the compute binary must exist before the loop begins
    if !config.worker_path.exists() {
        anyhow::bail!(
            "compute binary not found at path: {}",
            config.worker_path.display()
        );
    }

    prepare_cache_dir(&config.download_dir)
        .context("failed to prepare artifact cache directory")?;

    let client = Arc::new(CoordinatorClient::new(
        config.coordinator_host.clone(),
        config.name.clone(),
    ));
    info!("Coordinator client initialized");

    let cache = Arc::new(ArtifactCache::new(
        config.download_dir.clone(),
        Arc::clone(&client),
    ));
    let invoker = ComputeInvoker::new(config.worker_path.clone(), config.num_workers);
    let processor = Arc::new(BatchProcessor::new(Arc::clone(&client), cache, invoker));

    let poller = BatchPoller::new(config.clone(), client, processor);

    info!(
        "Worker initialized (fetch timeout: {:?}, max parallel batches: {})",
        config.fetch_timeout, config.max_parallel_batches
    );

    if let Err(e) = poller.run().await {
        error!("Poller error: {}", e);
        return Err(e);
    }

    Ok(())
}
