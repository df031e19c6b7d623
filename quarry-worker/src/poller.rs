//! Batch poller
//!
//! The top-level loop: fetch assigned batches from the coordinator and
//! dispatch them concurrently to the batch processor. Runs forever; the
//! only exits are process kill and startup failure upstream.
//!
//! Fetch-error handling:
//! - timeout: re-poll immediately
//! - sentinel "no batches" 404: one retry against the fallback port, whose
//!   batches (and submissions) then belong to that port for the cycle
//! - anything else: log, sleep the retry delay, re-poll from the primary

use anyhow::Result;
use quarry_client::{ClientError, CoordinatorClient};
use quarry_core::Batch;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::processor::BatchProcessor;

/// Poller that continuously fetches and dispatches batches
pub struct BatchPoller {
    config: Config,
    client: Arc<CoordinatorClient>,
    processor: Arc<BatchProcessor>,
    semaphore: Arc<Semaphore>,
}

impl BatchPoller {
    /// Creates a new poller
    ///
    /// In-flight batches are capped by `config.max_parallel_batches`; the
    /// cap throttles dispatch rather than dropping batches, so every batch
    /// the coordinator returns is still processed in its cycle.
    pub fn new(
        config: Config,
        client: Arc<CoordinatorClient>,
        processor: Arc<BatchProcessor>,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_parallel_batches));
        Self {
            config,
            client,
            processor,
            semaphore,
        }
    }

    /// Starts the polling loop
    pub async fn run(&self) -> Result<()> {
        info!(
            "starting batch poller against {}:{} (fallback port {})",
            self.config.coordinator_host, self.config.port, self.config.fallback_port
        );

        loop {
            let dispatched = self.poll_once().await;
            if dispatched > 0 {
                info!("processed {} batch(es) this cycle", dispatched);
            }
        }
    }

    /// Performs one poll cycle, including error pacing
    ///
    /// A timed-out fetch re-polls immediately; any other fetch failure
    /// sleeps the retry delay before the next cycle. Returns the number of
    /// batches dispatched.
    async fn poll_once(&self) -> usize {
        let (batches, port) = match self.fetch_cycle_batches().await {
            Ok(cycle) => cycle,
            Err(e) if e.is_timeout() => {
                warn!("timed out fetching batches: {}", e);
                return 0;
            }
            Err(e) => {
                error!("failed to fetch batches: {}", e);
                time::sleep(self.config.retry_delay).await;
                return 0;
            }
        };

        self.dispatch(batches, port).await
    }

    /// Fetches one cycle's batches, falling back to the secondary port
    ///
    /// Returns the batches together with the port that served them, so the
    /// cycle's submissions go back to the same coordinator instance.
    async fn fetch_cycle_batches(&self) -> Result<(Vec<Batch>, u16), ClientError> {
        match self
            .client
            .fetch_batches(self.config.port, self.config.fetch_timeout)
            .await
        {
            Ok(batches) => Ok((batches, self.config.port)),
            Err(e) if e.is_no_batches() => {
                info!(
                    "no batches available on port {}, trying port {}",
                    self.config.port, self.config.fallback_port
                );
                let batches = self
                    .client
                    .fetch_batches(self.config.fallback_port, self.config.fallback_fetch_timeout)
                    .await?;
                Ok((batches, self.config.fallback_port))
            }
            Err(e) => Err(e),
        }
    }

    /// Dispatches all fetched batches concurrently and waits for them
    async fn dispatch(&self, batches: Vec<Batch>, port: u16) -> usize {
        if batches.is_empty() {
            debug!("no batches this cycle");
            return 0;
        }

        info!("dispatching {} batch(es) from port {}", batches.len(), port);

        let mut handles = Vec::new();

        for batch in batches {
            // Throttles once max_parallel_batches tasks are in flight;
            // acquire only fails if the semaphore is closed, which it never is
            let Ok(permit) = Arc::clone(&self.semaphore).acquire_owned().await else {
                break;
            };

            let processor = Arc::clone(&self.processor);
            handles.push(tokio::spawn(async move {
                processor.process(batch, port).await;
                drop(permit);
            }));
        }

        let dispatched = handles.len();

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("batch task panicked: {}", e);
            }
        }

        dispatched
    }
}
