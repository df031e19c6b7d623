//! Batch domain types
//!
//! A batch is one unit of assigned work: a slice of the nonce search space
//! for a given benchmark, plus everything the compute binary needs to run it
//! (algorithm settings, runtime limits, artifact location).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A unit of work assigned by the coordinator
///
/// Received as-is from the fetch-batches call and never mutated; the worker
/// processes it once and drops it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub benchmark_id: String,
    pub start_nonce: u64,
    pub num_nonces: u64,
    pub batch_size: u64,
    pub rand_hash: String,
    pub settings: BatchSettings,
    /// Where to fetch the algorithm artifact if it is not cached yet
    pub download_url: String,
    /// Nonce indices the coordinator wants individual proofs for
    #[serde(default)]
    pub sampled_nonces: Vec<u64>,
    pub runtime_config: RuntimeConfig,
}

/// Algorithm settings payload
///
/// Only `algorithm_id` is interpreted (it keys the artifact cache); the rest
/// is opaque to the worker and is handed to the compute binary verbatim,
/// which is why the remainder is kept as flattened JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    pub algorithm_id: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, JsonValue>,
}

/// Resource limits passed through to the compute binary
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub max_memory: u64,
    pub max_fuel: u64,
}

impl Batch {
    /// Composite identifier used in log lines and the result-submission path
    pub fn id(&self) -> String {
        format!("{}_{}", self.benchmark_id, self.start_nonce)
    }
}
