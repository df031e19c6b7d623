//! Compute invoker
//!
//! Runs the external compute binary for one batch:
//! - Fixed positional-plus-flag argument contract
//! - stdout captured and parsed as one JSON value on success
//! - stderr carried in the error on nonzero exit
//!
//! No timeout is imposed here; the binary's own fuel limit bounds the work.

use anyhow::{Context, Result};
use quarry_core::Batch;
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::process::Command;
use tracing::{debug, info};

/// Invokes the compute binary with the per-batch argument contract
#[derive(Debug, Clone)]
pub struct ComputeInvoker {
    worker_path: PathBuf,
    num_workers: u32,
}

/// Builds the full argument list for one batch
///
/// Layout: `compute_batch <settings-json> <rand_hash> <start_nonce>
/// <num_nonces> <batch_size> <artifact> --mem N --fuel N --workers N`,
/// with `--sampled n1 n2 ...` appended only when the batch carries sampled
/// nonces.
pub fn build_args(batch: &Batch, artifact_path: &Path, num_workers: u32) -> Result<Vec<String>> {
    let settings =
        serde_json::to_string(&batch.settings).context("failed to serialize batch settings")?;

    let mut args = vec![
        "compute_batch".to_string(),
        settings,
        batch.rand_hash.clone(),
        batch.start_nonce.to_string(),
        batch.num_nonces.to_string(),
        batch.batch_size.to_string(),
        artifact_path.to_string_lossy().into_owned(),
        "--mem".to_string(),
        batch.runtime_config.max_memory.to_string(),
        "--fuel".to_string(),
        batch.runtime_config.max_fuel.to_string(),
        "--workers".to_string(),
        num_workers.to_string(),
    ];

    if !batch.sampled_nonces.is_empty() {
        args.push("--sampled".to_string());
        args.extend(batch.sampled_nonces.iter().map(|n| n.to_string()));
    }

    Ok(args)
}

impl ComputeInvoker {
    pub fn new(worker_path: PathBuf, num_workers: u32) -> Self {
        Self {
            worker_path,
            num_workers,
        }
    }

    /// Runs the compute binary for `batch` against a cached artifact
    ///
    /// # Returns
    /// The JSON value the binary printed on stdout. Nonzero exit is an
    /// error carrying the captured stderr; unparseable stdout is an error
    /// even on exit 0.
    pub async fn run(&self, batch: &Batch, artifact_path: &Path) -> Result<JsonValue> {
        let start = Instant::now();
        let args = build_args(batch, artifact_path, self.num_workers)?;

        info!(
            "computing batch: {} {}",
            self.worker_path.display(),
            args.join(" ")
        );

        let output = Command::new(&self.worker_path)
            .args(&args)
            .output()
            .await
            .with_context(|| {
                format!("failed to spawn compute binary {}", self.worker_path.display())
            })?;

        if !output.status.success() {
            anyhow::bail!(
                "compute binary failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let result: JsonValue = serde_json::from_slice(&output.stdout)
            .context("compute binary emitted malformed JSON on stdout")?;

        info!("computing batch took {}ms", start.elapsed().as_millis());
        debug!("batch result: {}", result);

        Ok(result)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use quarry_core::{BatchSettings, RuntimeConfig};

    pub(crate) fn test_batch(sampled_nonces: Vec<u64>) -> Batch {
        Batch {
            benchmark_id: "bench1".to_string(),
            start_nonce: 1000,
            num_nonces: 250,
            batch_size: 256,
            rand_hash: "cafebabe".to_string(),
            settings: BatchSettings {
                algorithm_id: "c001_a001".to_string(),
                extra: serde_json::Map::new(),
            },
            download_url: "http://repo.example/c001_a001.wasm".to_string(),
            sampled_nonces,
            runtime_config: RuntimeConfig {
                max_memory: 1_000_000,
                max_fuel: 2_000_000,
            },
        }
    }

    /// Writes an executable shell script and returns its path
    pub(crate) fn stub_binary(body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = std::env::temp_dir().join(format!("quarry-stub-{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn args_follow_the_fixed_layout() {
        let batch = test_batch(vec![]);
        let args = build_args(&batch, Path::new("/tmp/c001_a001.wasm"), 4).unwrap();

        assert_eq!(
            args,
            vec![
                "compute_batch",
                r#"{"algorithm_id":"c001_a001"}"#,
                "cafebabe",
                "1000",
                "250",
                "256",
                "/tmp/c001_a001.wasm",
                "--mem",
                "1000000",
                "--fuel",
                "2000000",
                "--workers",
                "4",
            ]
        );
    }

    #[test]
    fn sampled_nonces_appended_in_order() {
        let batch = test_batch(vec![42, 7, 1999]);
        let args = build_args(&batch, Path::new("/tmp/a.wasm"), 8).unwrap();

        let pos = args.iter().position(|a| a == "--sampled").unwrap();
        assert_eq!(&args[pos..], &["--sampled", "42", "7", "1999"]);
    }

    #[test]
    fn no_sampled_flag_for_empty_set() {
        let batch = test_batch(vec![]);
        let args = build_args(&batch, Path::new("/tmp/a.wasm"), 8).unwrap();
        assert!(!args.iter().any(|a| a == "--sampled"));
    }

    #[tokio::test]
    async fn successful_run_parses_stdout() {
        let stub = stub_binary(r#"echo '{"solution_count": 2}'"#);
        let invoker = ComputeInvoker::new(stub, 8);
        let result = invoker
            .run(&test_batch(vec![]), Path::new("/tmp/a.wasm"))
            .await
            .unwrap();

        assert_eq!(result["solution_count"], 2);
    }

    #[tokio::test]
    async fn nonzero_exit_carries_stderr() {
        let stub = stub_binary("echo 'fuel exhausted' >&2\nexit 3");
        let invoker = ComputeInvoker::new(stub, 8);
        let err = invoker
            .run(&test_batch(vec![]), Path::new("/tmp/a.wasm"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("fuel exhausted"));
    }

    #[tokio::test]
    async fn malformed_stdout_is_an_error() {
        let stub = stub_binary("echo 'not json'");
        let invoker = ComputeInvoker::new(stub, 8);
        let err = invoker
            .run(&test_batch(vec![]), Path::new("/tmp/a.wasm"))
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("malformed JSON"));
    }

    #[tokio::test]
    async fn missing_binary_is_an_error() {
        let invoker = ComputeInvoker::new(PathBuf::from("/nonexistent/compute"), 8);
        let err = invoker
            .run(&test_batch(vec![]), Path::new("/tmp/a.wasm"))
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("failed to spawn"));
    }
}
