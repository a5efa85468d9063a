use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::connection::ConnectionConfig;
use crate::model::{normalize_endpoint, DetectResult};
use crate::transport;

/// Default worker-pool size for the multi-target detector.
pub const DEFAULT_THREADS: usize = 50;

/// Default per-target deadline.
pub const DEFAULT_PER_TARGET_TIMEOUT: Duration = Duration::from_secs(3);

/// Tunables for a multi-target detect run.
#[derive(Debug, Clone, Copy)]
pub struct DetectConfig {
    pub threads: usize,
    pub per_target_timeout: Duration,
}

impl Default for DetectConfig {
    fn default() -> Self {
        DetectConfig {
            threads: DEFAULT_THREADS,
            per_target_timeout: DEFAULT_PER_TARGET_TIMEOUT,
        }
    }
}

/// Parse a target list file: one endpoint per line, blank lines and
/// `#`/`//`-prefixed lines ignored.
pub fn parse_targets(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with("//"))
        .map(normalize_endpoint)
        .collect()
}

/// Run the Transport Probe against every target with a bounded worker pool
/// and a per-target deadline. Results preserve input order regardless of
/// completion order.
pub async fn detect_all(
    conn_config: &ConnectionConfig,
    targets: &[String],
    config: DetectConfig,
) -> Vec<DetectResult> {
    let semaphore = Arc::new(Semaphore::new(config.threads.max(1)));
    let mut tasks = Vec::with_capacity(targets.len());

    for target in targets {
        let target = target.clone();
        let conn_config = conn_config.clone();
        let semaphore = Arc::clone(&semaphore);
        let per_target_timeout = config.per_target_timeout;

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            detect_one(&conn_config, &target, per_target_timeout).await
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for (target, task) in targets.iter().zip(tasks) {
        let result = match task.await {
            Ok(result) => result,
            Err(_) => DetectResult {
                target: target.clone(),
                is_grpc: false,
                latency_ms: 0,
                error: Some("worker task panicked".to_string()),
                timestamp: chrono::Utc::now(),
            },
        };
        results.push(result);
    }
    results
}

async fn detect_one(conn_config: &ConnectionConfig, target: &str, timeout: Duration) -> DetectResult {
    let probe = tokio::time::timeout(timeout, transport::probe(conn_config, target)).await;

    match probe {
        Ok(result) => DetectResult {
            target: target.to_string(),
            is_grpc: result.is_grpc,
            latency_ms: result.latency.as_millis() as u64,
            error: if result.is_grpc { None } else { result.reason },
            timestamp: chrono::Utc::now(),
        },
        Err(_) => DetectResult {
            target: target.to_string(),
            is_grpc: false,
            latency_ms: timeout.as_millis() as u64,
            error: Some("per-target deadline exceeded".to_string()),
            timestamp: chrono::Utc::now(),
        },
    }
}
