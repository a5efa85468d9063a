use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Semaphore;
use tonic::transport::Channel;

use crate::candidates::{self, Candidate, GeneratorOptions};
use crate::connection::{self, ConnectionConfig};
use crate::model::{MethodName, ScanMode, ScanResult, ServicePath, WordlistEntry};
use crate::oracle::{self, OracleConfig, ProbeOutcome, Verdict};
use crate::reflection::ServerSource;

const HEALTH_SERVICE: &str = "grpc.health.v1.Health";
const HEALTH_METHOD: &str = "Check";

/// Default worker-pool size for a single-target scan.
pub const DEFAULT_THREADS: usize = 10;

/// Tunables for a single-target scan, threaded through from CLI flags.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub wordlist: Vec<WordlistEntry>,
    pub threads: usize,
    pub oracle: OracleConfig,
    pub generator: GeneratorOptions,
    /// Overall per-target scan deadline.
    pub scan_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            wordlist: Vec::new(),
            threads: DEFAULT_THREADS,
            oracle: OracleConfig::default(),
            generator: GeneratorOptions::default(),
            scan_timeout: Duration::from_secs(120),
        }
    }
}

/// Run a full scan against one target: connect, probe reflection, then drive
/// the candidate stream through the method oracle with a bounded worker
/// pool.
pub async fn scan_target(
    conn_config: &ConnectionConfig,
    target: &str,
    scan_config: ScanConfig,
) -> ScanResult {
    let mut result = ScanResult::new(target);

    let channel = match connection::create_channel(conn_config, target).await {
        Ok(channel) => channel,
        Err(err) => {
            result.errors.insert("connect".to_string(), err.to_string());
            return result;
        }
    };

    let scan = scan_with_timeout(channel, &scan_config, &mut result);
    if tokio::time::timeout(scan_config.scan_timeout, scan)
        .await
        .is_err()
    {
        result
            .errors
            .insert("timeout".to_string(), "scan deadline exceeded".to_string());
    }

    debug_assert!(result.check_invariants().is_ok());
    result
}

async fn scan_with_timeout(channel: Channel, scan_config: &ScanConfig, result: &mut ScanResult) {
    let health_outcome =
        oracle::probe_with_code(channel.clone(), HEALTH_SERVICE, HEALTH_METHOD, scan_config.oracle)
            .await;

    if matches!(health_outcome.verdict, Verdict::TransportError) {
        result
            .errors
            .insert("transport".to_string(), "no gRPC status received".to_string());
        return;
    }

    let reflection = ServerSource::new(channel.clone()).probe().await;
    result.reflection_enabled = reflection.enabled;

    let has_wordlist = !scan_config.wordlist.is_empty();
    let candidates = if reflection.enabled && !has_wordlist {
        reflection
            .services
            .iter()
            .map(|svc| Candidate {
                service: svc.clone(),
                methods: candidates::default_methods(&[], svc),
            })
            .collect()
    } else {
        candidates::generate(&scan_config.wordlist, scan_config.generator)
    };

    run_worker_pool(channel.clone(), candidates, scan_config, result).await;

    record_health_status(result, &health_outcome);
    flag_vulnerabilities(result);
    result.scan_mode = select_scan_mode(
        has_wordlist,
        reflection.enabled,
        &scan_config.wordlist,
        &result.services,
    );
}

/// Shared aggregation state, written only through `aggregate`.
struct Aggregate {
    services: Vec<ServicePath>,
    methods: std::collections::BTreeMap<ServicePath, Vec<MethodName>>,
}

async fn run_worker_pool(
    channel: Channel,
    candidates: Vec<Candidate>,
    scan_config: &ScanConfig,
    result: &mut ScanResult,
) {
    let aggregate = Arc::new(Mutex::new(Aggregate {
        services: Vec::new(),
        methods: std::collections::BTreeMap::new(),
    }));
    let processed = Arc::new(AtomicUsize::new(0));
    let found = Arc::new(AtomicUsize::new(0));
    let semaphore = Arc::new(Semaphore::new(scan_config.threads.max(1)));

    let mut tasks = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let channel = channel.clone();
        let oracle_config = scan_config.oracle;
        let aggregate = Arc::clone(&aggregate);
        let processed = Arc::clone(&processed);
        let found = Arc::clone(&found);
        let semaphore = Arc::clone(&semaphore);

        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            probe_candidate(channel, candidate, oracle_config, &aggregate, &found).await;
            let n = processed.fetch_add(1, Ordering::Relaxed) + 1;
            if n % 50 == 0 {
                tracing::debug!(processed = n, "scan progress");
            }
        }));
    }

    for task in tasks {
        let _ = task.await;
    }

    let aggregate = Arc::try_unwrap(aggregate)
        .map(|mutex| mutex.into_inner().unwrap())
        .unwrap_or_else(|arc| {
            let guard = arc.lock().unwrap();
            Aggregate {
                services: guard.services.clone(),
                methods: guard.methods.clone(),
            }
        });

    result.services = aggregate.services;
    result.methods_per_service = aggregate.methods;

    tracing::info!(
        processed = processed.load(Ordering::Relaxed),
        found = found.load(Ordering::Relaxed),
        "scan complete"
    );
}

/// Probe one candidate's first method to decide service existence, then
/// (only if the service was added) probe its remaining methods.
async fn probe_candidate(
    channel: Channel,
    candidate: Candidate,
    oracle_config: OracleConfig,
    aggregate: &Mutex<Aggregate>,
    found: &AtomicUsize,
) {
    let Some(first_method) = candidate.methods.first() else {
        return;
    };

    let first_outcome =
        oracle::probe(channel.clone(), &candidate.service, first_method, oracle_config).await;

    let service_present = match first_outcome {
        Verdict::ServiceMissing | Verdict::TransportError | Verdict::Ambiguous => false,
        Verdict::MethodMissingServicePresent | Verdict::MethodConfirmed => true,
    };

    if !service_present {
        return;
    }

    let mut confirmed_methods = Vec::new();
    if first_outcome == Verdict::MethodConfirmed {
        confirmed_methods.push(first_method.clone());
    }

    for method in candidate.methods.iter().skip(1) {
        let outcome = oracle::probe(channel.clone(), &candidate.service, method, oracle_config).await;
        if outcome == Verdict::MethodConfirmed {
            confirmed_methods.push(method.clone());
        }
    }

    let mut guard = aggregate.lock().unwrap();
    if !guard.services.contains(&candidate.service) {
        guard.services.push(candidate.service.clone());
        found.fetch_add(1, Ordering::Relaxed);
    }
    let entry = guard
        .methods
        .entry(candidate.service.clone())
        .or_default();
    for m in confirmed_methods {
        if !entry.contains(&m) {
            entry.push(m);
        }
    }
}

fn record_health_status(result: &mut ScanResult, outcome: &ProbeOutcome) {
    let status = match outcome.code {
        Some(tonic::Code::Ok) => "SERVING".to_string(),
        Some(code) => oracle::status_code_name(code).to_string(),
        None => return,
    };
    result
        .health_status
        .insert(HEALTH_SERVICE.to_string(), status);
}

fn flag_vulnerabilities(result: &mut ScanResult) {
    for svc in &result.services {
        let lower = svc.to_ascii_lowercase();
        if lower.contains("debug") || lower.contains("admin") || lower.contains("internal") {
            result
                .vulnerabilities
                .push(format!("exposed sensitive-looking service: {svc}"));
        }
    }

    if result.reflection_enabled {
        result
            .vulnerabilities
            .push("server reflection is enabled".to_string());
    }

    for (svc, status) in &result.health_status {
        if status != "SERVING" {
            result
                .vulnerabilities
                .push(format!("health service {svc} reports non-serving status {status}"));
        }
    }
}

fn select_scan_mode(
    has_wordlist: bool,
    reflection_enabled: bool,
    wordlist: &[WordlistEntry],
    services: &[ServicePath],
) -> ScanMode {
    if reflection_enabled && !has_wordlist {
        return ScanMode::Reflection;
    }
    if has_wordlist {
        return ScanMode::Wordlist;
    }
    if !reflection_enabled {
        return ScanMode::Bruteforce;
    }
    if wordlist.is_empty() && services.len() <= 1 {
        return ScanMode::Standard;
    }
    ScanMode::Standard
}

/// Probe a single `service/method` directly, for the `call` subcommand's
/// direct mode. Returns the verdict without mutating any `ScanResult`.
pub async fn probe_direct(
    conn_config: &ConnectionConfig,
    target: &str,
    service: &str,
    method: &str,
    oracle_config: OracleConfig,
) -> crate::error::Result<Verdict> {
    let channel = connection::create_channel(conn_config, target).await?;
    Ok(oracle::probe(channel, service, method, oracle_config).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_mode_prefers_reflection_when_no_wordlist() {
        let mode = select_scan_mode(false, true, &[], &["a".to_string(), "b".to_string()]);
        assert_eq!(mode, ScanMode::Reflection);
    }

    #[test]
    fn scan_mode_is_wordlist_when_wordlist_supplied() {
        let mode = select_scan_mode(true, true, &[], &[]);
        assert_eq!(mode, ScanMode::Wordlist);
    }

    #[test]
    fn scan_mode_is_bruteforce_without_reflection_or_wordlist() {
        let mode = select_scan_mode(false, false, &[], &[]);
        assert_eq!(mode, ScanMode::Bruteforce);
    }

    #[test]
    fn flag_vulnerabilities_detects_sensitive_service_names() {
        let mut result = ScanResult::new("target");
        result.services.push("internal.DebugService".to_string());
        flag_vulnerabilities(&mut result);
        assert!(!result.vulnerabilities.is_empty());
    }

    #[test]
    fn flag_vulnerabilities_flags_reflection_enabled() {
        let mut result = ScanResult::new("target");
        result.reflection_enabled = true;
        flag_vulnerabilities(&mut result);
        assert!(result
            .vulnerabilities
            .iter()
            .any(|v| v.contains("reflection")));
    }
}
