use std::time::{Duration, Instant};

use tonic::transport::Channel;

use crate::connection::{self, ConnectionConfig};
use crate::oracle::{self, OracleConfig, Verdict};

/// Well-known health-check path used to decide whether a peer speaks gRPC at all.
const HEALTH_SERVICE: &str = "grpc.health.v1.Health";
const HEALTH_METHOD: &str = "Check";

/// Outcome of probing a single endpoint for gRPC-ness.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub connected: bool,
    pub is_grpc: bool,
    pub reason: Option<String>,
    pub latency: Duration,
}

/// Open a connection to `target` and decide whether the peer speaks gRPC.
///
/// Implemented as a thin wrapper around the Method Oracle: probing
/// `grpc.health.v1.Health/Check` and treating every verdict except
/// `TRANSPORT_ERROR` as proof of gRPC, since any gRPC status at all
/// (including `UNIMPLEMENTED`) requires an HTTP/2 peer that understands
/// gRPC framing.
pub async fn probe(config: &ConnectionConfig, target: &str) -> ProbeResult {
    let started = Instant::now();

    let channel = match connection::create_channel(config, target).await {
        Ok(channel) => channel,
        Err(err) => {
            return ProbeResult {
                connected: false,
                is_grpc: false,
                reason: Some(err.to_string()),
                latency: started.elapsed(),
            };
        }
    };

    let verdict = probe_channel(channel, OracleConfig::default()).await;
    let latency = started.elapsed();

    match verdict {
        Verdict::TransportError => ProbeResult {
            connected: true,
            is_grpc: false,
            reason: Some("no gRPC status received".to_string()),
            latency,
        },
        _ => ProbeResult {
            connected: true,
            is_grpc: true,
            reason: None,
            latency,
        },
    }
}

/// Probe an already-open channel rather than dialing fresh; used by the
/// orchestrator so the transport check and the rest of the scan share one
/// connection.
pub async fn probe_channel(channel: Channel, config: OracleConfig) -> Verdict {
    oracle::probe(channel, HEALTH_SERVICE, HEALTH_METHOD, config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_reports_connect_failure_for_unreachable_target() {
        let config = ConnectionConfig {
            plaintext: true,
            connect_timeout: Some(0.5),
            ..ConnectionConfig::default()
        };
        let result = probe(&config, "127.0.0.1:1").await;
        assert!(!result.connected);
        assert!(!result.is_grpc);
        assert!(result.reason.is_some());
    }
}
