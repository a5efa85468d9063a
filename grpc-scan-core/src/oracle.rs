use std::time::Duration;

use tonic::client::Grpc;
use tonic::transport::Channel;
use tonic::{Code, Request};

use crate::codec::EmptyCodec;

/// The oracle's classification of a single probe response. See the table in
/// the module-level documentation of `probe` for the full mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No usable gRPC status was obtained (connection reset, deadline, `UNAVAILABLE`).
    TransportError,
    /// `UNIMPLEMENTED` with a message naming the service as unknown.
    ServiceMissing,
    /// The service routed the request but the method itself was rejected or missing.
    MethodMissingServicePresent,
    /// A status proves the method was dispatched and handled.
    MethodConfirmed,
    /// A status that doesn't fit any of the above; never used to mutate state.
    Ambiguous,
}

/// Tunables for the oracle, threaded through from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct OracleConfig {
    /// Per-call deadline.
    pub timeout: Duration,
    /// Demote `INTERNAL` from `MethodConfirmed` to `Ambiguous`.
    pub strict: bool,
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            timeout: Duration::from_secs(5),
            strict: false,
        }
    }
}

/// A verdict plus the raw status code it was derived from, when one was
/// received at all. Callers that only care about existence can ignore
/// `code`; the orchestrator's health-status recording needs it.
#[derive(Debug, Clone, Copy)]
pub struct ProbeOutcome {
    pub verdict: Verdict,
    pub code: Option<Code>,
}

/// Issue a zero-body unary call against `service/method` on `channel` and
/// classify the result.
///
/// No payload is ever sent: the empty request body is deliberate, maximizing
/// the chance of eliciting one of the discriminating status codes below
/// without needing any protobuf descriptor for the target method.
pub async fn probe(channel: Channel, service: &str, method: &str, config: OracleConfig) -> Verdict {
    probe_with_code(channel, service, method, config).await.verdict
}

/// Like `probe`, but also returns the raw status code observed (`None` on
/// transport-level failures that never produced a gRPC status at all).
pub async fn probe_with_code(
    channel: Channel,
    service: &str,
    method: &str,
    config: OracleConfig,
) -> ProbeOutcome {
    let mut grpc = Grpc::new(channel);

    let path_str = format!("/{service}/{method}");
    let path = match http::uri::PathAndQuery::try_from(path_str) {
        Ok(p) => p,
        Err(_) => {
            return ProbeOutcome {
                verdict: Verdict::Ambiguous,
                code: None,
            }
        }
    };

    let call = async {
        if grpc.ready().await.is_err() {
            return ProbeOutcome {
                verdict: Verdict::TransportError,
                code: None,
            };
        }
        let result = grpc.unary(Request::new(()), path, EmptyCodec).await;
        let code = match &result {
            Ok(_) => Some(Code::Ok),
            Err(status) => Some(status.code()),
        };
        ProbeOutcome {
            verdict: classify(result, config),
            code,
        }
    };

    match tokio::time::timeout(config.timeout, call).await {
        Ok(outcome) => outcome,
        Err(_) => ProbeOutcome {
            verdict: Verdict::TransportError,
            code: None,
        },
    }
}

/// Classify a raw oracle call outcome into a `Verdict`.
///
/// Implemented as a single match over `(Code, message)` so that no case can
/// be silently merged with another; see the module documentation for the
/// rationale behind each branch.
fn classify(
    result: Result<tonic::Response<()>, tonic::Status>,
    config: OracleConfig,
) -> Verdict {
    let status = match result {
        Ok(_) => return Verdict::MethodConfirmed,
        Err(status) => status,
    };

    let message = status.message().to_ascii_lowercase();

    match status.code() {
        Code::Unavailable => Verdict::TransportError,
        Code::Unimplemented if message.contains("unknown service") => Verdict::ServiceMissing,
        Code::Unimplemented if message.contains("unknown method") => {
            Verdict::MethodMissingServicePresent
        }
        Code::Unimplemented if message.contains("method") && !message.contains("service") => {
            Verdict::MethodMissingServicePresent
        }
        Code::Unimplemented => Verdict::MethodMissingServicePresent,
        Code::InvalidArgument | Code::FailedPrecondition | Code::OutOfRange => {
            Verdict::MethodConfirmed
        }
        Code::Unauthenticated | Code::PermissionDenied => Verdict::MethodConfirmed,
        Code::Internal => {
            if config.strict {
                Verdict::Ambiguous
            } else {
                Verdict::MethodConfirmed
            }
        }
        Code::Ok => Verdict::MethodConfirmed,
        _ => Verdict::Ambiguous,
    }
}

/// Map a tonic gRPC status code to its canonical name, used for the
/// orchestrator's health-status string (`SERVING` on `OK`, otherwise this).
pub fn status_code_name(code: Code) -> &'static str {
    match code {
        Code::Ok => "OK",
        Code::Cancelled => "Canceled",
        Code::Unknown => "Unknown",
        Code::InvalidArgument => "InvalidArgument",
        Code::DeadlineExceeded => "DeadlineExceeded",
        Code::NotFound => "NotFound",
        Code::AlreadyExists => "AlreadyExists",
        Code::PermissionDenied => "PermissionDenied",
        Code::ResourceExhausted => "ResourceExhausted",
        Code::FailedPrecondition => "FailedPrecondition",
        Code::Aborted => "Aborted",
        Code::OutOfRange => "OutOfRange",
        Code::Unimplemented => "Unimplemented",
        Code::Internal => "Internal",
        Code::Unavailable => "Unavailable",
        Code::DataLoss => "DataLoss",
        Code::Unauthenticated => "Unauthenticated",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Status;

    fn cfg() -> OracleConfig {
        OracleConfig::default()
    }

    fn strict_cfg() -> OracleConfig {
        OracleConfig {
            strict: true,
            ..OracleConfig::default()
        }
    }

    #[test]
    fn ok_is_confirmed() {
        let result = Ok(tonic::Response::new(()));
        assert_eq!(classify(result, cfg()), Verdict::MethodConfirmed);
    }

    #[test]
    fn unimplemented_unknown_service_is_missing() {
        let result = Err(Status::unimplemented("unknown service foo.Bar"));
        assert_eq!(classify(result, cfg()), Verdict::ServiceMissing);
    }

    #[test]
    fn unimplemented_unknown_method_is_method_missing() {
        let result = Err(Status::unimplemented("unknown method Baz"));
        assert_eq!(
            classify(result, cfg()),
            Verdict::MethodMissingServicePresent
        );
    }

    #[test]
    fn unimplemented_terse_message_is_method_missing_conservatively() {
        let result = Err(Status::unimplemented(""));
        assert_eq!(
            classify(result, cfg()),
            Verdict::MethodMissingServicePresent
        );
    }

    #[test]
    fn invalid_argument_is_confirmed() {
        let result = Err(Status::invalid_argument("bad input"));
        assert_eq!(classify(result, cfg()), Verdict::MethodConfirmed);
    }

    #[test]
    fn unauthenticated_is_confirmed() {
        let result = Err(Status::unauthenticated("missing token"));
        assert_eq!(classify(result, cfg()), Verdict::MethodConfirmed);
    }

    #[test]
    fn permission_denied_is_confirmed() {
        let result = Err(Status::permission_denied("nope"));
        assert_eq!(classify(result, cfg()), Verdict::MethodConfirmed);
    }

    #[test]
    fn internal_is_confirmed_by_default() {
        let result = Err(Status::internal("panic"));
        assert_eq!(classify(result, cfg()), Verdict::MethodConfirmed);
    }

    #[test]
    fn internal_is_ambiguous_in_strict_mode() {
        let result = Err(Status::internal("panic"));
        assert_eq!(classify(result, strict_cfg()), Verdict::Ambiguous);
    }

    #[test]
    fn unavailable_is_transport_error() {
        let result = Err(Status::unavailable("connection reset"));
        assert_eq!(classify(result, cfg()), Verdict::TransportError);
    }

    #[test]
    fn unknown_status_is_ambiguous() {
        let result = Err(Status::resource_exhausted("quota"));
        assert_eq!(classify(result, cfg()), Verdict::Ambiguous);
    }

    #[test]
    fn message_matching_is_case_insensitive() {
        let result = Err(Status::unimplemented("Unknown Service: foo.Bar"));
        assert_eq!(classify(result, cfg()), Verdict::ServiceMissing);
    }
}
