use std::fmt;

/// All error types produced by the grpc-scan library.
#[derive(Debug)]
pub enum ScanError {
    /// A connection to the target could not be established (TCP/TLS/HTTP2 handshake).
    Connect(String),

    /// An invalid argument was provided (e.g., malformed target, bad wordlist path).
    InvalidArgument(String),

    /// An I/O error (file read, network, etc.).
    Io(std::io::Error),

    /// A gRPC status error surfaced where none was expected (e.g. during reflection
    /// negotiation, rather than candidate probing where it is folded into a verdict).
    GrpcStatus(tonic::Status),

    /// Any other error.
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Connect(msg) => write!(f, "connection failed: {msg}"),
            ScanError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            ScanError::Io(err) => write!(f, "I/O error: {err}"),
            ScanError::GrpcStatus(status) => {
                write!(f, "gRPC error: {} - {}", status.code(), status.message())
            }
            ScanError::Other(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Io(err) => Some(err),
            ScanError::Other(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Io(err)
    }
}

impl From<tonic::Status> for ScanError {
    fn from(status: tonic::Status) -> Self {
        ScanError::GrpcStatus(status)
    }
}

/// Convenience type alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formatting() {
        let err = ScanError::InvalidArgument("bad target".into());
        assert_eq!(err.to_string(), "invalid argument: bad target");

        let err = ScanError::Connect("refused".into());
        assert_eq!(err.to_string(), "connection failed: refused");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: ScanError = io_err.into();
        assert!(matches!(err, ScanError::Io(_)));
    }

    #[test]
    fn grpc_status_conversion() {
        let status = tonic::Status::unavailable("down");
        let err: ScanError = status.into();
        assert!(matches!(err, ScanError::GrpcStatus(_)));
    }
}
