use clap::{Args, Parser, Subcommand};

use grpc_scan_core::connection::ConnectionConfig;

/// All known long flag names (without dashes). Used by `normalize_args` to
/// convert Go-style `-flag` to `--flag`, a compatibility shim carried over
/// from the host crate's argument handling.
const LONG_FLAGS: &[&str] = &[
    "plaintext",
    "insecure",
    "authority",
    "servername",
    "connect-timeout",
    "keepalive-time",
    "max-time",
    "unix",
    "cacert",
    "cert",
    "key",
    "alts",
    "user-agent",
    "max-msg-sz",
    "wordlist",
    "methods",
    "threads",
    "timeout",
    "simple",
    "output",
    "no-patterns",
    "no-version-fuzz",
    "max-version",
    "strict",
    "service",
    "method",
    "target",
    "targets",
    "json",
    "vv",
    "help",
    "version",
];

/// The known subcommand names, used to decide whether to insert the
/// implicit default subcommand (`scan`) ahead of a bare target argument.
const KNOWN_SUBCOMMANDS: &[&str] = &["scan", "call", "detect", "help"];

/// Normalize command-line arguments for Go-style single-dash compatibility,
/// and insert the implicit `scan` subcommand when the first positional
/// argument isn't a known subcommand name (mirrors the host crate's
/// address-then-verb positional parsing).
pub fn normalize_args(args: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut args: Vec<String> = args
        .into_iter()
        .map(|arg| {
            if let Some(rest) = arg.strip_prefix('-') {
                if rest.starts_with('-') {
                    return arg;
                }
                let flag_name = rest.split('=').next().unwrap_or(rest);
                if LONG_FLAGS.contains(&flag_name) {
                    return format!("-{arg}");
                }
            }
            arg
        })
        .collect();

    if let Some(first_positional) = args.iter().skip(1).find(|a| !a.starts_with('-')) {
        if !KNOWN_SUBCOMMANDS.contains(&first_positional.as_str()) {
            let insert_at = args
                .iter()
                .position(|a| a == first_positional)
                .unwrap_or(1);
            args.insert(insert_at, "scan".to_string());
        }
    }

    args
}

/// Black-box discovery tool for gRPC services and methods, without needing
/// any .proto schema: enumerates what a server exposes by probing status
/// codes and, where available, server reflection.
#[derive(Parser, Debug)]
#[command(
    name = "grpc-scan",
    version,
    after_help = "Example usage:\n  \
        grpc-scan -plaintext localhost:8080\n  \
        grpc-scan scan -plaintext --wordlist words.txt localhost:8080\n  \
        grpc-scan call -plaintext localhost:8080 UserService/GetUser\n  \
        grpc-scan detect -plaintext --targets hosts.txt"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enumerate services and methods on one target (the default subcommand).
    Scan(ScanArgs),
    /// Probe one or more specific service/method combinations directly.
    Call(CallArgs),
    /// Check whether each of many targets speaks gRPC at all.
    Detect(DetectArgs),
}

/// Connection and transport flags shared by every subcommand, inherited
/// unchanged from the host crate's `ConnectionConfig`.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Use plain-text HTTP/2 when connecting to server (no TLS).
    #[arg(long)]
    pub plaintext: bool,

    /// Skip server certificate and domain verification. (NOT SECURE!)
    #[arg(long)]
    pub insecure: bool,

    /// The authoritative name of the remote server.
    #[arg(long)]
    pub authority: Option<String>,

    /// Override server name when validating TLS certificate.
    #[arg(long)]
    pub servername: Option<String>,

    /// The maximum time, in seconds, to wait for connection to be established.
    #[arg(long, value_name = "SECONDS")]
    pub connect_timeout: Option<f64>,

    /// If present, the maximum idle time in seconds, after which a keepalive
    /// probe is sent.
    #[arg(long, value_name = "SECONDS")]
    pub keepalive_time: Option<f64>,

    /// The maximum total time the operation can take, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub max_time: Option<f64>,

    /// Indicates that the server address is the path to a Unix domain socket.
    #[arg(long)]
    pub unix: bool,

    /// File containing trusted root certificates for verifying the server.
    #[arg(long, value_name = "FILE")]
    pub cacert: Option<String>,

    /// File containing client certificate (public key).
    #[arg(long, value_name = "FILE")]
    pub cert: Option<String>,

    /// File containing client private key.
    #[arg(long, value_name = "FILE")]
    pub key: Option<String>,

    /// Use Application Layer Transport Security (ALTS) when connecting to server.
    #[arg(long)]
    pub alts: bool,

    /// If set, the specified value will be added to the User-Agent header.
    #[arg(long, value_name = "STRING")]
    pub user_agent: Option<String>,

    /// The maximum encoded size of a response message, in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_msg_sz: Option<i32>,

    /// Enable verbose output (progress, per-candidate debug logging).
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Enable very verbose output (includes timing data).
    #[arg(long = "vv")]
    pub very_verbose: bool,
}

impl ConnectionArgs {
    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            plaintext: self.plaintext,
            insecure: self.insecure,
            authority: self.authority.clone(),
            servername: self.servername.clone(),
            connect_timeout: self.connect_timeout,
            keepalive_time: self.keepalive_time,
            max_time: self.max_time,
            unix: self.unix,
            cacert: self.cacert.clone(),
            cert: self.cert.clone(),
            key: self.key.clone(),
            alts: self.alts,
            user_agent: self.user_agent.clone(),
            max_msg_sz: self.max_msg_sz,
        }
    }

    pub fn verbosity(&self) -> u8 {
        if self.very_verbose {
            2
        } else if self.verbose {
            1
        } else {
            0
        }
    }
}

/// Human-readable, JSON, or one-path-per-line output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Simple,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// The target endpoint, host:port (or a Unix socket path with --unix).
    pub target: String,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// File of service/method candidates in the wordlist grammar.
    #[arg(long, value_name = "FILE")]
    pub wordlist: Option<String>,

    /// File of additional global methods (one per line, `*`-prefix optional).
    #[arg(long, value_name = "FILE")]
    pub methods: Option<String>,

    /// Worker pool size for concurrent candidate probing.
    #[arg(long, default_value_t = grpc_scan_core::orchestrator::DEFAULT_THREADS)]
    pub threads: usize,

    /// Overall scan deadline for this target, in seconds.
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,

    /// Print one service path per line instead of the full report.
    #[arg(long)]
    pub simple: bool,

    /// Write the report to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub output: Option<String>,

    /// Disable bare-name pattern expansion (ServiceSuffix/api./versioned variants).
    #[arg(long)]
    pub no_patterns: bool,

    /// Disable `.vN.` version-segment fuzzing.
    #[arg(long)]
    pub no_version_fuzz: bool,

    /// Highest version number explored by version fuzzing.
    #[arg(long, default_value_t = grpc_scan_core::candidates::DEFAULT_MAX_VERSION)]
    pub max_version: u32,

    /// Demote INTERNAL responses from method-confirmed to ambiguous.
    #[arg(long)]
    pub strict: bool,

    /// Emit the report as JSON instead of the human-readable format.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CallArgs {
    /// The target endpoint, host:port (or a Unix socket path with --unix).
    pub target: String,

    /// `Service/Method` or `Service.Method` to probe directly.
    pub symbol: Option<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Comma-separated list of services to probe (cartesian with --method).
    #[arg(long, value_delimiter = ',')]
    pub service: Vec<String>,

    /// Comma-separated list of methods to probe (cartesian with --service).
    #[arg(long, value_delimiter = ',')]
    pub method: Vec<String>,

    /// Demote INTERNAL responses from method-confirmed to ambiguous.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// A target to check; may be repeated.
    #[arg(long = "target", value_name = "HOST:PORT")]
    pub targets: Vec<String>,

    /// File of targets, one per line.
    #[arg(long = "targets", value_name = "FILE")]
    pub targets_path: Option<String>,

    /// Worker pool size.
    #[arg(long, default_value_t = grpc_scan_core::detect::DEFAULT_THREADS)]
    pub threads: usize,

    /// Per-target deadline, in seconds.
    #[arg(long, default_value_t = 3)]
    pub timeout: u64,

    /// Emit results as a JSON array instead of the human-readable format.
    #[arg(long)]
    pub json: bool,

    /// Write the report to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    pub output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_args_rewrites_go_style_flags() {
        let args = normalize_args(
            ["grpc-scan", "scan", "-plaintext", "localhost:8080"]
                .iter()
                .map(|s| s.to_string()),
        );
        assert_eq!(args[2], "--plaintext");
    }

    #[test]
    fn normalize_args_leaves_short_flags_alone() {
        let args = normalize_args(
            ["grpc-scan", "scan", "-v", "localhost:8080"]
                .iter()
                .map(|s| s.to_string()),
        );
        assert_eq!(args[2], "-v");
    }

    #[test]
    fn normalize_args_inserts_default_scan_subcommand() {
        let args = normalize_args(
            ["grpc-scan", "-plaintext", "localhost:8080"]
                .iter()
                .map(|s| s.to_string()),
        );
        assert_eq!(args, vec!["grpc-scan", "--plaintext", "scan", "localhost:8080"]);
    }

    #[test]
    fn normalize_args_does_not_insert_scan_for_known_subcommand() {
        let args = normalize_args(
            ["grpc-scan", "detect", "--targets", "hosts.txt"]
                .iter()
                .map(|s| s.to_string()),
        );
        assert_eq!(args[1], "detect");
    }
}
