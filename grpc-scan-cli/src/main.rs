mod cli;
mod output;
mod validate;

use std::io::Read;
use std::process;

use clap::Parser;
use cli::{CallArgs, Cli, Command, DetectArgs, ScanArgs};
use tracing_subscriber::EnvFilter;

use grpc_scan_core::candidates::{self, GeneratorOptions};
use grpc_scan_core::detect::{self, DetectConfig};
use grpc_scan_core::model::normalize_endpoint;
use grpc_scan_core::oracle::OracleConfig;
use grpc_scan_core::orchestrator::{self, ScanConfig};

#[tokio::main]
async fn main() {
    let normalized = cli::normalize_args(std::env::args());
    let cli = Cli::parse_from(normalized);

    match &cli.command {
        Command::Scan(args) => {
            init_tracing(args.connection.verbosity());
            if let Err(msg) = validate::validate_connection(&args.connection) {
                fail_with_usage(&msg);
            }
            run_scan(args).await;
        }
        Command::Call(args) => {
            init_tracing(args.connection.verbosity());
            if let Err(msg) = validate::validate_connection(&args.connection) {
                fail_with_usage(&msg);
            }
            run_call(args).await;
        }
        Command::Detect(args) => {
            init_tracing(args.connection.verbosity());
            if let Err(msg) = validate::validate_connection(&args.connection) {
                fail_with_usage(&msg);
            }
            run_detect(args).await;
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn fail_with_usage(msg: &str) -> ! {
    eprintln!("{msg}");
    eprintln!("Try 'grpc-scan --help' for more details.");
    process::exit(2);
}

async fn run_scan(args: &ScanArgs) {
    let conn_config = args.connection.connection_config();

    let mut wordlist = Vec::new();
    if let Some(ref path) = args.wordlist {
        match candidates::load_wordlist(path) {
            Ok(entries) => wordlist = entries,
            Err(e) => {
                eprintln!("Failed to load wordlist {path}: {e}");
                process::exit(1);
            }
        }
    }
    if let Some(ref path) = args.methods {
        match std::fs::read_to_string(path) {
            Ok(contents) => wordlist.extend(candidates::parse_wordlist(&contents)),
            Err(e) => {
                eprintln!("Failed to read methods file {path}: {e}");
                process::exit(1);
            }
        }
    }

    let scan_config = ScanConfig {
        wordlist,
        threads: args.threads,
        oracle: OracleConfig {
            timeout: std::time::Duration::from_secs(5),
            strict: args.strict,
        },
        generator: GeneratorOptions {
            patterns: !args.no_patterns,
            version_fuzz: !args.no_version_fuzz,
            max_version: args.max_version,
        },
        scan_timeout: std::time::Duration::from_secs(args.timeout),
    };

    let target = normalize_endpoint(&args.target);
    let result = orchestrator::scan_target(&conn_config, &target, scan_config).await;

    let rendered = if args.json {
        match output::render_scan_json(&result) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to render JSON report: {e}");
                process::exit(1);
            }
        }
    } else if args.simple {
        output::render_scan_simple(&result)
    } else {
        output::render_scan_human(&result)
    };

    if let Err(e) = output::write_report(&rendered, args.output.as_deref()) {
        eprintln!("Failed to write report: {e}");
        process::exit(1);
    }

    if !result.errors.is_empty() {
        process::exit(1);
    }
}

async fn run_call(args: &CallArgs) {
    let conn_config = args.connection.connection_config();
    let target = normalize_endpoint(&args.target);
    let oracle_config = OracleConfig {
        timeout: std::time::Duration::from_secs(5),
        strict: args.strict,
    };

    let pairs = resolve_call_pairs(args);
    if pairs.is_empty() {
        fail_with_usage("No service/method specified. Pass SYMBOL as Service/Method, or use --service/--method.");
    }

    let mut any_confirmed = false;
    for (service, method) in pairs {
        match orchestrator::probe_direct(&conn_config, &target, &service, &method, oracle_config).await
        {
            Ok(verdict) => {
                println!("{service}/{method}: {verdict:?}");
                if verdict == grpc_scan_core::oracle::Verdict::MethodConfirmed {
                    any_confirmed = true;
                }
            }
            Err(e) => {
                eprintln!("{service}/{method}: {e}");
            }
        }
    }

    if !any_confirmed {
        process::exit(1);
    }
}

fn resolve_call_pairs(args: &CallArgs) -> Vec<(String, String)> {
    if let Some(ref symbol) = args.symbol {
        let (service, method) = match symbol.split_once('/').or_else(|| symbol.rsplit_once('.')) {
            Some(pair) => pair,
            None => fail_with_usage(&format!("Invalid symbol \"{symbol}\": expected Service/Method.")),
        };
        return vec![(service.to_string(), method.to_string())];
    }

    let mut pairs = Vec::new();
    for service in &args.service {
        for method in &args.method {
            pairs.push((service.clone(), method.clone()));
        }
    }
    pairs
}

async fn run_detect(args: &DetectArgs) {
    let conn_config = args.connection.connection_config();

    let mut targets: Vec<String> = args.targets.iter().map(|t| normalize_endpoint(t)).collect();
    if let Some(ref path) = args.targets_path {
        match std::fs::read_to_string(path) {
            Ok(contents) => targets.extend(detect::parse_targets(&contents)),
            Err(e) => {
                eprintln!("Failed to read targets file {path}: {e}");
                process::exit(1);
            }
        }
    } else if targets.is_empty() {
        let mut stdin_contents = String::new();
        if std::io::stdin().read_to_string(&mut stdin_contents).is_ok() {
            targets.extend(detect::parse_targets(&stdin_contents));
        }
    }

    if targets.is_empty() {
        fail_with_usage("No targets specified. Use --target, --targets, or pipe targets on stdin.");
    }

    let config = DetectConfig {
        threads: args.threads,
        per_target_timeout: std::time::Duration::from_secs(args.timeout),
    };

    let results = detect::detect_all(&conn_config, &targets, config).await;

    let rendered = if args.json {
        match output::render_detect_json(&results) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to render JSON report: {e}");
                process::exit(1);
            }
        }
    } else {
        output::render_detect_human(&results)
    };

    if let Err(e) = output::write_report(&rendered, args.output.as_deref()) {
        eprintln!("Failed to write report: {e}");
        process::exit(1);
    }
}
