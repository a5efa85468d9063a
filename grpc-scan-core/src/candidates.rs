use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, ScanError};
use crate::model::{MethodName, OrderedSet, ServicePath, WordlistEntry};

/// Character class of a gRPC fully-qualified service name: dot-separated
/// identifiers, each starting with a letter or underscore.
static SERVICE_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap());

fn is_valid_service_path(service: &str) -> bool {
    SERVICE_PATH_RE.is_match(service)
}

/// Default method names tried against any service with no explicit methods.
const DEFAULT_METHODS: &[&str] = &[
    "Get", "List", "Create", "Update", "Delete", "Find", "Search", "Query", "Check", "Ping",
];

/// Built-in services always emitted regardless of wordlist, so a scan has
/// useful coverage even with no wordlist provided.
const SEED_SERVICES: &[&str] = &[
    "grpc.health.v1.Health",
    "grpc.reflection.v1.ServerReflection",
    "grpc.reflection.v1alpha.ServerReflection",
    "helloworld.Greeter",
    "ping.PingService",
    "echo.EchoService",
];

/// Domain-specific method enrichment: appended to (not a replacement for)
/// the default method list for every vocab key found anywhere in the
/// service's full lowercased FQN (package included, not just the trailing
/// segment) — `helloworld.Greeter` must still match `"hello"`.
const DOMAIN_VOCAB: &[(&str, &[&str])] = &[
    ("user", &["GetUser", "CreateUser", "UpdateUser", "DeleteUser", "ListUsers"]),
    ("auth", &["Login", "Logout", "Verify", "Refresh", "ValidateToken"]),
    ("file", &["Upload", "Download", "Delete", "ListFiles", "GetMetadata"]),
    ("storage", &["Upload", "Download", "Delete", "ListFiles", "GetMetadata"]),
    ("payment", &["Charge", "Refund", "GetTransaction", "ListTransactions"]),
    ("ping", &["Ping", "Echo", "Health"]),
    ("hello", &["SayHello", "Greet"]),
    ("product", &["GetProduct", "ListProducts", "CreateProduct", "UpdateProduct"]),
    ("order", &["CreateOrder", "GetOrder", "ListOrders", "CancelOrder"]),
];

fn domain_methods(lower_path: &str) -> impl Iterator<Item = &'static str> + '_ {
    DOMAIN_VOCAB
        .iter()
        .filter(move |(key, _)| lower_path.contains(key))
        .flat_map(|(_, methods)| methods.iter().copied())
}

/// Default cap on the deduplicated candidate queue; combining pattern
/// expansion with version fuzzing can blow the set up quadratically for
/// long wordlists.
pub const MAX_CANDIDATES: usize = 5000;

/// Default maximum version number explored by `expand_versions`.
pub const DEFAULT_MAX_VERSION: u32 = 3;

/// A single `(service, methods)` pair ready for the orchestrator to probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub service: ServicePath,
    pub methods: Vec<MethodName>,
}

/// Flags controlling candidate generation, threaded through from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorOptions {
    pub patterns: bool,
    pub version_fuzz: bool,
    pub max_version: u32,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            patterns: true,
            version_fuzz: true,
            max_version: DEFAULT_MAX_VERSION,
        }
    }
}

/// Parse a wordlist file body (already read to a string) per the grammar in
/// the external-interfaces section: blank lines and `#`/`//`-prefixed lines
/// ignored, inline `#` comments stripped, three entry shapes.
pub fn parse_wordlist(contents: &str) -> Vec<WordlistEntry> {
    contents
        .lines()
        .filter_map(parse_wordlist_line)
        .collect()
}

fn parse_wordlist_line(line: &str) -> Option<WordlistEntry> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
        return None;
    }

    let stripped = strip_inline_comment(trimmed);
    let entry = stripped.trim();
    if entry.is_empty() {
        return None;
    }

    if let Some(method) = entry.strip_prefix('*') {
        return Some(WordlistEntry::GlobalMethod(method.to_string()));
    }

    if let Some((service, methods)) = entry.split_once(':') {
        let service = service.trim();
        if !is_valid_service_path(service) {
            tracing::warn!(line = trimmed, "skipping wordlist line: invalid service path");
            return None;
        }
        let methods: Vec<MethodName> = methods
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();
        return Some(WordlistEntry::ServiceWithMethods(
            service.to_string(),
            methods,
        ));
    }

    if !is_valid_service_path(entry) {
        tracing::warn!(line = trimmed, "skipping wordlist line: invalid service path");
        return None;
    }

    Some(WordlistEntry::Service(entry.to_string()))
}

/// Strip a trailing ` # comment` or ` // comment` tail, if present outside
/// of the leading marker already handled by the caller.
fn strip_inline_comment(line: &str) -> &str {
    let hash = line.find('#');
    let slashes = line.find("//");
    match (hash, slashes) {
        (Some(h), Some(s)) => &line[..h.min(s)],
        (Some(h), None) => &line[..h],
        (None, Some(s)) => &line[..s],
        (None, None) => line,
    }
}

/// Read and parse a wordlist file from disk.
pub fn load_wordlist(path: &str) -> Result<Vec<WordlistEntry>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ScanError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read wordlist '{path}': {e}"),
        ))
    })?;
    Ok(parse_wordlist(&contents))
}

/// Generate the full candidate stream from parsed wordlist entries, the
/// built-in seed list, and the configured expansion flags.
pub fn generate(entries: &[WordlistEntry], options: GeneratorOptions) -> Vec<Candidate> {
    let global_methods: Vec<MethodName> = entries
        .iter()
        .filter_map(|e| match e {
            WordlistEntry::GlobalMethod(m) => Some(m.clone()),
            _ => None,
        })
        .collect();

    let mut ordered = OrderedSet::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    for service in SEED_SERVICES {
        push_candidate(
            &mut ordered,
            &mut candidates,
            service.to_string(),
            default_methods(&global_methods, service),
        );
    }

    for entry in entries {
        match entry {
            WordlistEntry::Service(service) => {
                for variant in expand_service(service, options.patterns) {
                    let methods = default_methods(&global_methods, &variant);
                    push_candidate(&mut ordered, &mut candidates, variant, methods);
                }
            }
            WordlistEntry::ServiceWithMethods(service, methods) => {
                let mut all_methods = methods.clone();
                for m in &global_methods {
                    if !all_methods.contains(m) {
                        all_methods.push(m.clone());
                    }
                }
                for variant in expand_service(service, options.patterns) {
                    push_candidate(&mut ordered, &mut candidates, variant, all_methods.clone());
                }
            }
            WordlistEntry::GlobalMethod(_) => {}
        }
    }

    if options.version_fuzz {
        let versioned: Vec<Candidate> = candidates
            .iter()
            .flat_map(|c| expand_versions(&c.service, options.max_version).into_iter().map(
                move |v| Candidate { service: v, methods: c.methods.clone() }
            ))
            .collect();
        for c in versioned {
            push_candidate(&mut ordered, &mut candidates, c.service, c.methods);
        }
    }

    if candidates.len() > MAX_CANDIDATES {
        tracing::warn!(
            total = candidates.len(),
            cap = MAX_CANDIDATES,
            "candidate queue exceeds cap, truncating"
        );
        candidates.truncate(MAX_CANDIDATES);
    }

    candidates
}

fn push_candidate(
    seen: &mut OrderedSet<ServicePath>,
    out: &mut Vec<Candidate>,
    service: ServicePath,
    methods: Vec<MethodName>,
) {
    if seen.insert(service.clone()) {
        out.push(Candidate { service, methods });
    }
}

/// Build the method list for a bare `Service` wordlist entry: the default
/// list plus any domain-specific enrichment plus the wordlist's global
/// (`*Method`) entries, deduplicated while preserving first occurrence.
///
/// Also used by the orchestrator to pick probe methods for services
/// discovered via reflection, so reflection-mode and bruteforce-mode scans
/// apply the same method vocabulary to a given service name.
pub fn default_methods(global_methods: &[MethodName], service: &str) -> Vec<MethodName> {
    let lower_path = service.to_ascii_lowercase();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for m in DEFAULT_METHODS
        .iter()
        .map(|s| s.to_string())
        .chain(domain_methods(&lower_path).map(|s| s.to_string()))
        .chain(global_methods.iter().cloned())
    {
        if seen.insert(m.clone()) {
            out.push(m);
        }
    }
    out
}

/// Pattern expansion: when a bare name contains no `.` and doesn't end in
/// `Service`, also emit a handful of common FQN shapes. The original is
/// always retained first.
fn expand_service(service: &str, patterns_enabled: bool) -> Vec<ServicePath> {
    let mut out = vec![service.to_string()];

    if !patterns_enabled || service.contains('.') || service.ends_with("Service") {
        return out;
    }

    let lower = service.to_ascii_lowercase();
    out.push(format!("{service}Service"));
    out.push(format!("{lower}.{service}Service"));
    out.push(format!("api.{service}"));
    out.push(format!("{lower}.v1.{service}Service"));
    out
}

/// Version fuzzing: for any path containing `.vN.`, emit the same path with
/// `N` replaced by every other integer in `[1, max_version]`. The original
/// is always retained; paths without a version segment pass through
/// unchanged.
fn expand_versions(service: &str, max_version: u32) -> Vec<ServicePath> {
    let Some((prefix, n, suffix)) = find_version_segment(service) else {
        return vec![service.to_string()];
    };

    let mut out = vec![service.to_string()];
    for v in 1..=max_version {
        if v == n {
            continue;
        }
        out.push(format!("{prefix}.v{v}.{suffix}"));
    }
    out
}

/// Find a `.vN.` segment, returning owned `(prefix, N, suffix)` with
/// prefix/suffix excluding the `.vN.` delimiters themselves.
fn find_version_segment(service: &str) -> Option<(String, u32, String)> {
    let parts: Vec<&str> = service.split('.').collect();
    for (i, part) in parts.iter().enumerate() {
        if let Some(digits) = part.strip_prefix('v') {
            if let Ok(n) = digits.parse::<u32>() {
                if i > 0 && i + 1 < parts.len() {
                    let prefix = parts[..i].join(".");
                    let suffix = parts[i + 1..].join(".");
                    return Some((prefix, n, suffix));
                }
            }
        }
    }
    None
}
