use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dot-separated gRPC fully-qualified service name, e.g. `pkg.sub.ServiceName`.
/// Case is preserved; no normalization is performed beyond what the caller provides.
pub type ServicePath = String;

/// A single gRPC method name within a service. Case preserved.
pub type MethodName = String;

/// An ordered set: preserves first-insertion order while rejecting duplicates.
/// `services` and each `methods_per_service` value list use this so that
/// the no-duplicates and insertion-order invariants are structural rather
/// than re-checked by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedSet<T: Eq + std::hash::Hash + Clone> {
    order: Vec<T>,
    seen: std::collections::HashSet<T>,
}

impl<T: Eq + std::hash::Hash + Clone> OrderedSet<T> {
    pub fn new() -> Self {
        OrderedSet {
            order: Vec::new(),
            seen: std::collections::HashSet::new(),
        }
    }

    /// Insert `item` if not already present. Returns true if it was newly inserted.
    pub fn insert(&mut self, item: T) -> bool {
        if self.seen.insert(item.clone()) {
            self.order.push(item);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.seen.contains(item)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.order
    }
}

impl<T: Eq + std::hash::Hash + Clone> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

impl<T: Eq + std::hash::Hash + Clone + Serialize> Serialize for OrderedSet<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.order.serialize(serializer)
    }
}

impl<'de, T: Eq + std::hash::Hash + Clone + Deserialize<'de>> Deserialize<'de> for OrderedSet<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let items: Vec<T> = Vec::deserialize(deserializer)?;
        let mut set = OrderedSet::new();
        for item in items {
            set.insert(item);
        }
        Ok(set)
    }
}

/// One entry parsed from a wordlist file, per the grammar in the wordlist module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordlistEntry {
    /// `ServicePath` alone: the engine substitutes default + domain methods.
    Service(ServicePath),
    /// `ServicePath:Method1,Method2,...`: an explicit closed set of methods.
    ServiceWithMethods(ServicePath, Vec<MethodName>),
    /// `*MethodName`: applied to every service discovered or tried.
    GlobalMethod(MethodName),
}

/// The mode the orchestrator selected for reporting purposes; see
/// `orchestrator::select_scan_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    Reflection,
    Standard,
    Wordlist,
    Bruteforce,
    Direct,
}

impl std::fmt::Display for ScanMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ScanMode::Reflection => "reflection",
            ScanMode::Standard => "standard",
            ScanMode::Wordlist => "wordlist",
            ScanMode::Bruteforce => "bruteforce",
            ScanMode::Direct => "direct",
        };
        write!(f, "{s}")
    }
}

/// The full inventory discovered for one target.
///
/// Invariants (enforced by convention: the orchestrator is the only writer,
/// and `check_invariants` below asserts them in debug builds):
/// - every key of `methods_per_service` is a member of `services`
/// - `services` and each `methods_per_service` value contain no duplicates
/// - `reflection_enabled` is true iff reflection actually returned a
///   non-empty service list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub target: String,
    pub scan_mode: ScanMode,
    pub reflection_enabled: bool,
    pub services: Vec<ServicePath>,
    pub methods_per_service: BTreeMap<ServicePath, Vec<MethodName>>,
    pub health_status: BTreeMap<ServicePath, String>,
    pub errors: BTreeMap<String, String>,
    pub vulnerabilities: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ScanResult {
    pub fn new(target: impl Into<String>) -> Self {
        ScanResult {
            target: target.into(),
            scan_mode: ScanMode::Standard,
            reflection_enabled: false,
            services: Vec::new(),
            methods_per_service: BTreeMap::new(),
            health_status: BTreeMap::new(),
            errors: BTreeMap::new(),
            vulnerabilities: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Check the documented invariants; used by tests and as a debug assertion
    /// at the end of `orchestrator::scan_target`.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let service_set: std::collections::HashSet<&str> =
            self.services.iter().map(String::as_str).collect();
        if service_set.len() != self.services.len() {
            return Err("services contains duplicates".into());
        }
        for (svc, methods) in &self.methods_per_service {
            if !service_set.contains(svc.as_str()) {
                return Err(format!(
                    "methods_per_service key {svc:?} is not in services"
                ));
            }
            let method_set: std::collections::HashSet<&str> =
                methods.iter().map(String::as_str).collect();
            if method_set.len() != methods.len() {
                return Err(format!("methods for {svc:?} contains duplicates"));
            }
        }
        Ok(())
    }
}

/// Per-target result of the lightweight multi-target detector (see `detect` module).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectResult {
    pub target: String,
    pub is_grpc: bool,
    pub latency_ms: u64,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Apply the default port (`443`) to a target string missing a `:port` suffix.
///
/// IPv6 literals must already be bracketed by the caller (`[::1]:443`); this
/// function only looks for the last `:` outside of brackets.
pub fn normalize_endpoint(target: &str) -> String {
    if target.starts_with('[') {
        // Bracketed IPv6; only treat a `]:port` suffix as already having a port.
        if target.contains("]:") {
            return target.to_string();
        }
        return format!("{target}:443");
    }
    if target.contains(':') {
        target.to_string()
    } else {
        format!("{target}:443")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_set_preserves_insertion_order_and_dedups() {
        let mut set = OrderedSet::new();
        assert!(set.insert("b".to_string()));
        assert!(set.insert("a".to_string()));
        assert!(!set.insert("b".to_string()));
        assert_eq!(set.as_slice(), &["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn normalize_endpoint_adds_default_port() {
        assert_eq!(normalize_endpoint("example.com"), "example.com:443");
        assert_eq!(normalize_endpoint("example.com:8080"), "example.com:8080");
    }

    #[test]
    fn normalize_endpoint_handles_ipv6_literals() {
        assert_eq!(normalize_endpoint("[::1]"), "[::1]:443");
        assert_eq!(normalize_endpoint("[::1]:50051"), "[::1]:50051");
    }

    #[test]
    fn scan_result_invariants_catch_dangling_method_key() {
        let mut result = ScanResult::new("example.com:443");
        result
            .methods_per_service
            .insert("ghost.Service".to_string(), vec!["Get".to_string()]);
        assert!(result.check_invariants().is_err());
    }

    #[test]
    fn scan_result_invariants_pass_for_consistent_result() {
        let mut result = ScanResult::new("example.com:443");
        result.services.push("real.Service".to_string());
        result
            .methods_per_service
            .insert("real.Service".to_string(), vec!["Get".to_string()]);
        assert!(result.check_invariants().is_ok());
    }
}
