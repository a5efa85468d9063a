use std::io::Write;

use grpc_scan_core::{DetectResult, ScanResult};

/// Render a single-target `ScanResult` as a human-readable report: header
/// with target/mode/count, then each service with its indented methods.
pub fn render_scan_human(result: &ScanResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} — mode={} reflection={} services={}\n",
        result.target,
        result.scan_mode,
        result.reflection_enabled,
        result.services.len()
    ));
    for service in &result.services {
        out.push_str(&format!("  {service}\n"));
        if let Some(methods) = result.methods_per_service.get(service) {
            for method in methods {
                out.push_str(&format!("    {method}\n"));
            }
        }
    }
    if !result.vulnerabilities.is_empty() {
        out.push_str("  observations:\n");
        for v in &result.vulnerabilities {
            out.push_str(&format!("    - {v}\n"));
        }
    }
    if !result.errors.is_empty() {
        out.push_str("  errors:\n");
        for (key, msg) in &result.errors {
            out.push_str(&format!("    {key}: {msg}\n"));
        }
    }
    out
}

/// One service path per line; the `--simple` output format.
pub fn render_scan_simple(result: &ScanResult) -> String {
    result
        .services
        .iter()
        .map(|s| format!("{s}\n"))
        .collect()
}

pub fn render_scan_json(result: &ScanResult) -> grpc_scan_core::Result<String> {
    serde_json::to_string_pretty(result)
        .map_err(|e| grpc_scan_core::ScanError::Other(Box::new(e)))
}

/// Render a multi-target detect run as a human-readable report.
pub fn render_detect_human(results: &[DetectResult]) -> String {
    let mut out = String::new();
    for result in results {
        let status = if result.is_grpc { "gRPC" } else { "not gRPC" };
        out.push_str(&format!(
            "{} — {} ({} ms)",
            result.target, status, result.latency_ms
        ));
        if let Some(ref err) = result.error {
            out.push_str(&format!(" [{err}]"));
        }
        out.push('\n');
    }
    out
}

pub fn render_detect_json(results: &[DetectResult]) -> grpc_scan_core::Result<String> {
    serde_json::to_string_pretty(results)
        .map_err(|e| grpc_scan_core::ScanError::Other(Box::new(e)))
}

/// Write `content` to `path` if given, otherwise to stdout.
pub fn write_report(content: &str, path: Option<&str>) -> std::io::Result<()> {
    match path {
        Some(path) => std::fs::write(path, content),
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(content.as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_result() -> ScanResult {
        let mut result = ScanResult::new("example.com:443");
        result.services.push("helloworld.Greeter".to_string());
        result
            .methods_per_service
            .insert("helloworld.Greeter".to_string(), vec!["SayHello".to_string()]);
        result
    }

    #[test]
    fn human_report_includes_target_and_methods() {
        let result = sample_result();
        let rendered = render_scan_human(&result);
        assert!(rendered.contains("example.com:443"));
        assert!(rendered.contains("helloworld.Greeter"));
        assert!(rendered.contains("SayHello"));
    }

    #[test]
    fn simple_report_is_one_service_per_line() {
        let result = sample_result();
        let rendered = render_scan_simple(&result);
        assert_eq!(rendered, "helloworld.Greeter\n");
    }

    #[test]
    fn json_report_round_trips() {
        let result = sample_result();
        let json = render_scan_json(&result).unwrap();
        let parsed: ScanResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.target, result.target);
        assert_eq!(parsed.services, result.services);
        let _ = BTreeMap::<String, String>::new();
    }
}
