// Each integration test file is compiled as its own independent binary crate,
// each pulling in its own copy of this module.
// Helpers used by some test binaries but not others trigger false "dead code" warnings
// in the binaries that don't call them. Allow dead_code to silence these per-binary
// false positives.
#![allow(dead_code)]

pub mod server;

use std::path::PathBuf;
use std::process::{Command, Output};

/// Result of running the grpc-scan binary.
pub struct RunResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl RunResult {
    fn from_output(output: Output) -> Self {
        RunResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        }
    }

    /// Combined stdout + stderr.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Path to the compiled grpc-scan binary (set by Cargo for [[bin]] targets).
pub fn grpc_scan_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_grpc-scan"))
}

/// Run the grpc-scan binary with the given arguments.
pub fn run(args: &[&str]) -> RunResult {
    let output = Command::new(grpc_scan_bin())
        .args(args)
        .output()
        .expect("failed to execute grpc-scan binary");
    RunResult::from_output(output)
}

/// Run the grpc-scan binary, feeding `stdin_input` on its standard input.
pub fn run_with_stdin(args: &[&str], stdin_input: &str) -> RunResult {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = Command::new(grpc_scan_bin())
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn grpc-scan binary");

    child
        .stdin
        .take()
        .expect("child stdin not piped")
        .write_all(stdin_input.as_bytes())
        .expect("failed to write to child stdin");

    let output = child
        .wait_with_output()
        .expect("failed to wait on grpc-scan binary");
    RunResult::from_output(output)
}

// -- Assertion helpers --------------------------------------------------------

/// Assert the exit code matches.
pub fn assert_exit_code(result: &RunResult, expected: i32) {
    assert_eq!(
        result.exit_code, expected,
        "Expected exit code {expected}, got {}.\nstdout: {}\nstderr: {}",
        result.exit_code, result.stdout, result.stderr,
    );
}

/// Assert stdout contains a substring.
pub fn assert_stdout_contains(result: &RunResult, needle: &str) {
    assert!(
        result.stdout.contains(needle),
        "Expected stdout to contain {needle:?}.\nstdout: {}\nstderr: {}",
        result.stdout,
        result.stderr,
    );
}

/// Assert combined output (stdout+stderr) contains a substring (case-insensitive).
pub fn assert_output_contains(result: &RunResult, needle: &str) {
    let combined = result.combined().to_lowercase();
    assert!(
        combined.contains(&needle.to_lowercase()),
        "Expected output to contain {needle:?} (case-insensitive).\nstdout: {}\nstderr: {}",
        result.stdout,
        result.stderr,
    );
}

/// Assert combined output does NOT contain a substring.
pub fn assert_output_not_contains(result: &RunResult, needle: &str) {
    let combined = result.combined();
    assert!(
        !combined.contains(needle),
        "Expected output NOT to contain {needle:?}.\nstdout: {}\nstderr: {}",
        result.stdout,
        result.stderr,
    );
}

/// Assert stdout exactly equals expected string.
pub fn assert_stdout_eq(result: &RunResult, expected: &str) {
    assert_eq!(
        result.stdout, expected,
        "stdout does not match expected.\nstderr: {}",
        result.stderr,
    );
}
