mod common;

use std::net::TcpListener;

use common::server::TestServer;
use common::{assert_exit_code, assert_output_contains, run, run_with_stdin};

/// Scenario 5: detect against a real gRPC endpoint, a plain TCP listener that
/// never speaks HTTP/2, and a closed port. Detect reports them independently
/// instead of letting one target's failure affect another's.
#[test]
#[ignore]
fn detects_mixed_targets_independently() {
    let server = TestServer::start_without_reflection();

    // A listener that accepts connections but never speaks gRPC or even HTTP/2.
    let plain_listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind plain listener");
    let plain_addr = format!("localhost:{}", plain_listener.local_addr().unwrap().port());
    let _plain_thread = std::thread::spawn(move || {
        for stream in plain_listener.incoming() {
            drop(stream);
        }
    });

    // A port nothing is listening on.
    let closed_listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind closed port");
    let closed_addr = format!("localhost:{}", closed_listener.local_addr().unwrap().port());
    drop(closed_listener);

    let result = run(&[
        "detect",
        "-plaintext",
        "--target",
        &server.addr,
        "--target",
        &plain_addr,
        "--target",
        &closed_addr,
    ]);

    assert_exit_code(&result, 0);
    assert_output_contains(&result, &server.addr);
    assert_output_contains(&result, &plain_addr);
    assert_output_contains(&result, &closed_addr);
}

/// When neither `--target` nor `--targets` is given, detect reads targets
/// from standard input, one per line.
#[test]
#[ignore]
fn reads_targets_from_stdin_when_no_flag_given() {
    let server = TestServer::start_without_reflection();

    let result = run_with_stdin(
        &["detect", "-plaintext"],
        &format!("{}\n# a comment\n\n", server.addr),
    );

    assert_exit_code(&result, 0);
    assert_output_contains(&result, &server.addr);
    assert_output_contains(&result, "gRPC");
}
