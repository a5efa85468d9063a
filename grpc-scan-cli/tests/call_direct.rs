mod common;

use common::server::TestServer;
use common::{assert_exit_code, assert_output_contains, run};

/// Scenario 6: a direct call against an auth-gated method confirms the
/// method exists even though the server rejects the call for lacking
/// credentials.
#[test]
#[ignore]
fn confirms_auth_gated_method_without_credentials() {
    let server = TestServer::start_without_reflection();

    let result = run(&[
        "call",
        "-plaintext",
        &server.addr,
        "proto.UserService/GetUser",
    ]);

    assert_exit_code(&result, 0);
    assert_output_contains(&result, "MethodConfirmed");
}

/// A call against a method the server never registered is rejected.
#[test]
#[ignore]
fn rejects_unknown_method() {
    let server = TestServer::start_without_reflection();

    let result = run(&[
        "call",
        "-plaintext",
        &server.addr,
        "proto.UserService/Logout",
    ]);

    assert_exit_code(&result, 1);
}
