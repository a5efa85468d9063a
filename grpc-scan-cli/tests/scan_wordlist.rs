mod common;

use std::io::Write;

use common::server::TestServer;
use common::{assert_exit_code, assert_output_contains, assert_output_not_contains, run};

fn write_wordlist(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("failed to create temp wordlist");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp wordlist");
    file
}

/// Scenario 3: an explicit service/methods wordlist entry confirms the
/// three implemented methods and leaves the unimplemented one absent.
#[test]
#[ignore]
fn confirms_wordlist_methods_and_rejects_unknown_method() {
    let server = TestServer::start_without_reflection();
    let wordlist = write_wordlist("proto.UserService:Login,Register,GetProfile,Logout\n");

    let result = run(&[
        "scan",
        "-plaintext",
        "--wordlist",
        wordlist.path().to_str().unwrap(),
        &server.addr,
    ]);

    assert_exit_code(&result, 0);
    assert_output_contains(&result, "proto.UserService");
    assert_output_contains(&result, "Login");
    assert_output_contains(&result, "Register");
    assert_output_contains(&result, "GetProfile");
    assert_output_not_contains(&result, "Logout");
}

/// Scenario 4: a global `*GetById` method entry finds it confirmed under
/// both services that implement it.
#[test]
#[ignore]
fn global_method_entry_is_confirmed_under_every_service() {
    let server = TestServer::start_without_reflection();
    let wordlist = write_wordlist("proto.UserService\nproto.ProductService\n*GetById\n");

    let result = run(&[
        "scan",
        "-plaintext",
        "--wordlist",
        wordlist.path().to_str().unwrap(),
        &server.addr,
    ]);

    assert_exit_code(&result, 0);
    assert_output_contains(&result, "proto.UserService");
    assert_output_contains(&result, "proto.ProductService");
}
