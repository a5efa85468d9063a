mod common;

use common::server::TestServer;
use common::{assert_exit_code, assert_output_contains, run};

/// Scenario 1: reflection disabled, empty wordlist. The seed service list
/// still finds Greeter and Health.
#[test]
#[ignore]
fn discovers_seed_services_via_bruteforce() {
    let server = TestServer::start_without_reflection();

    let result = run(&["scan", "-plaintext", &server.addr]);

    assert_exit_code(&result, 0);
    assert_output_contains(&result, "helloworld.Greeter");
    assert_output_contains(&result, "grpc.health.v1.Health");
    assert_output_contains(&result, "bruteforce");
    assert_output_contains(&result, "SayHello");
    assert_output_contains(&result, "Check");
}
