mod common;

use common::server::TestServer;
use common::{assert_exit_code, assert_output_contains, run};

/// Scenario 2: same target with reflection enabled. The scan mode switches
/// to reflection and still reports the same services.
#[test]
#[ignore]
fn discovers_services_via_reflection() {
    let server = TestServer::start();

    let result = run(&["scan", "-plaintext", &server.addr]);

    assert_exit_code(&result, 0);
    assert_output_contains(&result, "reflection=true");
    assert_output_contains(&result, "mode=reflection");
    assert_output_contains(&result, "helloworld.Greeter");
    assert_output_contains(&result, "grpc.health.v1.Health");
    assert_output_contains(&result, "SayHello");
    assert_output_contains(&result, "Check");
}

/// Reflection being enabled is itself flagged as an observation.
#[test]
#[ignore]
fn flags_reflection_enabled_as_an_observation() {
    let server = TestServer::start();

    let result = run(&["scan", "-plaintext", &server.addr]);

    assert_exit_code(&result, 0);
    assert_output_contains(&result, "reflection is enabled");
}
