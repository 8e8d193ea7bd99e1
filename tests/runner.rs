//! Integration tests for applying every extension configured for a proxy.

mod common;

use std::collections::HashMap;

use common::*;
use envoy_extender::config::ServiceDefaults;
use envoy_extender::xds::extensions::runtime_configurations;
use envoy_extender::xds::{EnvoyExtension, ExtensionRunner, ProxySnapshot, ServiceKind};
use envoy_extender::Error;
use tracing_test::traced_test;

fn runner(patcher: &RecordingPatcher) -> ExtensionRunner {
    ExtensionRunner::new(patcher.extender())
}

fn snapshot() -> ProxySnapshot {
    ProxySnapshot {
        service_name: "api".to_string(),
        kind: ServiceKind::ConnectProxy,
        upstreams: upstreams(),
    }
}

fn declared(extensions: Vec<EnvoyExtension>) -> HashMap<String, ServiceDefaults> {
    let mut defaults = HashMap::new();
    defaults.insert("db".to_string(), ServiceDefaults { envoy_extensions: extensions });
    defaults
}

#[test]
fn test_runner_applies_declared_extensions() {
    let patcher = RecordingPatcher::new();
    let configs =
        runtime_configurations(&snapshot(), &declared(vec![EnvoyExtension::new(TEST_EXTENSION)]));
    assert_eq!(configs.len(), 1);

    let mut resources = connect_proxy_resources();
    runner(&patcher).apply(&mut resources, &configs).unwrap();

    assert_eq!(resources.cluster(DB_SNI).unwrap().alt_stat_name, "patched");
    assert_eq!(resources.cluster(WEB_SNI).unwrap().alt_stat_name, "");
}

#[test]
fn test_required_extension_failure_aborts() {
    let patcher = RecordingPatcher::new().failing_on(DB_SNI);
    let configs = runtime_configurations(
        &snapshot(),
        &declared(vec![EnvoyExtension::new(TEST_EXTENSION).required(true)]),
    );

    let mut resources = connect_proxy_resources();
    let err = runner(&patcher).apply(&mut resources, &configs).unwrap_err();

    match err {
        Error::Extension { name, service, errors } => {
            assert_eq!(name, TEST_EXTENSION);
            assert_eq!(service, "db");
            assert_eq!(errors.len(), 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[traced_test]
#[test]
fn test_optional_extension_failure_keeps_partial_result() {
    let patcher = RecordingPatcher::new().failing_on(DB_SNI);
    let configs =
        runtime_configurations(&snapshot(), &declared(vec![EnvoyExtension::new(TEST_EXTENSION)]));

    let mut resources = connect_proxy_resources();
    runner(&patcher).apply(&mut resources, &configs).unwrap();

    // Cluster and route failed; the listener was still patched
    assert_eq!(resources.cluster(DB_SNI).unwrap().alt_stat_name, "");
    let db_listener = resources.listener("db:127.0.0.1:9191").unwrap();
    assert!(is_patched_filter(&db_listener.filter_chains[0].filters[0]));
    assert!(logs_contain("Optional envoy extension failed, keeping partial result"));
}

#[test]
fn test_unknown_required_extension_is_an_error() {
    let patcher = RecordingPatcher::new();
    let configs = runtime_configurations(
        &snapshot(),
        &declared(vec![EnvoyExtension::new("builtin/unknown").required(true)]),
    );

    let mut resources = connect_proxy_resources();
    let err = runner(&patcher).apply(&mut resources, &configs).unwrap_err();

    assert!(matches!(
        err,
        Error::ExtensionNotFound { ref name, ref service }
            if name == "builtin/unknown" && service == "db"
    ));
}

#[traced_test]
#[test]
fn test_unknown_optional_extension_is_skipped() {
    let patcher = RecordingPatcher::new();
    let configs = runtime_configurations(
        &snapshot(),
        &declared(vec![EnvoyExtension::new("builtin/unknown"), EnvoyExtension::new(TEST_EXTENSION)]),
    );

    let mut resources = connect_proxy_resources();
    runner(&patcher).apply(&mut resources, &configs).unwrap();

    assert!(logs_contain("Skipping unknown optional envoy extension"));
    assert_eq!(resources.cluster(DB_SNI).unwrap().alt_stat_name, "patched");
}

#[test]
fn test_required_failure_stops_later_extensions() {
    let patcher = RecordingPatcher::new().failing_on(DB_SNI);
    let mut later = EnvoyExtension::new(TEST_EXTENSION);
    later.arguments.insert("second".to_string(), true.into());

    let configs = runtime_configurations(
        &snapshot(),
        &declared(vec![EnvoyExtension::new(TEST_EXTENSION).required(true), later]),
    );
    assert_eq!(configs.len(), 2);

    let mut resources = connect_proxy_resources();
    assert!(runner(&patcher).apply(&mut resources, &configs).is_err());

    // Only the first configuration ran: cluster, listener filter, route
    assert_eq!(patcher.visited().len(), 3);
}
