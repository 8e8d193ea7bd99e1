//! Builders for xDS resources and extension configurations.

use std::collections::HashMap;

use envoy_extender::xds::{
    EnvoyExtension, ExtensionConfiguration, IndexedResources, ServiceKind, UpstreamData,
};
use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::listener::v3::{Filter, FilterChain, FilterChainMatch, Listener};
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;

use super::TEST_EXTENSION;

pub const DB_SNI: &str = "db.default.dc1.internal.11111111.consul";
pub const WEB_SNI: &str = "web.default.dc1.internal.11111111.consul";
pub const TCP_PROXY: &str = "envoy.filters.network.tcp_proxy";
pub const HCM: &str = "envoy.filters.network.http_connection_manager";

pub fn cluster(name: &str) -> Cluster {
    Cluster { name: name.to_string(), ..Default::default() }
}

pub fn route(name: &str) -> RouteConfiguration {
    RouteConfiguration { name: name.to_string(), ..Default::default() }
}

pub fn filter(name: &str) -> Filter {
    Filter { name: name.to_string(), config_type: None }
}

pub fn filter_chain(server_names: &[&str], filters: &[&str]) -> FilterChain {
    let filter_chain_match = if server_names.is_empty() {
        None
    } else {
        Some(FilterChainMatch {
            server_names: server_names.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        })
    };

    FilterChain {
        filter_chain_match,
        filters: filters.iter().map(|name| filter(name)).collect(),
        ..Default::default()
    }
}

pub fn listener(name: &str, filter_chains: Vec<FilterChain>) -> Listener {
    Listener { name: name.to_string(), filter_chains, ..Default::default() }
}

/// Upstreams `db` (the extension's service) and `web`.
pub fn upstreams() -> HashMap<String, UpstreamData> {
    let mut upstreams = HashMap::new();
    upstreams.insert("db".to_string(), UpstreamData::new("db").with_sni(DB_SNI));
    upstreams.insert("web".to_string(), UpstreamData::new("web").with_sni(WEB_SNI));
    upstreams
}

/// Configuration of the test extension declared on `db`.
pub fn config(kind: ServiceKind) -> ExtensionConfiguration {
    config_for(kind, "db")
}

pub fn config_for(kind: ServiceKind, service: &str) -> ExtensionConfiguration {
    ExtensionConfiguration {
        envoy_extension: EnvoyExtension::new(TEST_EXTENSION),
        service_name: service.to_string(),
        upstreams: upstreams(),
        kind,
    }
}

/// Clusters and routes for `db` and `web`, plus one outbound listener per upstream.
pub fn connect_proxy_resources() -> IndexedResources {
    let mut resources = IndexedResources::new();
    resources.insert(DB_SNI, cluster(DB_SNI));
    resources.insert(WEB_SNI, cluster(WEB_SNI));
    resources.insert(DB_SNI, route(DB_SNI));
    resources.insert(WEB_SNI, route(WEB_SNI));
    resources.insert(
        "db:127.0.0.1:9191",
        listener("db:127.0.0.1:9191", vec![filter_chain(&[], &[HCM])]),
    );
    resources.insert(
        "web:127.0.0.1:9292",
        listener("web:127.0.0.1:9292", vec![filter_chain(&[], &[HCM])]),
    );
    resources
}
