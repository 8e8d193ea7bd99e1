//! A patcher that records what it was asked to patch.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use envoy_extender::errors::PatchError;
use envoy_extender::xds::extensions::PatchResult;
use envoy_extender::xds::{Extender, Patched, Patcher, PatcherRegistry, ServiceKind};
use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::listener::v3::filter::ConfigType;
use envoy_types::pb::envoy::config::listener::v3::Filter;
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;
use envoy_types::pb::google::protobuf::Any;

pub const TEST_EXTENSION: &str = "test/recording";
pub const PATCHED_TYPE_URL: &str = "type.googleapis.com/test.Patched";
pub const PATCHED_STAT_NAME: &str = "patched";
pub const PATCHED_HEADER: &str = "x-patched";

/// Idempotent patcher: clusters get `alt_stat_name = "patched"`, routes get a
/// removed response header, filters get a marker typed config. Names listed in
/// `failing` fail instead.
#[derive(Clone, Default)]
pub struct RecordingPatcher {
    pub kinds: HashSet<ServiceKind>,
    pub failing: HashSet<String>,
    visited: Arc<Mutex<Vec<String>>>,
}

impl RecordingPatcher {
    pub fn new() -> Self {
        Self {
            kinds: [ServiceKind::ConnectProxy, ServiceKind::TerminatingGateway].into(),
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn only_for(mut self, kinds: &[ServiceKind]) -> Self {
        self.kinds = kinds.iter().copied().collect();
        self
    }

    /// Names of every resource or filter passed to a patch method so far.
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn registry(&self) -> PatcherRegistry {
        let patcher = self.clone();
        let mut registry = PatcherRegistry::new();
        registry.register(TEST_EXTENSION, move |_| Some(Box::new(patcher.clone()) as Box<dyn Patcher>));
        registry
    }

    pub fn extender(&self) -> Extender {
        Extender::new(self.registry())
    }

    fn visit(&self, name: &str) -> Result<(), PatchError> {
        self.visited.lock().unwrap().push(name.to_string());
        if self.failing.contains(name) {
            return Err(PatchError::new(format!("cannot patch {name}")));
        }
        Ok(())
    }
}

impl Patcher for RecordingPatcher {
    fn can_patch(&self, kind: ServiceKind) -> bool {
        self.kinds.contains(&kind)
    }

    fn patch_cluster(&self, cluster: &Cluster) -> PatchResult<Cluster> {
        self.visit(&cluster.name)?;
        if cluster.alt_stat_name == PATCHED_STAT_NAME {
            return Ok(Patched::Unchanged);
        }
        Ok(Patched::Changed(Cluster {
            alt_stat_name: PATCHED_STAT_NAME.to_string(),
            ..cluster.clone()
        }))
    }

    fn patch_route(&self, route: &RouteConfiguration) -> PatchResult<RouteConfiguration> {
        self.visit(&route.name)?;
        if route.response_headers_to_remove.iter().any(|h| h == PATCHED_HEADER) {
            return Ok(Patched::Unchanged);
        }
        let mut patched = route.clone();
        patched.response_headers_to_remove.push(PATCHED_HEADER.to_string());
        Ok(Patched::Changed(patched))
    }

    fn patch_filter(&self, filter: &Filter) -> PatchResult<Filter> {
        self.visit(&filter.name)?;
        if is_patched_filter(filter) {
            return Ok(Patched::Unchanged);
        }
        Ok(Patched::Changed(Filter {
            name: filter.name.clone(),
            config_type: Some(ConfigType::TypedConfig(Any {
                type_url: PATCHED_TYPE_URL.to_string(),
                value: Vec::new(),
            })),
        }))
    }
}

pub fn is_patched_filter(filter: &Filter) -> bool {
    matches!(
        &filter.config_type,
        Some(ConfigType::TypedConfig(any)) if any.type_url == PATCHED_TYPE_URL
    )
}
