//! Per-upstream extension configuration.
//!
//! An [`ExtensionConfiguration`] is built once per (upstream, declared extension)
//! pair for the proxy being configured. It is read-only to the extender.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Role of the proxy whose resources are being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    /// Plain service without a proxy role
    #[default]
    #[serde(rename = "")]
    Typical,
    ConnectProxy,
    MeshGateway,
    TerminatingGateway,
    IngressGateway,
    ApiGateway,
}

impl ServiceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKind::Typical => "typical",
            ServiceKind::ConnectProxy => "connect-proxy",
            ServiceKind::MeshGateway => "mesh-gateway",
            ServiceKind::TerminatingGateway => "terminating-gateway",
            ServiceKind::IngressGateway => "ingress-gateway",
            ServiceKind::ApiGateway => "api-gateway",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An Envoy extension declared on a service.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct EnvoyExtension {
    /// Registered extension name, e.g. `builtin/aws/lambda`
    #[validate(length(min = 1, message = "Extension name cannot be empty"))]
    pub name: String,

    /// Whether a failure to apply this extension fails the whole generation pass
    #[serde(default)]
    pub required: bool,

    /// Free-form arguments interpreted by the extension's patcher factory
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl EnvoyExtension {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_argument<K: Into<String>>(mut self, key: K, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn argument_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(Value::as_str)
    }
}

/// What the proxy knows about one of its upstreams.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpstreamData {
    /// Server names (cluster names) that identify this upstream's resources
    #[serde(default)]
    pub sni: HashSet<String>,

    /// Proxy-local ID of the upstream, the prefix of its outbound listener name
    #[serde(default)]
    pub envoy_id: String,

    /// Role of the proxy that fronts the upstream, if any
    #[serde(default)]
    pub outgoing_proxy_kind: ServiceKind,
}

impl UpstreamData {
    pub fn new<S: Into<String>>(envoy_id: S) -> Self {
        Self { envoy_id: envoy_id.into(), ..Default::default() }
    }

    pub fn with_sni<S: Into<String>>(mut self, sni: S) -> Self {
        self.sni.insert(sni.into());
        self
    }
}

/// Configuration for applying one extension on behalf of one upstream service.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtensionConfiguration {
    pub envoy_extension: EnvoyExtension,

    /// The upstream service the extension was declared on
    pub service_name: String,

    /// Every upstream of the proxy being configured
    pub upstreams: HashMap<String, UpstreamData>,

    /// Role of the proxy being configured
    pub kind: ServiceKind,
}

impl ExtensionConfiguration {
    /// Whether the extension's service is an upstream of this proxy.
    pub fn is_upstream(&self) -> bool {
        self.upstreams.contains_key(&self.service_name)
    }

    /// Whether `sni` names a resource of the extension's upstream service.
    pub fn matches_upstream_service_sni(&self, sni: &str) -> bool {
        self.upstream().is_some_and(|upstream| upstream.sni.contains(sni))
    }

    /// Proxy-local ID of the extension's upstream service, empty if not an upstream.
    pub fn envoy_id(&self) -> &str {
        self.upstream().map(|upstream| upstream.envoy_id.as_str()).unwrap_or_default()
    }

    pub fn outgoing_proxy_kind(&self) -> ServiceKind {
        self.upstream().map(|upstream| upstream.outgoing_proxy_kind).unwrap_or_default()
    }

    fn upstream(&self) -> Option<&UpstreamData> {
        self.upstreams.get(&self.service_name)
    }
}
