//! Indexed xDS resources handed to extensions.
//!
//! The control plane builds one [`IndexedResources`] per proxy and generation pass.
//! Resources are grouped by [`ResourceKind`] and keyed by name (clusters and routes
//! use their SNI-style name, listeners their listener name).

use std::collections::HashMap;
use std::fmt;

use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::listener::v3::Listener;
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;
use envoy_types::pb::google::protobuf::Any;
use prost::Message;

use crate::{Error, Result};

pub const CLUSTER_TYPE_URL: &str = "type.googleapis.com/envoy.config.cluster.v3.Cluster";
pub const ROUTE_TYPE_URL: &str = "type.googleapis.com/envoy.config.route.v3.RouteConfiguration";
pub const LISTENER_TYPE_URL: &str = "type.googleapis.com/envoy.config.listener.v3.Listener";

/// Resource kinds an extension may patch, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Cluster,
    Listener,
    RouteConfiguration,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] =
        [ResourceKind::Cluster, ResourceKind::Listener, ResourceKind::RouteConfiguration];

    pub fn type_url(self) -> &'static str {
        match self {
            ResourceKind::Cluster => CLUSTER_TYPE_URL,
            ResourceKind::Listener => LISTENER_TYPE_URL,
            ResourceKind::RouteConfiguration => ROUTE_TYPE_URL,
        }
    }

    pub fn from_type_url(type_url: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.type_url() == type_url)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Cluster => "cluster",
            ResourceKind::Listener => "listener",
            ResourceKind::RouteConfiguration => "route",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded xDS resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Cluster(Cluster),
    Listener(Listener),
    RouteConfiguration(RouteConfiguration),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Cluster(_) => ResourceKind::Cluster,
            Resource::Listener(_) => ResourceKind::Listener,
            Resource::RouteConfiguration(_) => ResourceKind::RouteConfiguration,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Resource::Cluster(cluster) => &cluster.name,
            Resource::Listener(listener) => &listener.name,
            Resource::RouteConfiguration(route) => &route.name,
        }
    }

    /// Decode a resource from its `Any` wrapper.
    pub fn from_any(any: &Any) -> Result<Self> {
        let kind = ResourceKind::from_type_url(&any.type_url)
            .ok_or_else(|| Error::UnknownTypeUrl(any.type_url.clone()))?;

        let decode_err =
            |source: prost::DecodeError| Error::Decode { type_url: any.type_url.clone(), source };

        let resource = match kind {
            ResourceKind::Cluster => {
                Resource::Cluster(Cluster::decode(&any.value[..]).map_err(decode_err)?)
            }
            ResourceKind::Listener => {
                Resource::Listener(Listener::decode(&any.value[..]).map_err(decode_err)?)
            }
            ResourceKind::RouteConfiguration => Resource::RouteConfiguration(
                RouteConfiguration::decode(&any.value[..]).map_err(decode_err)?,
            ),
        };

        Ok(resource)
    }

    pub fn to_any(&self) -> Any {
        let value = match self {
            Resource::Cluster(cluster) => cluster.encode_to_vec(),
            Resource::Listener(listener) => listener.encode_to_vec(),
            Resource::RouteConfiguration(route) => route.encode_to_vec(),
        };

        Any { type_url: self.kind().type_url().to_string(), value }
    }
}

impl From<Cluster> for Resource {
    fn from(cluster: Cluster) -> Self {
        Resource::Cluster(cluster)
    }
}

impl From<Listener> for Resource {
    fn from(listener: Listener) -> Self {
        Resource::Listener(listener)
    }
}

impl From<RouteConfiguration> for Resource {
    fn from(route: RouteConfiguration) -> Self {
        Resource::RouteConfiguration(route)
    }
}

/// Resources of one proxy, grouped by kind and keyed by name or SNI.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedResources {
    index: HashMap<ResourceKind, HashMap<String, Resource>>,
}

impl IndexedResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource under its own kind, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, resource: impl Into<Resource>) {
        let resource = resource.into();
        self.insert_as(resource.kind(), key, resource);
    }

    /// Insert a resource under an explicit kind.
    ///
    /// The caller is responsible for the kind matching the value; a mismatch is
    /// reported (and skipped) by the extender rather than rejected here.
    pub fn insert_as(&mut self, kind: ResourceKind, key: impl Into<String>, resource: Resource) {
        self.index.entry(kind).or_default().insert(key.into(), resource);
    }

    /// Decode an `Any` and index it under the resource's own name.
    pub fn insert_any(&mut self, any: &Any) -> Result<()> {
        let resource = Resource::from_any(any)?;
        let key = resource.name().to_string();
        self.insert(key, resource);
        Ok(())
    }

    pub fn get(&self, kind: ResourceKind, key: &str) -> Option<&Resource> {
        self.index.get(&kind).and_then(|resources| resources.get(key))
    }

    pub fn cluster(&self, key: &str) -> Option<&Cluster> {
        match self.get(ResourceKind::Cluster, key) {
            Some(Resource::Cluster(cluster)) => Some(cluster),
            _ => None,
        }
    }

    pub fn listener(&self, key: &str) -> Option<&Listener> {
        match self.get(ResourceKind::Listener, key) {
            Some(Resource::Listener(listener)) => Some(listener),
            _ => None,
        }
    }

    pub fn route(&self, key: &str) -> Option<&RouteConfiguration> {
        match self.get(ResourceKind::RouteConfiguration, key) {
            Some(Resource::RouteConfiguration(route)) => Some(route),
            _ => None,
        }
    }

    /// Iterate the entries of one kind. Order is unspecified.
    pub fn iter_kind(&self, kind: ResourceKind) -> impl Iterator<Item = (&String, &Resource)> {
        self.index.get(&kind).into_iter().flat_map(|resources| resources.iter())
    }

    /// Mutable access to the values of one kind. Keys cannot be added or removed.
    pub(crate) fn iter_kind_mut(
        &mut self,
        kind: ResourceKind,
    ) -> impl Iterator<Item = (&String, &mut Resource)> {
        self.index.get_mut(&kind).into_iter().flat_map(|resources| resources.iter_mut())
    }

    pub fn len(&self) -> usize {
        self.index.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encode every resource of one kind, e.g. to build a discovery response.
    pub fn to_any(&self, kind: ResourceKind) -> Vec<Any> {
        self.iter_kind(kind).map(|(_, resource)| resource.to_any()).collect()
    }
}

impl FromIterator<Resource> for IndexedResources {
    fn from_iter<T: IntoIterator<Item = Resource>>(iter: T) -> Self {
        let mut resources = IndexedResources::new();
        for resource in iter {
            let key = resource.name().to_string();
            resources.insert(key, resource);
        }
        resources
    }
}
