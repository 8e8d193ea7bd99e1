//! Envoy extension dispatch for indexed xDS resources.
//!
//! Some upstream integrations (serverless backends fronted by the mesh, for example)
//! need the generated resources rewritten after the fact. This module decides which
//! resources belong to the upstream an extension was declared on and hands them to
//! the integration's [`Patcher`].
//!
//! # Architecture
//!
//! - [`PatcherRegistry`] maps an extension name to a factory that builds a patcher
//!   from an [`ExtensionConfiguration`].
//! - [`Extender`] walks clusters, listeners and routes, matches them against the
//!   upstream, patches them and commits only successful results.
//! - [`listener`] holds the per-role filter chain traversal.
//! - [`runner`] applies every extension configured for a proxy and enforces the
//!   `required` policy.
//!
//! # Example
//!
//! ```rust,ignore
//! use envoy_extender::xds::extensions::{Extender, PatcherRegistry};
//!
//! let mut registry = PatcherRegistry::new();
//! registry.register("builtin/aws/lambda", |config| LambdaPatcher::from_config(config));
//!
//! let extender = Extender::new(registry);
//! if let Err(errors) = extender.extend(&mut resources, &config) {
//!     warn!(%errors, "some resources were left unpatched");
//! }
//! ```

mod dispatch;
pub mod listener;
pub mod runner;

pub use dispatch::Extender;
pub use runner::{runtime_configurations, ExtensionRunner, ProxySnapshot};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use envoy_types::pb::envoy::config::cluster::v3::Cluster;
use envoy_types::pb::envoy::config::listener::v3::Filter;
use envoy_types::pb::envoy::config::route::v3::RouteConfiguration;

use crate::errors::PatchError;
use crate::xds::extension::{ExtensionConfiguration, ServiceKind};

/// Outcome of a successful patch call.
#[derive(Debug, Clone, PartialEq)]
pub enum Patched<T> {
    /// The patcher produced a replacement value.
    Changed(T),
    /// Nothing to do; the caller keeps its original value.
    Unchanged,
}

impl<T> Patched<T> {
    pub fn is_changed(&self) -> bool {
        matches!(self, Patched::Changed(_))
    }
}

pub type PatchResult<T> = std::result::Result<Patched<T>, PatchError>;

/// Rewrites the resources of one integration.
///
/// Implementations receive borrowed inputs and return new values; they never mutate
/// in place. Methods an integration has no use for can keep the default, which
/// reports [`Patched::Unchanged`].
pub trait Patcher: Send + Sync {
    /// Whether this patcher supports proxies of the given role.
    fn can_patch(&self, kind: ServiceKind) -> bool;

    fn patch_cluster(&self, _cluster: &Cluster) -> PatchResult<Cluster> {
        Ok(Patched::Unchanged)
    }

    fn patch_route(&self, _route: &RouteConfiguration) -> PatchResult<RouteConfiguration> {
        Ok(Patched::Unchanged)
    }

    fn patch_filter(&self, _filter: &Filter) -> PatchResult<Filter> {
        Ok(Patched::Unchanged)
    }
}

type PatcherFactory =
    Arc<dyn Fn(&ExtensionConfiguration) -> Option<Box<dyn Patcher>> + Send + Sync>;

/// Extension name to patcher factory lookup.
#[derive(Clone, Default)]
pub struct PatcherRegistry {
    factories: HashMap<String, PatcherFactory>,
}

impl PatcherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one with the same name.
    ///
    /// The factory returns `None` when the configuration does not describe a usable
    /// integration (missing or malformed arguments).
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ExtensionConfiguration) -> Option<Box<dyn Patcher>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Build the patcher for a configuration, if its extension is registered and
    /// accepts the configuration.
    pub fn make_patcher(&self, config: &ExtensionConfiguration) -> Option<Box<dyn Patcher>> {
        let factory = self.factories.get(&config.envoy_extension.name)?;
        factory(config)
    }
}

impl fmt::Debug for PatcherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("PatcherRegistry").field("extensions", &names).finish()
    }
}
