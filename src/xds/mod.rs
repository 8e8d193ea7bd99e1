//! Envoy xDS resources and the extensions that rewrite them.
//!
//! - [`resources`]: the per-proxy resource index (clusters, listeners, routes)
//! - [`extension`]: per-upstream extension configuration
//! - [`extensions`]: patcher registry, dispatcher and extension runner

pub mod extension;
pub mod extensions;
pub mod resources;

pub use extension::{EnvoyExtension, ExtensionConfiguration, ServiceKind, UpstreamData};
pub use extensions::{Extender, ExtensionRunner, Patched, Patcher, PatcherRegistry, ProxySnapshot};
pub use resources::{IndexedResources, Resource, ResourceKind};
