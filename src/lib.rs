//! # envoy-extender
//!
//! Applies Envoy extension patches to the xDS resources a control plane generated
//! for one proxy.
//!
//! Some upstream integrations cannot work with the resources the control plane
//! produces on its own. A serverless function fronted by the mesh, for example,
//! needs its cluster retargeted and an HTTP filter inserted in front of it. Those
//! rewrites are owned by integration-specific [`Patcher`](xds::Patcher)s; this crate
//! decides which resources belong to the upstream an extension was declared on,
//! which patch operations apply for the proxy's role, and how failures are handled.
//!
//! ## Architecture
//!
//! ```text
//! ProxySnapshot + service defaults
//!          ↓ runtime_configurations
//! ExtensionConfiguration (one per upstream and extension)
//!          ↓ ExtensionRunner::apply (required/optional policy)
//! Extender::extend ──→ PatcherRegistry ──→ Patcher
//!          ↓
//! IndexedResources, patched in place
//! ```
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use envoy_extender::xds::{Extender, ExtensionRunner, PatcherRegistry};
//! use envoy_extender::xds::extensions::runtime_configurations;
//!
//! let mut registry = PatcherRegistry::new();
//! registry.register("builtin/aws/lambda", LambdaPatcher::from_config);
//!
//! let runner = ExtensionRunner::new(Extender::new(registry));
//! let configs = runtime_configurations(&snapshot, &settings.service_defaults);
//! runner.apply(&mut resources, &configs)?;
//! ```

pub mod config;
pub mod errors;
pub mod observability;
pub mod xds;

// Re-export commonly used types and traits
pub use config::AppConfig;
pub use errors::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_available() {
        assert!(!VERSION.is_empty());
        assert_eq!(APP_NAME, "envoy-extender");
    }
}
