//! Applies every extension declared for a proxy's upstreams.
//!
//! The control plane calls [`runtime_configurations`] once per proxy snapshot to
//! expand the declared extensions into per-upstream configurations, then hands them
//! to [`ExtensionRunner::apply`]. The runner is where the `required` flag of an
//! extension is enforced: the extender itself never fails a pass.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::Extender;
use crate::config::ServiceDefaults;
use crate::observability::metrics::MetricsRecorder;
use crate::xds::extension::{ExtensionConfiguration, ServiceKind, UpstreamData};
use crate::xds::resources::IndexedResources;
use crate::{Error, Result};

/// What the control plane knows about the proxy being configured.
#[derive(Debug, Clone, Default)]
pub struct ProxySnapshot {
    /// Service the proxy represents
    pub service_name: String,
    pub kind: ServiceKind,
    /// Upstreams of the proxy, keyed by service name
    pub upstreams: HashMap<String, UpstreamData>,
}

/// Expand the extensions declared on a snapshot's upstreams into one configuration
/// per (upstream, extension) pair.
///
/// Upstreams are visited in name order and extensions in declaration order.
pub fn runtime_configurations(
    snapshot: &ProxySnapshot,
    service_defaults: &HashMap<String, ServiceDefaults>,
) -> Vec<ExtensionConfiguration> {
    let mut services: Vec<&String> = snapshot.upstreams.keys().collect();
    services.sort();

    services
        .into_iter()
        .filter_map(|service| service_defaults.get(service).map(|defaults| (service, defaults)))
        .flat_map(|(service, defaults)| {
            defaults.envoy_extensions.iter().map(move |extension| ExtensionConfiguration {
                envoy_extension: extension.clone(),
                service_name: service.clone(),
                upstreams: snapshot.upstreams.clone(),
                kind: snapshot.kind,
            })
        })
        .collect()
}

/// Runs extension configurations against a proxy's resources.
#[derive(Debug, Clone, Default)]
pub struct ExtensionRunner {
    extender: Extender,
    metrics: MetricsRecorder,
}

impl ExtensionRunner {
    pub fn new(extender: Extender) -> Self {
        Self { extender, metrics: MetricsRecorder::new() }
    }

    /// Apply each configuration in order.
    ///
    /// A required extension that is not registered, or that fails to patch any
    /// resource, fails the whole pass. Failures of optional extensions are logged and
    /// whatever they did manage to patch is kept.
    pub fn apply(
        &self,
        resources: &mut IndexedResources,
        configs: &[ExtensionConfiguration],
    ) -> Result<()> {
        for config in configs {
            let extension = &config.envoy_extension;
            let _span = crate::extension_span!(
                extension.name,
                config.service_name,
                required = extension.required
            )
            .entered();

            if !self.extender.registry().contains(&extension.name) {
                self.metrics.record_extension_run(&extension.name, false);
                if extension.required {
                    return Err(Error::ExtensionNotFound {
                        name: extension.name.clone(),
                        service: config.service_name.clone(),
                    });
                }
                warn!("Skipping unknown optional envoy extension");
                continue;
            }

            match self.extender.extend(resources, config) {
                Ok(()) => {
                    self.metrics.record_extension_run(&extension.name, true);
                    debug!("Applied envoy extension");
                }
                Err(errors) => {
                    self.metrics.record_extension_run(&extension.name, false);
                    if extension.required {
                        return Err(Error::Extension {
                            name: extension.name.clone(),
                            service: config.service_name.clone(),
                            errors,
                        });
                    }
                    warn!(%errors, "Optional envoy extension failed, keeping partial result");
                }
            }
        }

        Ok(())
    }
}
