//! The extension dispatcher.

use tracing::{debug, warn};

use super::listener::patch_listener;
use super::{PatchResult, Patched, Patcher, PatcherRegistry};
use crate::errors::{ExtensionError, ExtensionErrors, PatchError};
use crate::observability::metrics::{MetricsRecorder, PatchStatus};
use crate::xds::extension::{ExtensionConfiguration, ServiceKind};
use crate::xds::resources::{IndexedResources, Resource, ResourceKind};

/// Applies registered patchers to the resources of one upstream.
#[derive(Debug, Clone, Default)]
pub struct Extender {
    registry: PatcherRegistry,
    metrics: MetricsRecorder,
}

impl Extender {
    pub fn new(registry: PatcherRegistry) -> Self {
        Self { registry, metrics: MetricsRecorder::new() }
    }

    pub fn registry(&self) -> &PatcherRegistry {
        &self.registry
    }

    /// Patch every resource in `resources` that belongs to the configured upstream.
    ///
    /// Each failed attempt is recorded and skipped; the resource keeps the value it had
    /// before the attempt. Successful patches are committed even when other resources
    /// fail, so on `Err` the index is partially patched. Only values are replaced; the
    /// set of keys never changes.
    pub fn extend(
        &self,
        resources: &mut IndexedResources,
        config: &ExtensionConfiguration,
    ) -> Result<(), ExtensionErrors> {
        if !matches!(config.kind, ServiceKind::TerminatingGateway | ServiceKind::ConnectProxy) {
            return Ok(());
        }

        if !config.is_upstream() {
            return Ok(());
        }

        let Some(patcher) = self.registry.make_patcher(config) else {
            debug!(
                extension = %config.envoy_extension.name,
                service = %config.service_name,
                "No patcher applies to extension configuration"
            );
            return Ok(());
        };

        if !patcher.can_patch(config.kind) {
            debug!(
                extension = %config.envoy_extension.name,
                kind = %config.kind,
                "Patcher does not support proxy kind"
            );
            return Ok(());
        }

        let mut errors = Vec::new();
        for kind in ResourceKind::ALL {
            for (name, resource) in resources.iter_kind_mut(kind) {
                self.patch_resource(config, patcher.as_ref(), kind, name, resource, &mut errors);
            }
        }

        match ExtensionErrors::from_vec(errors) {
            None => Ok(()),
            Some(errors) => {
                warn!(
                    extension = %config.envoy_extension.name,
                    service = %config.service_name,
                    failures = errors.len(),
                    "Extension left some resources unpatched"
                );
                Err(errors)
            }
        }
    }

    /// Patch one indexed entry in place, recording failures in `errors`.
    fn patch_resource(
        &self,
        config: &ExtensionConfiguration,
        patcher: &dyn Patcher,
        kind: ResourceKind,
        name: &str,
        resource: &mut Resource,
        errors: &mut Vec<ExtensionError>,
    ) {
        match (kind, &*resource) {
            (ResourceKind::Cluster, Resource::Cluster(cluster)) => {
                if !config.matches_upstream_service_sni(name) {
                    return;
                }
                let outcome = patcher.patch_cluster(cluster);
                if let Some(source) = self.commit(kind, name, resource, outcome, Resource::Cluster)
                {
                    errors.push(ExtensionError::Cluster { name: name.to_string(), source });
                }
            }
            (ResourceKind::RouteConfiguration, Resource::RouteConfiguration(route)) => {
                if !config.matches_upstream_service_sni(name) {
                    return;
                }
                let outcome = patcher.patch_route(route);
                if let Some(source) =
                    self.commit(kind, name, resource, outcome, Resource::RouteConfiguration)
                {
                    errors.push(ExtensionError::Route { name: name.to_string(), source });
                }
            }
            (ResourceKind::Listener, Resource::Listener(listener)) => {
                let patch = patch_listener(config, listener, patcher);
                if !patch.errors.is_empty() {
                    self.metrics.record_patch(kind, PatchStatus::Error);
                }
                errors.extend(patch.errors);

                if let Some(listener) = patch.listener {
                    debug!(listener = %name, "Committing patched listener");
                    self.metrics.record_patch(kind, PatchStatus::Patched);
                    *resource = Resource::Listener(listener);
                }
            }
            (expected, other) => {
                self.metrics.record_patch(expected, PatchStatus::Error);
                errors.push(ExtensionError::KindMismatch {
                    name: name.to_string(),
                    expected,
                    found: other.kind(),
                });
            }
        }
    }

    /// Write a cluster or route patch back into the index.
    fn commit<T>(
        &self,
        kind: ResourceKind,
        name: &str,
        resource: &mut Resource,
        outcome: PatchResult<T>,
        wrap: fn(T) -> Resource,
    ) -> Option<PatchError> {
        match outcome {
            Ok(Patched::Changed(value)) => {
                debug!(%kind, resource = %name, "Committing patched resource");
                self.metrics.record_patch(kind, PatchStatus::Patched);
                *resource = wrap(value);
                None
            }
            Ok(Patched::Unchanged) => {
                self.metrics.record_patch(kind, PatchStatus::Unchanged);
                None
            }
            Err(error) => {
                self.metrics.record_patch(kind, PatchStatus::Error);
                Some(error)
            }
        }
    }
}
