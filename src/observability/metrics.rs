//! # Metrics Collection
//!
//! Counters for extension dispatch, recorded through the `metrics` facade and
//! optionally exported with a Prometheus recorder.

use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};
use crate::xds::resources::ResourceKind;

/// Outcome of one patch attempt, used as a metric label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatus {
    Patched,
    Unchanged,
    Error,
}

impl PatchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PatchStatus::Patched => "patched",
            PatchStatus::Unchanged => "unchanged",
            PatchStatus::Error => "error",
        }
    }
}

/// Records extension metrics. Without an installed recorder every call is a no-op.
#[derive(Debug, Clone, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        Self
    }

    /// Record the outcome of patching one resource
    pub fn record_patch(&self, kind: ResourceKind, status: PatchStatus) {
        let labels = [("kind", kind.as_str().to_string()), ("status", status.as_str().to_string())];
        counter!("extension_patches_total", &labels).increment(1);
    }

    /// Record one extension applied by the runner
    pub fn record_extension_run(&self, extension: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        let labels = [("extension", extension.to_string()), ("status", status.to_string())];
        counter!("extension_runs_total", &labels).increment(1);
    }
}

/// Install the Prometheus recorder when metrics are enabled.
///
/// The returned handle renders the current metrics in the Prometheus text format;
/// serving it is left to the embedding control plane.
pub fn init_metrics(config: &ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    if !config.enable_metrics {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::internal(format!("Failed to install metrics recorder: {}", e)))?;

    describe_counter!("extension_patches_total", "Resource patch attempts by kind and outcome");
    describe_counter!("extension_runs_total", "Extensions applied by name and outcome");

    info!(service_name = %config.service_name, "Metrics recorder installed");

    Ok(Some(handle))
}
