//! # Observability Infrastructure
//!
//! Structured logging and metrics for extension dispatch.

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{init_metrics, MetricsRecorder, PatchStatus};

use crate::config::ObservabilityConfig;
use crate::errors::Result;
use metrics_exporter_prometheus::PrometheusHandle;

/// Initialize logging, then metrics if enabled.
///
/// Returns the Prometheus handle when a recorder was installed.
pub fn init_observability(config: &ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    init_logging(config)?;
    init_metrics(config)
}
