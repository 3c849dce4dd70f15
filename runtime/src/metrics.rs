//! Prometheus metrics for observability.
//!
//! Every store records into the global `metrics` facade:
//! - Dispatches and reducer latency
//! - Effect execution
//! - Persistence writes, skipped writes, and failed or corrupted loads
//!
//! Nothing is exported unless a recorder is installed. [`MetricsRecorder`]
//! installs a Prometheus recorder and renders the text exposition format,
//! which the storefront binary prints on exit.
//!
//! # Example
//!
//! ```rust,no_run
//! use commerce_state_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let recorder = MetricsRecorder::install()?;
//! // ... use the stores ...
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installed Prometheus recorder.
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Register metric descriptions and install the global recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built or installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., by another test), the
    /// returned recorder has no handle and `render` returns `None`; metrics
    /// still flow to the existing recorder.
    pub fn install() -> Result<Self, MetricsError> {
        register_metrics();

        let builder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Suffix("duration_seconds".to_string()),
                &[0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05],
            )
            .map_err(|e| MetricsError::Build(e.to_string()))?;

        match builder.install_recorder() {
            Ok(handle) => {
                tracing::info!("Prometheus metrics recorder installed");
                Ok(Self {
                    handle: Some(handle),
                })
            },
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(Self { handle: None })
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            },
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this recorder did not install the global one.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store Metrics
    describe_counter!("store.actions.total", "Total number of actions dispatched to stores");
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to run a reducer (including the persistence write)"
    );
    describe_counter!("store.effects.executed", "Total number of effects executed, by type");

    // Persistence Metrics
    describe_counter!("persistence.writes.total", "Snapshots written to durable storage");
    describe_counter!(
        "persistence.writes.failed",
        "Snapshot writes dropped because storage rejected them"
    );
    describe_counter!(
        "persistence.writes.skipped",
        "Snapshot writes held back by the hydration gate"
    );
    describe_counter!("persistence.load.missing", "Startup loads that found no stored snapshot");
    describe_counter!("persistence.load.failed", "Startup loads where storage could not be read");
    describe_counter!(
        "persistence.load.corrupted",
        "Startup loads that discarded a malformed snapshot"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_and_render() -> Result<(), MetricsError> {
        let recorder = MetricsRecorder::install()?;

        metrics::counter!("persistence.writes.total", "key" => "cart").increment(1);

        // If another test installed the recorder first, there is nothing to render.
        if let Some(rendered) = recorder.render() {
            assert!(rendered.contains("persistence_writes_total"));
        }
        Ok(())
    }
}
