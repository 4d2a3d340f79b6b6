use anyhow::{anyhow, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus recorder globally and store the handle.
///
/// Safe to call more than once; the recorder is installed on the first
/// call and reused afterwards (test binaries build the router repeatedly
/// in one process).
pub fn init_metrics() -> Result<()> {
    // ---
    if HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow!("failed to install Prometheus recorder: {e}"))?;

    // A racing initializer may have won; either handle renders the same
    // global registry.
    let _ = HANDLE.set(handle);
    Ok(())
}

/// Render the current metrics in Prometheus text format.
pub fn render_metrics() -> String {
    // ---
    HANDLE.get().map(PrometheusHandle::render).unwrap_or_default()
}
