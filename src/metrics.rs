use std::net::SocketAddr;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own scrape listener on `addr`.
/// Without this call the `metrics` macros are no-ops.
pub fn install_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("prometheus: install exporter on {addr}"))?;
    crate::ingest::ensure_metrics_described();
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(())
}
