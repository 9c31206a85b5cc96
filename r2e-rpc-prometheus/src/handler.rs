use crate::metrics::{encode_metrics, PrometheusMetrics};

/// Renders the registry's current metrics in Prometheus text format, for
/// applications that expose a `/metrics` endpoint alongside their RPC
/// clients.
pub fn metrics_text(metrics: &PrometheusMetrics) -> ([(&'static str, &'static str); 1], String) {
    let body = encode_metrics(metrics.registry());
    (
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
