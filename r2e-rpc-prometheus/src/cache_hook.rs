use crate::metrics::PrometheusMetrics;
use r2e_rpc_cache::CacheMetricsHook;

impl CacheMetricsHook for PrometheusMetrics {
    fn record_miss(&self, client_name: &str, state: &str, method: &str, path: &str, _status_code: u16) {
        self.inc_cache_miss(client_name, state, method, path);
    }

    fn record_hit(&self, client_name: &str, method: &str, path: &str, _status_code: u16, latency_secs: f64) {
        self.inc_cache_hit(client_name, method, path, latency_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{encode_metrics, MetricsConfig};

    #[test]
    fn record_hit_increments_counter_and_observes_latency() {
        let metrics = PrometheusMetrics::new(MetricsConfig::default());
        metrics.record_hit("weather", "GET", "/forecast", 200, 0.002);
        let text = encode_metrics(metrics.registry());
        assert!(text.contains("r2e_rpc_cache_hit_total"));
        assert!(text.contains("r2e_rpc_cache_latency_seconds_count"));
    }

    #[test]
    fn record_miss_tags_the_miss_state() {
        let metrics = PrometheusMetrics::new(MetricsConfig::default());
        metrics.record_miss("weather", "uncachable_response", "GET", "/forecast", 200);
        let text = encode_metrics(metrics.registry());
        assert!(text.contains("state=\"uncachable_response\""));
    }
}
