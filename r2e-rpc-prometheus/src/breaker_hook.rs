use crate::metrics::PrometheusMetrics;
use r2e_rpc_breaker::{BreakerHook, CircuitState};

impl BreakerHook for PrometheusMetrics {
    fn state_changed(&self, client_name: &str, new_state: CircuitState) {
        self.set_circuit_breaker_state(client_name, new_state.as_gauge_value());
    }

    fn failed(&self, client_name: &str) {
        self.inc_circuit_breaker_error(client_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{encode_metrics, MetricsConfig};

    #[test]
    fn state_changed_sets_the_gauge_to_the_numeric_state() {
        let metrics = PrometheusMetrics::new(MetricsConfig::default());
        metrics.state_changed("weather", CircuitState::Open);
        let text = encode_metrics(metrics.registry());
        assert!(text.contains("r2e_rpc_circuit_breaker_state{client=\"weather\"} 2"));
    }

    #[test]
    fn failed_increments_the_error_counter() {
        let metrics = PrometheusMetrics::new(MetricsConfig::default());
        metrics.failed("weather");
        metrics.failed("weather");
        let text = encode_metrics(metrics.registry());
        assert!(text.contains("r2e_rpc_circuit_breaker_error{client=\"weather\"} 2"));
    }
}
