use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder,
};

/// Configures the metric name prefix and default histogram buckets. The
/// reference implementation's prefix is `blacksmith_`; this crate family
/// defaults to `r2e_rpc_` (spec.md §6 "Metrics namespace").
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    pub prefix: String,
    pub latency_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            prefix: "r2e_rpc_".to_string(),
            latency_buckets: vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        }
    }
}

impl MetricsConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_latency_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.latency_buckets = buckets;
        self
    }

    fn name(&self, suffix: &str) -> String {
        format!("{}{suffix}", self.prefix)
    }
}

/// Prometheus-backed metrics registry for `r2e-rpc`: a request latency
/// histogram (§4.7), circuit breaker state/error metrics (§4.6), and cache
/// hit/miss/latency metrics (§4.5), all under one configurable prefix.
///
/// Implements [`r2e_rpc_core::Middleware`] directly (the request latency
/// timer), [`r2e_rpc_breaker::BreakerHook`], and
/// [`r2e_rpc_cache::CacheMetricsHook`] — wrap one instance in an `Arc` and
/// hand clones to whichever of those three collaborators are in use.
pub struct PrometheusMetrics {
    registry: Registry,
    request_latency: HistogramVec,
    circuit_breaker_state: IntGaugeVec,
    circuit_breaker_error: IntCounterVec,
    cache_hit: IntCounterVec,
    cache_miss: IntCounterVec,
    cache_latency: HistogramVec,
}

impl PrometheusMetrics {
    pub fn new(config: MetricsConfig) -> Self {
        let registry = Registry::new();

        let info = IntGaugeVec::new(
            Opts::new(config.name("info"), "Static build information"),
            &["version"],
        )
        .expect("static metric definition is valid");
        registry.register(Box::new(info.clone())).expect("metric name collision");
        info.with_label_values(&[env!("CARGO_PKG_VERSION")]).set(1);

        let request_latency = HistogramVec::new(
            HistogramOpts::new(config.name("request_latency_seconds"), "HTTP client call latency")
                .buckets(config.latency_buckets.clone()),
            &["client", "method", "path", "status"],
        )
        .expect("static metric definition is valid");
        registry.register(Box::new(request_latency.clone())).expect("metric name collision");

        let circuit_breaker_state = IntGaugeVec::new(
            Opts::new(config.name("circuit_breaker_state"), "0=closed,1=half-open,2=open"),
            &["client"],
        )
        .expect("static metric definition is valid");
        registry
            .register(Box::new(circuit_breaker_state.clone()))
            .expect("metric name collision");

        let circuit_breaker_error = IntCounterVec::new(
            Opts::new(config.name("circuit_breaker_error"), "Counted breaker failures"),
            &["client"],
        )
        .expect("static metric definition is valid");
        registry
            .register(Box::new(circuit_breaker_error.clone()))
            .expect("metric name collision");

        let cache_hit = IntCounterVec::new(
            Opts::new(config.name("cache_hit_total"), "Cache hits"),
            &["client", "method", "path"],
        )
        .expect("static metric definition is valid");
        registry.register(Box::new(cache_hit.clone())).expect("metric name collision");

        let cache_miss = IntCounterVec::new(
            Opts::new(config.name("cache_miss_total"), "Cache misses"),
            &["client", "state", "method", "path"],
        )
        .expect("static metric definition is valid");
        registry.register(Box::new(cache_miss.clone())).expect("metric name collision");

        let cache_latency = HistogramVec::new(
            HistogramOpts::new(config.name("cache_latency_seconds"), "Cache read latency on hit")
                .buckets(config.latency_buckets),
            &["client", "method", "path"],
        )
        .expect("static metric definition is valid");
        registry.register(Box::new(cache_latency.clone())).expect("metric name collision");

        Self {
            registry,
            request_latency,
            circuit_breaker_state,
            circuit_breaker_error,
            cache_hit,
            cache_miss,
            cache_latency,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn record_request(&self, client: &str, method: &str, path: &str, status: &str, duration_secs: f64) {
        self.request_latency
            .with_label_values(&[client, method, path, status])
            .observe(duration_secs);
    }

    pub(crate) fn set_circuit_breaker_state(&self, client: &str, state_value: i64) {
        self.circuit_breaker_state.with_label_values(&[client]).set(state_value);
    }

    pub(crate) fn inc_circuit_breaker_error(&self, client: &str) {
        self.circuit_breaker_error.with_label_values(&[client]).inc();
    }

    pub(crate) fn inc_cache_hit(&self, client: &str, method: &str, path: &str, latency_secs: f64) {
        self.cache_hit.with_label_values(&[client, method, path]).inc();
        self.cache_latency.with_label_values(&[client, method, path]).observe(latency_secs);
    }

    pub(crate) fn inc_cache_miss(&self, client: &str, state: &str, method: &str, path: &str) {
        self.cache_miss.with_label_values(&[client, state, method, path]).inc();
    }
}

/// Renders the registry in Prometheus text exposition format.
pub fn encode_metrics(registry: &Registry) -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let families = registry.gather();
    encoder.encode(&families, &mut buffer).expect("text encoding never fails for valid metric families");
    String::from_utf8(buffer).expect("prometheus text format is always valid UTF-8")
}
