/// Optional hook for recording cache outcomes to an external metrics system.
/// `r2e-rpc-prometheus` implements this against `cache_hit`/`cache_miss`
/// counters and a `cache_latency_seconds` histogram (spec.md §4.5, §4.7).
pub trait CacheMetricsHook: Send + Sync {
    /// `state` is one of the miss states: `"uncachable_request"`,
    /// `"uncachable_response"`, or `"cached"`.
    fn record_miss(&self, client_name: &str, state: &str, method: &str, path: &str, status_code: u16);

    fn record_hit(&self, client_name: &str, method: &str, path: &str, status_code: u16, latency_secs: f64);
}
