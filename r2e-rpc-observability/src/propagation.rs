use opentelemetry_sdk::propagation::TraceContextPropagator;

/// Install the global W3C `traceparent` propagator used to inject context
/// into outbound requests. Must be called before the first call through
/// [`crate::middleware::TracingMiddleware`].
pub fn install_propagator() {
    opentelemetry::global::set_text_map_propagator(TraceContextPropagator::new());
}
