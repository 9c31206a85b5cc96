//! Client-side distributed tracing for `r2e-rpc` (spec.md §4.7).
//!
//! [`middleware::TracingMiddleware`] opens one `CLIENT`-kind span per call
//! and injects the W3C trace carrier into the outbound request.
//! [`tracing_setup::init_tracing`] wires up the `tracing-subscriber` +
//! OpenTelemetry export stack; [`propagation::install_propagator`] installs
//! the global text-map propagator both depend on.
//!
//! # Usage
//!
//! ```rust,ignore
//! use r2e_rpc_observability::{install_propagator, init_tracing, ObservabilityConfig, TracingMiddleware};
//!
//! let config = ObservabilityConfig::new("weather-consumer").with_endpoint("http://otel-collector:4317");
//! install_propagator();
//! let _guard = init_tracing(&config);
//!
//! factory.add_middleware(std::sync::Arc::new(TracingMiddleware::new()));
//! ```

pub mod config;
pub mod middleware;
pub mod propagation;
pub mod tracing_setup;

pub use config::{LogFormat, ObservabilityConfig, OtlpProtocol};
pub use middleware::TracingMiddleware;
pub use propagation::install_propagator;
pub use tracing_setup::{init_tracing, OtelGuard};
